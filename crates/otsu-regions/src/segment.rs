use std::path::Path;

use crate::core;
use crate::params::SegmentParams;
use crate::segmenter::{RegionSegmenter, SegmentError, Segmentation};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level image helpers.
#[derive(thiserror::Error, Debug)]
pub enum SegmentImageError {
    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error("invalid output image dimensions (width={width}, height={height})")]
    InvalidOutputDimensions { width: usize, height: usize },
}

/// Anchor colors of a viridis-style gradient, dark purple to yellow.
const VIRIDIS_ANCHORS: [[u8; 3]; 8] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [109, 205, 89],
    [253, 231, 37],
];

/// Load an image from disk and convert it to 8-bit grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<::image::GrayImage, SegmentImageError> {
    Ok(::image::open(path)?.to_luma8())
}

/// Convert an `image::GrayImage` into the lightweight `otsu-regions-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Segment a decoded grayscale image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn segment_gray_image(
    img: &::image::GrayImage,
    params: SegmentParams,
) -> Result<Segmentation, SegmentImageError> {
    let segmenter = RegionSegmenter::new(params);
    Ok(segmenter.segment(&gray_view(img))?)
}

/// Load an image from disk and segment it.
pub fn segment_path(
    path: impl AsRef<Path>,
    params: SegmentParams,
) -> Result<Segmentation, SegmentImageError> {
    let img = load_gray(path)?;
    segment_gray_image(&img, params)
}

/// Convert a raw mask into an `image::GrayImage` for encoding.
pub fn mask_to_gray_image(
    mask: &core::GrayImage,
) -> Result<::image::GrayImage, SegmentImageError> {
    let width = u32::try_from(mask.width).ok();
    let height = u32::try_from(mask.height).ok();
    let Some((width, height)) = width.zip(height) else {
        return Err(SegmentImageError::InvalidOutputDimensions {
            width: mask.width,
            height: mask.height,
        });
    };
    ::image::GrayImage::from_raw(width, height, mask.data.clone()).ok_or(
        SegmentImageError::InvalidOutputDimensions {
            width: mask.width,
            height: mask.height,
        },
    )
}

/// Save a binary class mask as an 8-bit grayscale PNG.
pub fn save_mask_png(
    mask: &core::GrayImage,
    path: impl AsRef<Path>,
) -> Result<(), SegmentImageError> {
    let img = mask_to_gray_image(mask)?;
    img.save(path)?;
    Ok(())
}

/// Render a label map as a color image, one gradient stop per class.
pub fn label_map_to_rgb(
    labels: &core::LabelMap,
) -> Result<::image::RgbImage, SegmentImageError> {
    let width = u32::try_from(labels.width).ok();
    let height = u32::try_from(labels.height).ok();
    let Some((width, height)) = width.zip(height) else {
        return Err(SegmentImageError::InvalidOutputDimensions {
            width: labels.width,
            height: labels.height,
        });
    };

    let palette: Vec<[u8; 3]> = (0..labels.classes.max(1))
        .map(|class| class_color(class, labels.classes))
        .collect();
    let mut rgb = Vec::with_capacity(labels.data.len() * 3);
    for &label in &labels.data {
        let color = palette
            .get(label as usize)
            .copied()
            .unwrap_or(VIRIDIS_ANCHORS[0]);
        rgb.extend_from_slice(&color);
    }

    ::image::RgbImage::from_raw(width, height, rgb).ok_or(
        SegmentImageError::InvalidOutputDimensions {
            width: labels.width,
            height: labels.height,
        },
    )
}

/// Render and save a label map as a color PNG.
pub fn save_label_png(
    labels: &core::LabelMap,
    path: impl AsRef<Path>,
) -> Result<(), SegmentImageError> {
    let img = label_map_to_rgb(labels)?;
    img.save(path)?;
    Ok(())
}

fn class_color(class: u8, classes: u8) -> [u8; 3] {
    if classes <= 1 {
        return VIRIDIS_ANCHORS[0];
    }
    let t = f64::from(class.min(classes - 1)) / f64::from(classes - 1);
    let scaled = t * (VIRIDIS_ANCHORS.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(VIRIDIS_ANCHORS.len() - 2);
    let frac = scaled - idx as f64;
    let lo = VIRIDIS_ANCHORS[idx];
    let hi = VIRIDIS_ANCHORS[idx + 1];
    let mut color = [0u8; 3];
    for (channel, value) in color.iter_mut().enumerate() {
        let mixed =
            f64::from(lo[channel]) + frac * (f64::from(hi[channel]) - f64::from(lo[channel]));
        *value = mixed.round() as u8;
    }
    color
}

//! Region labeling and per-class mask extraction.

use otsu_regions_core::{GrayImage, GrayImageView, LabelMap};

use crate::histogram::LEVELS;

/// Errors raised when labeling pixels or extracting masks.
#[derive(thiserror::Error, Debug)]
pub enum RegionError {
    #[error("empty threshold set")]
    EmptyThresholds,

    #[error("too many thresholds ({count}) for 8-bit labels")]
    TooManyThresholds { count: usize },

    #[error("thresholds must be strictly ascending (t[{index}] = {value} after {previous})")]
    UnsortedThresholds {
        index: usize,
        value: u8,
        previous: u8,
    },

    #[error("class index {class} out of range for {classes} classes")]
    ClassOutOfRange { class: u8, classes: u8 },
}

/// Assign each pixel the index of its intensity interval.
///
/// The label of a pixel with value `v` is the number of thresholds `t`
/// with `t <= v` (right-open binning): label 0 for `v < t₁`, label `i` for
/// `tᵢ <= v < tᵢ₊₁`, label `k-1` for `v >= tₖ₋₁`. Pure elementwise pass;
/// an empty image yields an empty map.
pub fn label_regions(
    image: &GrayImageView<'_>,
    thresholds: &[u8],
) -> Result<LabelMap, RegionError> {
    let lut = label_lut(thresholds)?;
    let data = image.data.iter().map(|&v| lut[v as usize]).collect();
    Ok(LabelMap {
        width: image.width,
        height: image.height,
        classes: thresholds.len() as u8 + 1,
        data,
    })
}

/// Extract the 0/255 binary mask of one class.
pub fn extract_mask(labels: &LabelMap, class: u8) -> Result<GrayImage, RegionError> {
    if class >= labels.classes {
        return Err(RegionError::ClassOutOfRange {
            class,
            classes: labels.classes,
        });
    }
    let data = labels
        .data
        .iter()
        .map(|&label| if label == class { 255 } else { 0 })
        .collect();
    Ok(GrayImage {
        width: labels.width,
        height: labels.height,
        data,
    })
}

/// Build the level-to-label table after validating the threshold set.
fn label_lut(thresholds: &[u8]) -> Result<[u8; LEVELS], RegionError> {
    if thresholds.is_empty() {
        return Err(RegionError::EmptyThresholds);
    }
    // len + 1 classes must stay representable in the u8 label space
    if thresholds.len() >= u8::MAX as usize {
        return Err(RegionError::TooManyThresholds {
            count: thresholds.len(),
        });
    }
    for (index, pair) in thresholds.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(RegionError::UnsortedThresholds {
                index: index + 1,
                value: pair[1],
                previous: pair[0],
            });
        }
    }

    let mut lut = [0u8; LEVELS];
    let mut label = 0u8;
    let mut next = thresholds.iter().peekable();
    for (level, slot) in lut.iter_mut().enumerate() {
        while next.next_if(|&&t| t as usize <= level).is_some() {
            label += 1;
        }
        *slot = label;
    }
    Ok(lut)
}

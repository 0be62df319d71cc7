//! End-to-end segmentation pipeline.

use otsu_regions_core::{GrayImage, GrayImageView, ImageError, LabelMap};
use serde::{Deserialize, Serialize};

use crate::histogram::Histogram;
use crate::params::SegmentParams;
use crate::regions::{extract_mask, label_regions, RegionError};
use crate::threshold::{compute_thresholds_from_histogram, ThresholdError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by [`RegionSegmenter`].
#[derive(thiserror::Error, Debug)]
pub enum SegmentError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Per-class summary of a segmentation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassStats {
    pub label: u8,
    /// Pixels assigned to this class.
    pub pixels: usize,
    /// Share of the image, `pixels / total`.
    pub fraction: f64,
    /// Mean intensity of the class.
    pub mean: f64,
}

/// Output of a segmentation run.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// Strictly ascending threshold values, `classes - 1` of them.
    pub thresholds: Vec<u8>,
    /// Per-pixel class labels, same shape as the input.
    pub labels: LabelMap,
    /// Per-class pixel counts, fractions and mean intensities.
    pub class_stats: Vec<ClassStats>,
    /// Between-class variance of the winning partition.
    pub between_class_variance: f64,
    /// Input histogram, kept when `SegmentParams::keep_histogram` is set.
    pub histogram: Option<Histogram>,
}

impl Segmentation {
    /// Extract the 0/255 mask of every class, in label order.
    pub fn masks(&self) -> Result<Vec<GrayImage>, RegionError> {
        (0..self.labels.classes)
            .map(|class| extract_mask(&self.labels, class))
            .collect()
    }
}

/// Multi-level Otsu segmenter.
pub struct RegionSegmenter {
    params: SegmentParams,
}

impl RegionSegmenter {
    pub fn new(params: SegmentParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// Segment a grayscale view into `params.classes` intensity regions.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image),
            fields(
                width = image.width,
                height = image.height,
                classes = self.params.classes
            )
        )
    )]
    pub fn segment(&self, image: &GrayImageView<'_>) -> Result<Segmentation, SegmentError> {
        // 1) One histogram pass shared by the search and the result.
        let histogram = Histogram::from_view(image);

        // 2) Threshold search over the histogram.
        let thresholds = compute_thresholds_from_histogram(&histogram, self.params.classes)?;

        // 3) Digitize pixels against the winning thresholds.
        let labels = label_regions(image, &thresholds)?;

        // 4) Per-class statistics and the variance the search maximized.
        let class_stats = class_statistics(image, &labels);
        let between_class_variance = between_class_variance(&class_stats, image.len());

        Ok(Segmentation {
            thresholds,
            labels,
            class_stats,
            between_class_variance,
            histogram: self.params.keep_histogram.then_some(histogram),
        })
    }

    /// Segment a raw row-major buffer, validating its length first.
    pub fn segment_raw(
        &self,
        width: usize,
        height: usize,
        pixels: &[u8],
    ) -> Result<Segmentation, SegmentError> {
        let expected = width
            .checked_mul(height)
            .ok_or(ImageError::Dimensions { width, height })?;
        if pixels.len() != expected {
            return Err(SegmentError::Image(ImageError::BufferLength {
                expected,
                got: pixels.len(),
            }));
        }
        self.segment(&GrayImageView {
            width,
            height,
            data: pixels,
        })
    }
}

fn class_statistics(image: &GrayImageView<'_>, labels: &LabelMap) -> Vec<ClassStats> {
    let classes = labels.classes as usize;
    let mut pixels = vec![0u64; classes];
    let mut sums = vec![0u64; classes];
    for (&v, &label) in image.data.iter().zip(labels.data.iter()) {
        pixels[label as usize] += 1;
        sums[label as usize] += v as u64;
    }

    let total = image.len() as f64;
    pixels
        .iter()
        .zip(sums.iter())
        .enumerate()
        .map(|(label, (&count, &sum))| ClassStats {
            label: label as u8,
            pixels: count as usize,
            fraction: if total > 0.0 { count as f64 / total } else { 0.0 },
            mean: if count > 0 { sum as f64 / count as f64 } else { 0.0 },
        })
        .collect()
}

fn between_class_variance(stats: &[ClassStats], total_pixels: usize) -> f64 {
    if total_pixels == 0 {
        return 0.0;
    }
    let global_mean: f64 = stats.iter().map(|s| s.fraction * s.mean).sum();
    stats
        .iter()
        .map(|s| {
            let d = s.mean - global_mean;
            s.fraction * d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use otsu_regions_core::GrayImage;

    fn banded(width: usize, bands: &[u8]) -> GrayImage {
        let mut data = Vec::with_capacity(width * bands.len());
        for &v in bands {
            data.extend(std::iter::repeat(v).take(width));
        }
        GrayImage::from_raw(width, bands.len(), data).expect("valid test image")
    }

    #[test]
    fn segments_four_plateaus_end_to_end() {
        let img = banded(4, &[10, 80, 150, 220]);
        let segmenter = RegionSegmenter::new(SegmentParams::default());
        let seg = segmenter.segment(&img.view()).expect("four plateaus");

        assert_eq!(seg.thresholds, vec![11, 81, 151]);
        for (row, expected) in (0..4).zip(0u8..4) {
            for col in 0..4 {
                assert_eq!(seg.labels.pixel(col, row), Some(expected));
            }
        }

        assert_eq!(seg.class_stats.len(), 4);
        for (stats, mean) in seg.class_stats.iter().zip([10.0, 80.0, 150.0, 220.0]) {
            assert_eq!(stats.pixels, 4);
            assert_relative_eq!(stats.fraction, 0.25);
            assert_relative_eq!(stats.mean, mean);
        }
        assert!(seg.between_class_variance > 0.0);
        assert!(seg.histogram.is_none());
    }

    #[test]
    fn fractions_sum_to_one() {
        let img = banded(7, &[5, 90, 200]);
        let segmenter = RegionSegmenter::new(SegmentParams::with_classes(3));
        let seg = segmenter.segment(&img.view()).expect("three plateaus");

        let sum: f64 = seg.class_stats.iter().map(|s| s.fraction).sum();
        assert_relative_eq!(sum, 1.0);
    }

    #[test]
    fn keeps_histogram_on_request() {
        let img = banded(4, &[0, 128, 255]);
        let params = SegmentParams {
            classes: 3,
            keep_histogram: true,
        };
        let seg = RegionSegmenter::new(params)
            .segment(&img.view())
            .expect("three plateaus");

        let hist = seg.histogram.expect("histogram kept");
        assert_eq!(hist.total_pixels, 12);
        assert_eq!(hist.counts[128], 4);
    }

    #[test]
    fn masks_cover_all_classes() {
        let img = banded(4, &[10, 80, 150, 220]);
        let seg = RegionSegmenter::new(SegmentParams::default())
            .segment(&img.view())
            .expect("four plateaus");

        let masks = seg.masks().expect("classes in range");
        assert_eq!(masks.len(), 4);
        for (class, mask) in masks.iter().enumerate() {
            let on = mask.data.iter().filter(|&&m| m == 255).count();
            assert_eq!(on, seg.class_stats[class].pixels);
        }
    }

    #[test]
    fn propagates_degenerate_input() {
        let img = banded(8, &[42]);
        let err = RegionSegmenter::new(SegmentParams::default())
            .segment(&img.view())
            .unwrap_err();
        assert!(matches!(
            err,
            SegmentError::Threshold(ThresholdError::DegenerateLevels { .. })
        ));
    }

    #[test]
    fn segment_raw_validates_buffer_length() {
        let segmenter = RegionSegmenter::new(SegmentParams::with_classes(2));
        let err = segmenter.segment_raw(4, 4, &[0u8; 15]).unwrap_err();
        assert!(matches!(
            err,
            SegmentError::Image(ImageError::BufferLength {
                expected: 16,
                got: 15
            })
        ));

        let pixels: Vec<u8> = (0..16).map(|i| if i < 8 { 20 } else { 230 }).collect();
        let seg = segmenter.segment_raw(4, 4, &pixels).expect("valid buffer");
        assert_eq!(seg.thresholds.len(), 1);
    }
}

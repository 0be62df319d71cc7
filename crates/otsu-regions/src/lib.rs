//! Multi-level Otsu thresholding for grayscale images.
//!
//! This crate segments an 8-bit grayscale image into `k` intensity regions by
//! choosing `k - 1` thresholds that maximize the between-class variance of the
//! intensity histogram, then labeling every pixel with its region index.
//!
//! How a segmentation runs:
//! 1. build a 256-bin histogram of the input in one pass,
//! 2. precompute cumulative pixel counts and intensity sums,
//! 3. enumerate ascending threshold tuples over the observed intensity range,
//!    scoring each candidate class in O(1) from the cumulative tables,
//! 4. keep the best-scoring tuple; ties resolve to the lexicographically
//!    smallest one,
//! 5. digitize pixels against the winning thresholds into a label map.
//!
//! ## Quickstart
//!
//! ```
//! use otsu_regions::core::GrayImage;
//! use otsu_regions::{RegionSegmenter, SegmentParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pixels = vec![10u8; 32];
//! pixels.extend(vec![80u8; 32]);
//! pixels.extend(vec![150u8; 32]);
//! pixels.extend(vec![220u8; 32]);
//! let image = GrayImage::from_raw(8, 16, pixels)?;
//!
//! let segmenter = RegionSegmenter::new(SegmentParams::default());
//! let seg = segmenter.segment(&image.view())?;
//! assert_eq!(seg.thresholds, vec![11, 81, 151]);
//! assert_eq!(seg.labels.pixel(0, 0), Some(0));
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`RegionSegmenter`] / [`SegmentParams`]: one-call segmentation entry point.
//! - [`compute_thresholds`], [`label_regions`], [`extract_mask`]: the stages,
//!   usable on their own.
//! - [`Histogram`] / [`CumulativeMoments`]: histogram plumbing for custom
//!   pipelines.
//! - [`SegmentConfig`] / [`SegmentReport`]: JSON config and report types.
//! - [`segment`] (feature `image`): helpers around `image::GrayImage` and PNG
//!   output.
//! - [`core`]: raw grayscale buffers, views and label maps.

mod histogram;
mod io;
mod params;
mod regions;
mod segmenter;
mod threshold;

#[cfg(feature = "image")]
pub mod segment;

pub use histogram::{CumulativeMoments, Histogram, LEVELS};
pub use io::{SegmentConfig, SegmentIoError, SegmentReport, TimingsMs};
pub use params::SegmentParams;
pub use regions::{extract_mask, label_regions, RegionError};
pub use segmenter::{ClassStats, RegionSegmenter, SegmentError, Segmentation};
pub use threshold::{compute_thresholds, compute_thresholds_from_histogram, ThresholdError};

pub use otsu_regions_core as core;

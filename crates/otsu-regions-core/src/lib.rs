//! Core types for intensity-region segmentation.
//!
//! This crate is intentionally small: raw grayscale buffers, label maps and
//! a minimal logger. It does *not* depend on the `image` crate or on any
//! concrete segmentation algorithm.

mod image;
mod label;
mod logger;

pub use image::{GrayImage, GrayImageView, ImageError};
pub use label::LabelMap;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

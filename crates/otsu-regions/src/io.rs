//! JSON configuration and report helpers for segmentation runs.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::histogram::Histogram;
use crate::params::SegmentParams;
use crate::segmenter::{ClassStats, RegionSegmenter, Segmentation};

#[derive(thiserror::Error, Debug)]
pub enum SegmentIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a config-driven segmentation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub image_path: String,
    #[serde(default)]
    pub params: Option<SegmentParams>,
    /// Report JSON destination; defaults to `segment_report.json`.
    #[serde(default)]
    pub output_path: Option<String>,
    /// Color-mapped label image destination.
    #[serde(default)]
    pub label_path: Option<String>,
    /// Directory for the per-class `mask_<label>.png` files.
    #[serde(default)]
    pub mask_dir: Option<String>,
}

impl SegmentConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SegmentIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SegmentIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("segment_report.json"))
    }

    /// Destination of the mask image for one class, `None` without a mask
    /// directory.
    pub fn mask_path(&self, class: u8) -> Option<PathBuf> {
        self.mask_dir
            .as_ref()
            .map(|dir| Path::new(dir).join(format!("mask_{class}.png")))
    }

    /// Build a segmenter from this config.
    pub fn build_segmenter(&self) -> RegionSegmenter {
        RegionSegmenter::new(self.params.clone().unwrap_or_default())
    }
}

/// Wall-clock stage timings of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingsMs {
    pub load_image: u64,
    pub segment: u64,
    pub write_outputs: u64,
    pub total: u64,
}

/// Report of a segmentation run, written next to the image outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentReport {
    pub image_path: String,
    /// Config file the run was driven by, absent for command-line runs.
    #[serde(default)]
    pub config_path: Option<String>,
    pub width: usize,
    pub height: usize,
    pub classes: u8,
    #[serde(default)]
    pub thresholds: Vec<u8>,
    #[serde(default)]
    pub class_stats: Vec<ClassStats>,
    #[serde(default)]
    pub between_class_variance: Option<f64>,
    #[serde(default)]
    pub histogram: Option<Histogram>,
    #[serde(default)]
    pub label_path: Option<String>,
    #[serde(default)]
    pub mask_paths: Option<Vec<String>>,
    #[serde(default)]
    pub timings_ms: TimingsMs,
    #[serde(default)]
    pub error: Option<String>,
}

impl SegmentReport {
    /// Build a base report from the input config and image dimensions.
    pub fn new(
        cfg: &SegmentConfig,
        config_path: Option<&Path>,
        width: usize,
        height: usize,
    ) -> Self {
        let classes = cfg
            .params
            .as_ref()
            .map(|p| p.classes)
            .unwrap_or_else(|| SegmentParams::default().classes);
        Self {
            image_path: cfg.image_path.clone(),
            config_path: config_path.map(|p| p.to_string_lossy().into_owned()),
            width,
            height,
            classes,
            thresholds: Vec::new(),
            class_stats: Vec::new(),
            between_class_variance: None,
            histogram: None,
            label_path: None,
            mask_paths: None,
            timings_ms: TimingsMs::default(),
            error: None,
        }
    }

    /// Populate report fields from a successful run.
    pub fn set_segmentation(&mut self, seg: &Segmentation) {
        self.thresholds = seg.thresholds.clone();
        self.class_stats = seg.class_stats.clone();
        self.between_class_variance = Some(seg.between_class_variance);
        self.histogram = seg.histogram.clone();
        self.error = None;
    }

    /// Record a failed run.
    pub fn set_error(&mut self, err: &impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SegmentIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SegmentIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> SegmentConfig {
        SegmentConfig {
            image_path: "testdata/sample.png".to_string(),
            params: Some(SegmentParams::with_classes(3)),
            output_path: None,
            label_path: Some("out/labels.png".to_string()),
            mask_dir: Some("out".to_string()),
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let cfg = sample_config();
        cfg.write_json(&path).expect("write config");
        let loaded = SegmentConfig::load_json(&path).expect("load config");

        assert_eq!(loaded.image_path, cfg.image_path);
        assert_eq!(loaded.params.as_ref().expect("params").classes, 3);
        assert_eq!(loaded.output_path(), PathBuf::from("segment_report.json"));
        assert_eq!(loaded.mask_path(2), Some(PathBuf::from("out/mask_2.png")));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: SegmentConfig =
            serde_json::from_str(r#"{"image_path": "a.png"}"#).expect("minimal config");
        assert!(cfg.params.is_none());
        assert!(cfg.mask_path(0).is_none());
        assert_eq!(cfg.build_segmenter().params().classes, 4);
    }

    #[test]
    fn report_round_trips_with_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");

        let cfg = sample_config();
        let mut report = SegmentReport::new(&cfg, Some(Path::new("config.json")), 16, 8);
        assert_eq!(report.classes, 3);

        report.set_error(&"not enough distinct intensity levels");
        report.write_json(&path).expect("write report");

        let loaded = SegmentReport::load_json(&path).expect("load report");
        assert_eq!(loaded.width, 16);
        assert_eq!(loaded.height, 8);
        assert!(loaded.thresholds.is_empty());
        assert!(loaded.error.is_some());
    }
}

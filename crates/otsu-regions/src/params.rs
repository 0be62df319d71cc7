use serde::{Deserialize, Serialize};

fn default_classes() -> u8 {
    4
}

/// Configuration for a segmentation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentParams {
    /// Number of intensity classes to split the image into. Must be at
    /// least 2; the search cost grows as ~256^(classes-1).
    #[serde(default = "default_classes")]
    pub classes: u8,
    /// Keep the 256-bin intensity histogram in the result for debugging or
    /// visualization.
    #[serde(default)]
    pub keep_histogram: bool,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            classes: 4, // four intensity regions
            keep_histogram: false,
        }
    }
}

impl SegmentParams {
    /// Parameters for a given class count, everything else default.
    pub fn with_classes(classes: u8) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_four_classes() {
        assert_eq!(SegmentParams::default().classes, 4);
        assert!(!SegmentParams::default().keep_histogram);
        assert_eq!(SegmentParams::with_classes(2).classes, 2);
    }

    #[test]
    fn deserializes_missing_fields_to_defaults() {
        let params: SegmentParams = serde_json::from_str("{}").expect("empty object");
        assert_eq!(params.classes, 4);
        assert!(!params.keep_histogram);

        let params: SegmentParams =
            serde_json::from_str(r#"{"classes": 3}"#).expect("classes only");
        assert_eq!(params.classes, 3);
    }
}

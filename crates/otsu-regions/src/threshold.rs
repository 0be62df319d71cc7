//! Multi-level Otsu threshold search.
//!
//! Finds the `k - 1` strictly ascending thresholds that split an intensity
//! histogram into `k` classes with maximal between-class variance. Scoring
//! uses the equivalent criterion Σ sᵢ²/cᵢ over class sums and counts, which
//! the prefix moments evaluate in O(1) per candidate tuple.

use log::{debug, warn};
use otsu_regions_core::GrayImageView;

use crate::histogram::{CumulativeMoments, Histogram, LEVELS};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the threshold search.
#[derive(thiserror::Error, Debug)]
pub enum ThresholdError {
    #[error("empty input image")]
    EmptyImage,

    #[error("class count must be at least 2 (got {classes})")]
    InvalidClassCount { classes: u8 },

    #[error(
        "not enough distinct intensity levels ({distinct}) to form {classes} non-empty classes"
    )]
    DegenerateLevels { distinct: usize, classes: u8 },
}

/// Compute the `classes - 1` Otsu thresholds of a grayscale image.
///
/// The returned values are strictly ascending and lie strictly above the
/// lowest observed intensity and at or below the highest one. A pixel with
/// value `v` belongs to class `i` when exactly `i` thresholds are `<= v`.
///
/// Ties between equally good threshold tuples resolve to the smallest
/// tuple in lexicographic order, so reruns on identical input are
/// bit-identical.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(image),
        fields(width = image.width, height = image.height, classes)
    )
)]
pub fn compute_thresholds(
    image: &GrayImageView<'_>,
    classes: u8,
) -> Result<Vec<u8>, ThresholdError> {
    let hist = Histogram::from_view(image);
    compute_thresholds_from_histogram(&hist, classes)
}

/// Same as [`compute_thresholds`], starting from a prebuilt histogram.
pub fn compute_thresholds_from_histogram(
    hist: &Histogram,
    classes: u8,
) -> Result<Vec<u8>, ThresholdError> {
    if classes < 2 {
        return Err(ThresholdError::InvalidClassCount { classes });
    }
    if hist.total_pixels == 0 {
        return Err(ThresholdError::EmptyImage);
    }

    let distinct = hist.distinct_levels();
    if distinct < classes as usize {
        return Err(ThresholdError::DegenerateLevels { distinct, classes });
    }

    if classes > 5 {
        warn!(
            "exhaustive threshold search for {classes} classes scans up to ~256^{} tuples",
            classes - 1
        );
    }

    let (Some(min_level), Some(max_level)) = (hist.min_level(), hist.max_level()) else {
        return Err(ThresholdError::EmptyImage);
    };

    // Candidate window (min, max]: every partition reachable with a
    // threshold outside this window is reachable inside it, so the optimum
    // is unchanged and the result stays inside the observed range.
    let lo = min_level as usize + 1;
    let hi = max_level as usize;

    let moments = CumulativeMoments::from_histogram(hist);
    let count = classes as usize - 1;

    let mut search = Search {
        moments: &moments,
        hi,
        best: BestTuple {
            score: f64::NEG_INFINITY,
            thresholds: vec![0; count],
        },
    };
    let mut current = vec![0usize; count];
    search.descend(&mut current, 0, 0, lo, 0.0);

    debug!(
        "threshold search: classes={classes} window=[{lo}, {hi}] best={:?}",
        search.best.thresholds
    );

    Ok(search.best.thresholds.iter().map(|&t| t as u8).collect())
}

struct BestTuple {
    score: f64,
    thresholds: Vec<usize>,
}

struct Search<'a> {
    moments: &'a CumulativeMoments,
    /// Highest candidate level, the top of the observed range.
    hi: usize,
    best: BestTuple,
}

impl Search<'_> {
    /// Depth-first enumeration of ascending threshold tuples, accumulating
    /// the scores of classes closed so far.
    ///
    /// `class_lo` is the lower bound of the class the next threshold
    /// closes; its candidates run over `cand_lo..` less the room needed for
    /// deeper thresholds. The ascending order plus the strict `>` at the
    /// leaf keeps the lexicographically smallest tuple on ties.
    fn descend(
        &mut self,
        current: &mut [usize],
        depth: usize,
        class_lo: usize,
        cand_lo: usize,
        acc: f64,
    ) {
        let remaining = current.len() - depth;
        if remaining == 0 {
            let score = acc + class_score(self.moments, class_lo, LEVELS);
            if score > self.best.score {
                self.best.score = score;
                self.best.thresholds.copy_from_slice(current);
            }
            return;
        }

        let cand_hi = self.hi - (remaining - 1);
        for t in cand_lo..=cand_hi {
            current[depth] = t;
            let acc_t = acc + class_score(self.moments, class_lo, t);
            self.descend(current, depth + 1, t, t + 1, acc_t);
        }
    }
}

/// Between-class contribution of one class interval: `s²/c` for class sum
/// `s` and count `c`. Empty intervals contribute nothing (they never win:
/// once the distinct-level check passed, some partition with all classes
/// populated scores strictly higher).
#[inline]
fn class_score(moments: &CumulativeMoments, lo: usize, hi: usize) -> f64 {
    let count = moments.class_count(lo, hi);
    if count == 0 {
        return 0.0;
    }
    let sum = moments.class_sum(lo, hi) as f64;
    sum * sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use otsu_regions_core::GrayImage;

    fn gray(width: usize, height: usize, data: Vec<u8>) -> GrayImage {
        GrayImage::from_raw(width, height, data).expect("valid test image")
    }

    fn banded(width: usize, bands: &[u8]) -> GrayImage {
        let mut data = Vec::with_capacity(width * bands.len());
        for &v in bands {
            data.extend(std::iter::repeat(v).take(width));
        }
        gray(width, bands.len(), data)
    }

    fn noisy(width: usize, height: usize, seed: u64) -> GrayImage {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) % 192 + 30) as u8
            })
            .collect();
        gray(width, height, data)
    }

    #[test]
    fn finds_threshold_between_bimodal_clusters() {
        let mut data = Vec::new();
        for v in [38u8, 40, 42] {
            data.extend(std::iter::repeat(v).take(10));
        }
        for v in [198u8, 200, 202] {
            data.extend(std::iter::repeat(v).take(10));
        }
        let img = gray(60, 1, data);

        let thresholds = compute_thresholds(&img.view(), 2).expect("bimodal input");
        assert_eq!(thresholds.len(), 1);
        let t = thresholds[0];
        assert!(t > 40 && t < 200, "threshold {t} not between cluster means");
    }

    #[test]
    fn splits_four_plateaus_exactly() {
        let img = banded(4, &[10, 80, 150, 220]);
        let thresholds = compute_thresholds(&img.view(), 4).expect("four plateaus");
        assert_eq!(thresholds, vec![11, 81, 151]);
    }

    #[test]
    fn splits_three_plateaus_exactly() {
        let img = banded(8, &[20, 120, 240]);
        let thresholds = compute_thresholds(&img.view(), 3).expect("three plateaus");
        assert_eq!(thresholds, vec![21, 121]);
    }

    #[test]
    fn breaks_ties_toward_smaller_thresholds() {
        // Both cuts of the symmetric three-plateau image score the same;
        // the ascending enumeration must keep the first one.
        let img = banded(3, &[50, 100, 150]);
        let thresholds = compute_thresholds(&img.view(), 2).expect("three plateaus");
        assert_eq!(thresholds, vec![51]);
    }

    #[test]
    fn orders_thresholds_strictly() {
        let img = noisy(64, 64, 7);
        let thresholds = compute_thresholds(&img.view(), 4).expect("noisy input");
        assert_eq!(thresholds.len(), 3);
        assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn keeps_thresholds_inside_observed_range() {
        let img = noisy(48, 48, 99);
        let hist = Histogram::from_view(&img.view());
        let min = hist.min_level().unwrap();
        let max = hist.max_level().unwrap();

        let thresholds = compute_thresholds(&img.view(), 3).expect("noisy input");
        for &t in &thresholds {
            assert!(t > min && t <= max, "threshold {t} outside ({min}, {max}]");
        }
    }

    #[test]
    fn returns_identical_thresholds_on_rerun() {
        let img = noisy(32, 32, 1234);
        let a = compute_thresholds(&img.view(), 4).expect("first run");
        let b = compute_thresholds(&img.view(), 4).expect("second run");
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_constant_image() {
        let img = gray(8, 8, vec![17; 64]);
        let err = compute_thresholds(&img.view(), 4).unwrap_err();
        match err {
            ThresholdError::DegenerateLevels { distinct, classes } => {
                assert_eq!(distinct, 1);
                assert_eq!(classes, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_too_few_distinct_levels() {
        let img = banded(4, &[10, 220]);
        let err = compute_thresholds(&img.view(), 4).unwrap_err();
        assert!(matches!(
            err,
            ThresholdError::DegenerateLevels {
                distinct: 2,
                classes: 4
            }
        ));
    }

    #[test]
    fn rejects_empty_image() {
        let img = gray(0, 0, Vec::new());
        let err = compute_thresholds(&img.view(), 2).unwrap_err();
        assert!(matches!(err, ThresholdError::EmptyImage));
    }

    #[test]
    fn rejects_single_class() {
        let img = banded(4, &[10, 220]);
        for classes in [0u8, 1] {
            let err = compute_thresholds(&img.view(), classes).unwrap_err();
            assert!(matches!(err, ThresholdError::InvalidClassCount { .. }));
        }
    }

    #[test]
    fn works_from_prebuilt_histogram() {
        let mut counts = vec![0u64; LEVELS];
        counts[10] = 5;
        counts[200] = 5;
        let hist = Histogram {
            counts,
            total_pixels: 10,
        };
        let thresholds = compute_thresholds_from_histogram(&hist, 2).expect("two levels");
        assert_eq!(thresholds, vec![11]);
    }
}

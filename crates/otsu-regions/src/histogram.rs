//! Intensity histograms and the prefix moments behind the threshold search.

use otsu_regions_core::GrayImageView;
use serde::{Deserialize, Serialize};

/// Number of representable 8-bit intensity levels.
pub const LEVELS: usize = 256;

/// 256-bin intensity histogram of a grayscale image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Histogram {
    /// One count per intensity level, `counts.len() == 256`.
    pub counts: Vec<u64>,
    /// Total number of samples, the sum of `counts`.
    pub total_pixels: u64,
}

impl Histogram {
    /// Count every sample of the view in one pass.
    pub fn from_view(image: &GrayImageView<'_>) -> Self {
        let mut counts = vec![0u64; LEVELS];
        for &v in image.data {
            counts[v as usize] += 1;
        }
        Self {
            total_pixels: image.data.len() as u64,
            counts,
        }
    }

    /// Number of intensity levels with at least one sample.
    pub fn distinct_levels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Lowest populated level, `None` for an empty histogram.
    pub fn min_level(&self) -> Option<u8> {
        self.counts.iter().position(|&c| c > 0).map(|i| i as u8)
    }

    /// Highest populated level, `None` for an empty histogram.
    pub fn max_level(&self) -> Option<u8> {
        self.counts.iter().rposition(|&c| c > 0).map(|i| i as u8)
    }
}

/// Prefix sums over a histogram: cumulative count and cumulative first
/// moment, both exact in `u64`.
///
/// With these, any level interval `[lo, hi)` yields its sample count and
/// intensity sum in O(1), which is what makes the exhaustive threshold
/// search cheap per candidate.
#[derive(Clone, Debug)]
pub struct CumulativeMoments {
    // prefix[i] covers levels [0, i); arrays have LEVELS + 1 entries
    counts: Vec<u64>,
    sums: Vec<u64>,
}

impl CumulativeMoments {
    pub fn from_histogram(hist: &Histogram) -> Self {
        let mut counts = Vec::with_capacity(LEVELS + 1);
        let mut sums = Vec::with_capacity(LEVELS + 1);
        let mut count_acc = 0u64;
        let mut sum_acc = 0u64;
        counts.push(0);
        sums.push(0);
        for (level, &c) in hist.counts.iter().enumerate() {
            count_acc += c;
            sum_acc += level as u64 * c;
            counts.push(count_acc);
            sums.push(sum_acc);
        }
        Self { counts, sums }
    }

    /// Sample count of the level interval `[lo, hi)`.
    #[inline]
    pub fn class_count(&self, lo: usize, hi: usize) -> u64 {
        self.counts[hi] - self.counts[lo]
    }

    /// Intensity sum of the level interval `[lo, hi)`.
    #[inline]
    pub fn class_sum(&self, lo: usize, hi: usize) -> u64 {
        self.sums[hi] - self.sums[lo]
    }

    /// Total sample count.
    #[inline]
    pub fn total_count(&self) -> u64 {
        self.counts[LEVELS]
    }

    /// Total intensity sum.
    #[inline]
    pub fn total_sum(&self) -> u64 {
        self.sums[LEVELS]
    }
}

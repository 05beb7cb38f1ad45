//! Flight activity over the full dataset extent, for the timeline track.

use drone_map_flight_models::{TimeRange, TimestampMs};
use serde::{Deserialize, Serialize};

/// Equal-width activity buckets across the dataset extent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityHistogram {
    /// Raw flight count per bucket.
    pub counts: Vec<u64>,
    /// `counts` divided by the largest count (all zero when there are no
    /// flights).
    pub heights: Vec<f64>,
}

impl ActivityHistogram {
    /// Buckets `timestamps` into `bucket_count` equal-width slices of
    /// `extent`. Timestamps outside the extent are ignored; a degenerate
    /// extent puts everything in the first bucket.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn compute(
        timestamps: impl IntoIterator<Item = TimestampMs>,
        extent: Option<TimeRange>,
        bucket_count: usize,
    ) -> Self {
        let mut counts = vec![0_u64; bucket_count];
        if let (Some(extent), Some(last)) = (extent, bucket_count.checked_sub(1)) {
            for ts in timestamps {
                if !extent.contains(ts) {
                    continue;
                }
                let index = if extent.is_degenerate() {
                    0
                } else {
                    let fraction = (ts - extent.start()) as f64 / extent.span() as f64;
                    ((fraction * bucket_count as f64) as usize).min(last)
                };
                counts[index] += 1;
            }
        }

        let max = counts.iter().copied().max().unwrap_or(0);
        let heights = counts
            .iter()
            .map(|&c| if max == 0 { 0.0 } else { c as f64 / max as f64 })
            .collect();

        Self { counts, heights }
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` when there are no buckets at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_and_normalizes() {
        let extent = Some(TimeRange::new(0, 100));
        let hist = ActivityHistogram::compute([0, 1, 2, 50, 100], extent, 4);
        assert_eq!(hist.counts, vec![3, 0, 1, 1]);
        assert!((hist.heights[0] - 1.0).abs() < f64::EPSILON);
        assert!(hist.heights[1].abs() < f64::EPSILON);
        assert!((hist.heights[3] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn end_of_extent_lands_in_last_bucket() {
        let hist = ActivityHistogram::compute([1_000], Some(TimeRange::new(0, 1_000)), 80);
        assert_eq!(hist.len(), 80);
        assert_eq!(hist.counts[79], 1);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let hist = ActivityHistogram::compute(std::iter::empty(), None, 80);
        assert_eq!(hist.counts.iter().sum::<u64>(), 0);
        assert!(hist.heights.iter().all(|h| h.abs() < f64::EPSILON));
    }

    #[test]
    fn degenerate_extent_uses_first_bucket() {
        let hist = ActivityHistogram::compute([5, 5, 9], Some(TimeRange::new(5, 5)), 3);
        assert_eq!(hist.counts, vec![2, 0, 0]);
    }

    #[test]
    fn zero_buckets_is_empty() {
        let hist = ActivityHistogram::compute([1, 2], Some(TimeRange::new(0, 5)), 0);
        assert!(hist.is_empty());
    }
}

//! Histogram - counts observations against fixed interval upper bounds.
//!
//! Intended for latency tooling: record many timings (nanos) cheaply, then
//! read mean and tail bounds.

use std::fmt;

use crate::error::{DisruptorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    upper_bounds: Box<[i64]>,
    counts: Box<[i64]>,
    min: i64,
    max: i64,
}

impl Histogram {
    /// Create a histogram over intervals ending at `upper_bounds`.
    ///
    /// Bounds must be non-empty, positive and strictly increasing. An
    /// observation lands in the first interval whose bound is `>=` it.
    pub fn new(upper_bounds: &[i64]) -> Result<Self> {
        if upper_bounds.is_empty() {
            return Err(DisruptorError::config("Histogram needs at least one bound"));
        }

        let mut last = 0;
        for &bound in upper_bounds {
            if bound <= 0 {
                return Err(DisruptorError::config("Bounds must be positive values"));
            }
            if bound <= last {
                return Err(DisruptorError::config(format!(
                    "bound {} is not greater than {}",
                    bound, last
                )));
            }
            last = bound;
        }

        Ok(Self {
            upper_bounds: upper_bounds.into(),
            counts: vec![0; upper_bounds.len()].into_boxed_slice(),
            min: i64::MAX,
            max: 0,
        })
    }

    /// Number of intervals.
    pub fn size(&self) -> usize {
        self.upper_bounds.len()
    }

    pub fn upper_bound_at(&self, index: usize) -> i64 {
        self.upper_bounds[index]
    }

    pub fn count_at(&self, index: usize) -> i64 {
        self.counts[index]
    }

    /// Count `value` in its interval. Returns false, recording nothing, if
    /// it is above the last bound.
    pub fn add_observation(&mut self, value: i64) -> bool {
        let index = self.upper_bounds.partition_point(|&bound| bound < value);
        if index == self.upper_bounds.len() {
            return false;
        }

        self.counts[index] += 1;
        self.track_range(value);
        true
    }

    #[inline]
    fn track_range(&mut self, value: i64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Merge counts from `other`, which must have identical bounds.
    pub fn add_observations(&mut self, other: &Histogram) -> Result<()> {
        if self.upper_bounds != other.upper_bounds {
            return Err(DisruptorError::config(
                "Histograms must have matching intervals",
            ));
        }

        for (count, added) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += added;
        }
        if other.count() > 0 {
            self.track_range(other.min);
            self.track_range(other.max);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.min = i64::MAX;
        self.max = 0;
        self.counts.fill(0);
    }

    /// Total observations recorded.
    pub fn count(&self) -> i64 {
        self.counts.iter().sum()
    }

    /// Smallest observation (`i64::MAX` while empty).
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Largest observation (0 while empty).
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Mean of all observations, estimated from interval midpoints.
    ///
    /// The lowest and highest populated intervals are narrowed to the
    /// observed min and max before taking their midpoints. 0.0 while empty.
    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }

        let mut lower = if self.counts[0] > 0 { self.min } else { 0 };
        let mut total: i128 = 0;
        for (&bound, &n) in self.upper_bounds.iter().zip(self.counts.iter()) {
            let upper = bound.min(self.max);
            let mid = lower + (upper - lower) / 2;
            total += mid as i128 * n as i128;
            lower = bound.saturating_add(1).max(self.min);
        }

        total as f64 / count as f64
    }

    /// Upper bound of the interval containing the 99th percentile.
    pub fn two_nines_upper_bound(&self) -> i64 {
        self.bound_for_factor(0.99)
    }

    /// Upper bound of the interval containing the 99.99th percentile.
    pub fn four_nines_upper_bound(&self) -> i64 {
        self.bound_for_factor(0.9999)
    }

    /// Upper bound of the interval within which `factor` of the
    /// observations fall. `factor` must be in the open range (0, 1).
    pub fn upper_bound_for_factor(&self, factor: f64) -> Result<i64> {
        if !(factor > 0.0 && factor < 1.0) {
            return Err(DisruptorError::config(format!(
                "factor must be > 0.0 and < 1.0, got {}",
                factor
            )));
        }
        Ok(self.bound_for_factor(factor))
    }

    fn bound_for_factor(&self, factor: f64) -> i64 {
        let total = self.count();
        let tail_total = total - (total as f64 * factor).round() as i64;

        let mut tail = 0;
        for (&bound, &n) in self.upper_bounds.iter().zip(self.counts.iter()).rev() {
            if n != 0 {
                tail += n;
                if tail >= tail_total {
                    return bound;
                }
            }
        }
        0
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Histogram{{min={}, max={}, mean={}, 99%={}, 99.99%={}, [",
            self.min(),
            self.max(),
            self.mean(),
            self.two_nines_upper_bound(),
            self.four_nines_upper_bound()
        )?;
        for (i, (bound, count)) in self.upper_bounds.iter().zip(self.counts.iter()).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", bound, count)?;
        }
        f.write_str("]}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVALS: [i64; 5] = [1, 10, 100, 1000, i64::MAX];

    fn histogram_with(bounds: &[i64], observations: &[i64]) -> Histogram {
        let mut histogram = Histogram::new(bounds).unwrap();
        for &value in observations {
            histogram.add_observation(value);
        }
        histogram
    }

    #[test]
    fn test_sized_and_initialised_from_bounds() {
        let histogram = Histogram::new(&INTERVALS).unwrap();
        assert_eq!(histogram.size(), INTERVALS.len());
        for (i, &bound) in INTERVALS.iter().enumerate() {
            assert_eq!(histogram.upper_bound_at(i), bound);
            assert_eq!(histogram.count_at(i), 0);
        }
    }

    #[test]
    fn test_rejects_bad_bounds() {
        assert!(matches!(Histogram::new(&[-1, 10, 20]), Err(DisruptorError::Config(_))));
        assert!(matches!(Histogram::new(&[1, 10, 10, 20]), Err(DisruptorError::Config(_))));
        assert!(matches!(Histogram::new(&[]), Err(DisruptorError::Config(_))));
    }

    #[test]
    fn test_add_observation() {
        let mut histogram = Histogram::new(&INTERVALS).unwrap();
        assert!(histogram.add_observation(10));
        assert_eq!(histogram.count_at(1), 1);

        assert!(!Histogram::new(&[10, 20, 30]).unwrap().add_observation(31));
    }

    #[test]
    fn test_round_trip_counts_and_range() {
        let histogram = histogram_with(&INTERVALS, &[1, 7, 10, 3000]);

        assert_eq!(histogram.count(), 4);
        assert_eq!(histogram.min(), 1);
        assert_eq!(histogram.max(), 3000);
        let counts: Vec<i64> = (0..histogram.size()).map(|i| histogram.count_at(i)).collect();
        assert_eq!(counts, vec![1, 2, 0, 0, 1]);
    }

    #[test]
    fn test_min_and_max_tracked_independently() {
        // Decreasing then increasing input must move both ends.
        let histogram = histogram_with(&INTERVALS, &[50, 5, 500]);
        assert_eq!(histogram.min(), 5);
        assert_eq!(histogram.max(), 500);

        let single = histogram_with(&INTERVALS, &[7]);
        assert_eq!(single.min(), 7);
        assert_eq!(single.max(), 7);
    }

    #[test]
    fn test_add_observations_merges() {
        let mut histogram = histogram_with(&INTERVALS, &[10, 30, 50]);
        let other = histogram_with(&INTERVALS, &[10, 20, 25]);

        histogram.add_observations(&other).unwrap();
        assert_eq!(histogram.count(), 6);
        assert_eq!(histogram.min(), 10);
        assert_eq!(histogram.max(), 50);

        // Merging an empty histogram leaves the range alone.
        histogram.add_observations(&Histogram::new(&INTERVALS).unwrap()).unwrap();
        assert_eq!(histogram.max(), 50);
    }

    #[test]
    fn test_add_observations_rejects_mismatched_intervals() {
        let mut histogram = Histogram::new(&INTERVALS).unwrap();
        let other = Histogram::new(&[1, 2, 3]).unwrap();
        assert!(histogram.add_observations(&other).is_err());
    }

    #[test]
    fn test_clear() {
        let mut histogram = histogram_with(&INTERVALS, &[1, 7, 10, 3000]);
        histogram.clear();

        assert_eq!(histogram.count(), 0);
        assert_eq!(histogram.min(), i64::MAX);
        assert_eq!(histogram.max(), 0);
    }

    #[test]
    fn test_mean() {
        let histogram = histogram_with(&[1, 10, 100, 1000, 10000], &[1, 7, 10, 10, 11, 144]);
        assert!((histogram.mean() - 32.666_666_666_666_67).abs() < 1e-9);
    }

    #[test]
    fn test_mean_corrects_for_skew_in_outer_intervals() {
        let observations: Vec<i64> = (100..152).collect();
        let histogram = histogram_with(&[100, 110, 120, 130, 140, 150, 1000, 10000], &observations);
        assert!((histogram.mean() - 125.019_230_769_230_77).abs() < 1e-9);
    }

    #[test]
    fn test_mean_of_empty_histogram() {
        assert_eq!(Histogram::new(&INTERVALS).unwrap().mean(), 0.0);
    }

    #[test]
    fn test_tail_upper_bounds() {
        let bounds = [1, 10, 100, 1000, 10000];
        let observations: Vec<i64> = (1..101).collect();
        assert_eq!(histogram_with(&bounds, &observations).two_nines_upper_bound(), 100);

        let observations: Vec<i64> = (1..102).collect();
        assert_eq!(histogram_with(&bounds, &observations).four_nines_upper_bound(), 1000);
    }

    #[test]
    fn test_upper_bound_for_factor_range() {
        let histogram = histogram_with(&INTERVALS, &[5]);
        assert!(histogram.upper_bound_for_factor(0.0).is_err());
        assert!(histogram.upper_bound_for_factor(1.0).is_err());
        assert!(histogram.upper_bound_for_factor(f64::NAN).is_err());
        assert_eq!(histogram.upper_bound_for_factor(0.5).unwrap(), 10);
    }

    #[test]
    fn test_display() {
        let histogram = histogram_with(&INTERVALS, &[1, 7, 10, 300]);
        assert_eq!(
            histogram.to_string(),
            "Histogram{min=1, max=300, mean=53.25, 99%=1000, 99.99%=1000, \
             [1=1, 10=2, 100=0, 1000=1, 9223372036854775807=0]}"
        );
    }
}

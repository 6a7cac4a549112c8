//! Quantile-based outlier detection.
//!
//! A single quantile `q` defines a symmetric two-sided tail test: the low tail
//! is every return at or below the `(1 - q)` quantile and the high tail every
//! return at or above the `q` quantile. Boundaries are inclusive.

use crate::errors::{validate_data_length, validate_open_unit_interval, BlackSwanResult};
use crate::math_utils::{mean, median_of_sorted, population_std, quantile_type7, sorted_copy};
use crate::series::ReturnSeries;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tail cut-offs for a quantile `q`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutlierThresholds {
    /// Quantile the thresholds were computed for
    pub quantile: f64,
    /// `(1 - q)` quantile of the return distribution
    pub low_cut: f64,
    /// `q` quantile of the return distribution
    pub high_cut: f64,
}

impl OutlierThresholds {
    /// Compute thresholds from raw returns.
    ///
    /// For `q < 0.5` the two quantiles swap roles; the cut-offs are ordered so
    /// that `low_cut <= high_cut` always holds. Fails with `InsufficientData`
    /// on an empty slice.
    pub fn from_returns(values: &[f64], quantile: f64) -> BlackSwanResult<Self> {
        validate_open_unit_interval(quantile, "quantile")?;
        validate_data_length(values, 1, "outlier_thresholds")?;
        let sorted = sorted_copy(values);
        let a = quantile_type7(&sorted, 1.0 - quantile);
        let b = quantile_type7(&sorted, quantile);
        Ok(Self {
            quantile,
            low_cut: a.min(b),
            high_cut: a.max(b),
        })
    }

    /// Return is in the low tail (inclusive).
    pub fn is_low(&self, value: f64) -> bool {
        value <= self.low_cut
    }

    /// Return is in the high tail (inclusive).
    pub fn is_high(&self, value: f64) -> bool {
        value >= self.high_cut
    }

    /// Return is in either tail.
    pub fn is_outlier(&self, value: f64) -> bool {
        self.is_low(value) || self.is_high(value)
    }

    /// Outlier flag for every return in `values`.
    pub fn mask(&self, values: &[f64]) -> Vec<bool> {
        values.iter().map(|&v| self.is_outlier(v)).collect()
    }
}

/// Descriptive statistics of one tail.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TailStatistics {
    /// Number of returns in the tail
    pub count: usize,
    /// Mean tail return
    pub mean: f64,
    /// Median tail return
    pub median: f64,
    /// Population standard deviation of tail returns
    pub std_dev: f64,
    /// Most extreme return: minimum of the low tail, maximum of the high tail
    pub extreme: f64,
}

impl TailStatistics {
    fn from_members(members: &[f64], extreme: f64) -> Self {
        let sorted = sorted_copy(members);
        Self {
            count: members.len(),
            mean: mean(members),
            median: median_of_sorted(&sorted),
            std_dev: if members.is_empty() {
                f64::NAN
            } else {
                population_std(members)
            },
            extreme,
        }
    }
}

/// Thresholds plus statistics of both tails. Produced once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutlierStats {
    /// Tail cut-offs
    pub thresholds: OutlierThresholds,
    /// Low (worst-day) tail
    pub low: TailStatistics,
    /// High (best-day) tail
    pub high: TailStatistics,
}

impl OutlierStats {
    /// Total number of outlier days across both tails.
    pub fn total_count(&self) -> usize {
        self.low.count + self.high.count
    }
}

/// Identify both tails of `returns` at quantile `q` and summarize them.
///
/// Fails with `InvalidParameter` if `q` is outside `(0, 1)`.
pub fn calculate_outlier_stats(
    returns: &ReturnSeries,
    quantile: f64,
) -> BlackSwanResult<OutlierStats> {
    let values = returns.values();
    let thresholds = OutlierThresholds::from_returns(values, quantile)?;

    let lows: Vec<f64> = values.iter().copied().filter(|&v| thresholds.is_low(v)).collect();
    let highs: Vec<f64> = values.iter().copied().filter(|&v| thresholds.is_high(v)).collect();

    let min_low = lows.iter().copied().fold(f64::NAN, f64::min);
    let max_high = highs.iter().copied().fold(f64::NAN, f64::max);

    Ok(OutlierStats {
        thresholds,
        low: TailStatistics::from_members(&lows, min_low),
        high: TailStatistics::from_members(&highs, max_high),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BlackSwanError;
    use crate::generators::weekday_calendar;
    use assert_approx_eq::assert_approx_eq;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut dates = weekday_calendar(start, values.len() + 1);
        let anchor = dates.remove(0);
        ReturnSeries::new(anchor, dates, values).unwrap()
    }

    fn known_returns() -> ReturnSeries {
        series(vec![-0.05, 0.03, -0.02, 0.01, 0.04, -0.03, 0.02, -0.01, 0.05, -0.04])
    }

    #[test]
    fn test_thresholds_ordered_and_inclusive() {
        let stats = calculate_outlier_stats(&known_returns(), 0.9).unwrap();
        let t = stats.thresholds;
        assert!(t.low_cut <= t.high_cut);
        // Type 7: h = 0.1 * 9 = 0.9 -> -0.05 + 0.9 * 0.01
        assert_approx_eq!(t.low_cut, -0.041, 1e-12);
        assert_approx_eq!(t.high_cut, 0.041, 1e-12);
        assert_eq!(stats.low.count, 1);
        assert_eq!(stats.high.count, 1);
        assert_approx_eq!(stats.low.extreme, -0.05);
        assert_approx_eq!(stats.high.extreme, 0.05);
    }

    #[test]
    fn test_boundary_value_is_in_tail() {
        // Odd length so the median quantile lands exactly on an observation.
        let returns = series(vec![-0.02, -0.01, 0.0, 0.01, 0.02]);
        let stats = calculate_outlier_stats(&returns, 0.75).unwrap();
        assert_approx_eq!(stats.thresholds.low_cut, -0.01);
        assert_approx_eq!(stats.thresholds.high_cut, 0.01);
        assert_eq!(stats.low.count, 2);
        assert_eq!(stats.high.count, 2);
        assert!(stats.thresholds.is_outlier(-0.01));
        assert!(!stats.thresholds.is_outlier(0.0));
    }

    #[test]
    fn test_tail_counts_match_quantile() {
        let n = 1000;
        let values: Vec<f64> = (0..n).map(|i| ((i * 7919) % n) as f64 / n as f64 - 0.5).collect();
        let stats = calculate_outlier_stats(&series(values), 0.95).unwrap();
        let expected = 2.0 * 0.05 * n as f64;
        assert!((stats.total_count() as f64 - expected).abs() <= 2.0);
        assert!(stats.thresholds.low_cut <= stats.thresholds.high_cut);
    }

    #[test]
    fn test_tail_statistics() {
        let stats = calculate_outlier_stats(&known_returns(), 0.75).unwrap();
        // low_cut = quantile(0.25) = -0.0275 -> {-0.05, -0.04, -0.03}
        assert_eq!(stats.low.count, 3);
        assert_approx_eq!(stats.low.mean, -0.04, 1e-12);
        assert_approx_eq!(stats.low.median, -0.04, 1e-12);
        assert_approx_eq!(stats.low.std_dev, (2.0f64 / 3.0).sqrt() * 0.01, 1e-12);
    }

    #[test]
    fn test_invalid_quantile() {
        for q in [0.0, 1.0, 1.5, -0.2] {
            assert!(matches!(
                calculate_outlier_stats(&known_returns(), q),
                Err(BlackSwanError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_empty_returns_have_no_thresholds() {
        match OutlierThresholds::from_returns(&[], 0.99) {
            Err(BlackSwanError::InsufficientData {
                operation, actual, ..
            }) => {
                assert_eq!(operation, "outlier_thresholds");
                assert_eq!(actual, 0);
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
        let single = OutlierThresholds::from_returns(&[0.01], 0.99).unwrap();
        assert_eq!(single.low_cut, 0.01);
        assert_eq!(single.high_cut, 0.01);
    }
}

//! Moving-average regime classification.
//!
//! The label for date `t` compares `price_t` with the simple moving average of
//! the `window` prices ending at `t - 1`. The average never includes `price_t`
//! itself; including it would leak the classified day's own move into its
//! label. The first `window` dates have no complete lagged window and are
//! [`RegimeLabel::Undefined`].
//!
//! Tie-break policy: `price_t == lagged_ma_t` is a Downtrend.

use crate::errors::{validate_data_length, validate_min_count, BlackSwanError, BlackSwanResult};
use crate::math_utils::{mean, median, population_std};
use crate::outliers::OutlierThresholds;
use crate::performance::cagr;
use crate::series::{PriceSeries, ReturnSeries};
use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Market state of one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegimeLabel {
    /// Price strictly above the lagged moving average
    Uptrend,
    /// Price at or below the lagged moving average
    Downtrend,
    /// Lagged moving average not yet available
    Undefined,
}

impl RegimeLabel {
    /// Report name.
    pub fn name(&self) -> &'static str {
        match self {
            RegimeLabel::Uptrend => "uptrend",
            RegimeLabel::Downtrend => "downtrend",
            RegimeLabel::Undefined => "undefined",
        }
    }

    /// Label is Uptrend or Downtrend.
    pub fn is_defined(&self) -> bool {
        !matches!(self, RegimeLabel::Undefined)
    }
}

/// One label per price date, with the lagged average that produced it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimeSeries {
    /// Moving-average window
    pub window: usize,
    /// Price dates
    pub dates: Vec<NaiveDate>,
    /// Label per date
    pub labels: Vec<RegimeLabel>,
    /// Moving average of the `window` prices ending the day before
    pub lagged_moving_average: Vec<Option<f64>>,
}

impl RegimeSeries {
    /// Number of dates carrying `label`.
    pub fn count(&self, label: RegimeLabel) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Label of `date`, `Undefined` for dates outside the series.
    pub fn label_on(&self, date: NaiveDate) -> RegimeLabel {
        self.dates
            .binary_search(&date)
            .map(|i| self.labels[i])
            .unwrap_or(RegimeLabel::Undefined)
    }

    /// Labels aligned one-to-one with the dates of `returns`.
    ///
    /// The label of a return date is the label of that same price date.
    pub fn aligned_to(&self, returns: &ReturnSeries) -> Vec<RegimeLabel> {
        returns.dates().iter().map(|&d| self.label_on(d)).collect()
    }
}

/// Classify every price date as Uptrend, Downtrend or Undefined.
///
/// Fails with `InvalidParameter` for `window == 0` and `InsufficientData` when
/// the series has fewer than `window` prices.
pub fn moving_average_regime(prices: &PriceSeries, window: usize) -> BlackSwanResult<RegimeSeries> {
    validate_min_count(window, 1, "window")?;
    validate_data_length(prices.prices(), window, "moving_average_regime")?;

    let p = prices.prices();
    let mut labels = Vec::with_capacity(p.len());
    let mut lagged = Vec::with_capacity(p.len());

    for t in 0..p.len() {
        if t < window {
            labels.push(RegimeLabel::Undefined);
            lagged.push(None);
            continue;
        }
        // prices t-window ..= t-1
        let ma = p[t - window..t].iter().sum::<f64>() / window as f64;
        labels.push(if p[t] > ma {
            RegimeLabel::Uptrend
        } else {
            RegimeLabel::Downtrend
        });
        lagged.push(Some(ma));
    }

    Ok(RegimeSeries {
        window,
        dates: prices.dates().to_vec(),
        labels,
        lagged_moving_average: lagged,
    })
}

/// Outlier and day counts per regime, the margins of the clustering table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimeOutlierCounts {
    /// Outlier days labelled Downtrend
    pub outliers_down: usize,
    /// Outlier days labelled Uptrend
    pub outliers_up: usize,
    /// All days labelled Downtrend
    pub total_down: usize,
    /// All days labelled Uptrend
    pub total_up: usize,
}

impl RegimeOutlierCounts {
    /// Outliers in either regime.
    pub fn total_outliers(&self) -> usize {
        self.outliers_down + self.outliers_up
    }

    /// Share of outliers that fell in Downtrend days; `None` without outliers.
    pub fn share_in_downtrend(&self) -> Option<f64> {
        let total = self.total_outliers();
        (total > 0).then(|| self.outliers_down as f64 / total as f64)
    }
}

/// Count outliers at quantile `q` per regime.
///
/// Thresholds come from the whole return series; Undefined days are excluded
/// from every count. `labels` must be aligned with `returns`.
pub fn outlier_regime_counts(
    returns: &ReturnSeries,
    labels: &[RegimeLabel],
    quantile: f64,
) -> BlackSwanResult<RegimeOutlierCounts> {
    let thresholds = OutlierThresholds::from_returns(returns.values(), quantile)?;
    Ok(count_with_thresholds(returns.values(), labels, &thresholds))
}

pub(crate) fn count_with_thresholds(
    values: &[f64],
    labels: &[RegimeLabel],
    thresholds: &OutlierThresholds,
) -> RegimeOutlierCounts {
    let mut counts = RegimeOutlierCounts {
        outliers_down: 0,
        outliers_up: 0,
        total_down: 0,
        total_up: 0,
    };
    for (&value, &label) in values.iter().zip(labels) {
        let outlier = thresholds.is_outlier(value);
        match label {
            RegimeLabel::Downtrend => {
                counts.total_down += 1;
                counts.outliers_down += outlier as usize;
            }
            RegimeLabel::Uptrend => {
                counts.total_up += 1;
                counts.outliers_up += outlier as usize;
            }
            RegimeLabel::Undefined => {}
        }
    }
    counts
}

/// Keep returns on `regime` days and earn `cash` on every other day.
///
/// The series starts at the first defined label and keeps the full calendar
/// from there, so conditioning on either regime yields the same elapsed years.
pub fn regime_conditioned_returns(
    returns: &ReturnSeries,
    labels: &[RegimeLabel],
    regime: RegimeLabel,
    cash: f64,
) -> BlackSwanResult<ReturnSeries> {
    let start = first_defined(labels, returns.len())?;
    let span = returns.tail_from(start)?;
    let values = span
        .values()
        .iter()
        .zip(&labels[start..])
        .map(|(&r, &l)| if l == regime { r } else { cash })
        .collect();
    span.with_values(values)
}

fn first_defined(labels: &[RegimeLabel], len: usize) -> BlackSwanResult<usize> {
    labels
        .iter()
        .take(len)
        .position(RegimeLabel::is_defined)
        .ok_or_else(|| BlackSwanError::InsufficientData {
            operation: "regime_conditioned_returns".to_string(),
            required: 1,
            actual: 0,
        })
}

/// Summary of returns inside one regime.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimePerformance {
    /// Regime summarized
    pub regime: RegimeLabel,
    /// Days in the regime
    pub count: usize,
    /// Share of all defined days
    pub share_of_total: f64,
    /// Mean daily return in the regime
    pub mean: f64,
    /// Median daily return in the regime
    pub median: f64,
    /// Population standard deviation of daily returns in the regime
    pub std_dev: f64,
    /// CAGR holding the asset only in this regime, cash otherwise
    pub annualized_return: f64,
}

/// Downtrend and Uptrend summaries, in that order.
pub fn regime_performance(
    returns: &ReturnSeries,
    labels: &[RegimeLabel],
    cash: f64,
) -> BlackSwanResult<Vec<RegimePerformance>> {
    let defined = labels.iter().filter(|l| l.is_defined()).count();

    [RegimeLabel::Downtrend, RegimeLabel::Uptrend]
        .into_iter()
        .map(|regime| {
            let members: Vec<f64> = returns
                .values()
                .iter()
                .zip(labels)
                .filter(|(_, l)| **l == regime)
                .map(|(&r, _)| r)
                .collect();
            let conditioned = regime_conditioned_returns(returns, labels, regime, cash)?;
            Ok(RegimePerformance {
                regime,
                count: members.len(),
                share_of_total: if defined > 0 {
                    members.len() as f64 / defined as f64
                } else {
                    f64::NAN
                },
                mean: mean(&members),
                median: median(&members),
                std_dev: if members.is_empty() {
                    f64::NAN
                } else {
                    population_std(&members)
                },
                annualized_return: cagr(&conditioned)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::weekday_calendar;
    use crate::scenarios::CASH;
    use assert_approx_eq::assert_approx_eq;

    fn price_series(values: Vec<f64>) -> PriceSeries {
        let dates = weekday_calendar(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), values.len());
        PriceSeries::from_parts(dates, values).unwrap()
    }

    #[test]
    fn test_first_window_dates_undefined() {
        let prices = price_series((1..=60).map(|i| 100.0 + i as f64).collect());
        let regimes = moving_average_regime(&prices, 10).unwrap();
        assert!(regimes.labels[..10].iter().all(|l| *l == RegimeLabel::Undefined));
        assert!(regimes.labels[10..].iter().all(|l| l.is_defined()));
        assert_eq!(regimes.count(RegimeLabel::Undefined), 10);
        assert_eq!(
            regimes.count(RegimeLabel::Uptrend) + regimes.count(RegimeLabel::Downtrend),
            50
        );
    }

    #[test]
    fn test_monotone_prices() {
        let up = price_series((1..=300).map(|i| i as f64).collect());
        let regimes = moving_average_regime(&up, 10).unwrap();
        assert!(regimes.labels[10..].iter().all(|l| *l == RegimeLabel::Uptrend));

        let down = price_series((1..=300).rev().map(|i| i as f64).collect());
        let regimes = moving_average_regime(&down, 10).unwrap();
        assert!(regimes.labels[10..].iter().all(|l| *l == RegimeLabel::Downtrend));
    }

    #[test]
    fn test_moving_average_excludes_current_price() {
        // Prices 1..=5 then a jump to 100. With the lag, the average on the jump
        // day is mean(1..=5) = 3; including the jump day would give a mean that
        // mixes in 100 and would fall on a later day.
        let prices = price_series(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0, 6.0]);
        let regimes = moving_average_regime(&prices, 5).unwrap();

        assert_eq!(regimes.lagged_moving_average[5], Some(3.0));
        assert_eq!(regimes.labels[5], RegimeLabel::Uptrend);
        // mean(2, 3, 4, 5, 100) = 22.8 > 6
        assert_approx_eq!(regimes.lagged_moving_average[6].unwrap(), 22.8, 1e-12);
        assert_eq!(regimes.labels[6], RegimeLabel::Downtrend);
    }

    #[test]
    fn test_sharp_drop_on_last_day_is_downtrend() {
        let mut values = vec![100.0; 20];
        values.push(50.0);
        let regimes = moving_average_regime(&price_series(values), 5).unwrap();
        assert_eq!(regimes.labels[20], RegimeLabel::Downtrend);
    }

    #[test]
    fn test_price_equal_to_average_is_downtrend() {
        // Tie-break policy: equality is classified as Downtrend.
        let regimes = moving_average_regime(&price_series(vec![100.0; 30]), 5).unwrap();
        assert!(regimes.labels[5..].iter().all(|l| *l == RegimeLabel::Downtrend));
    }

    #[test]
    fn test_invalid_window() {
        let prices = price_series(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            moving_average_regime(&prices, 0),
            Err(BlackSwanError::InvalidParameter { .. })
        ));
        assert!(matches!(
            moving_average_regime(&prices, 4),
            Err(BlackSwanError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_outlier_counts_exclude_undefined() {
        let prices =
            price_series((0..21).map(|i| 100.0 + if i % 2 == 0 { 0.0 } else { 5.0 }).collect());
        let returns = prices.daily_returns().unwrap();
        let mut labels = vec![RegimeLabel::Undefined; 10];
        labels.extend(vec![RegimeLabel::Uptrend; 10]);

        let counts = outlier_regime_counts(&returns, &labels, 0.9).unwrap();
        assert_eq!(counts.outliers_down, 0);
        assert_eq!(counts.total_down, 0);
        assert_eq!(counts.total_up, 10);
        assert!(counts.outliers_up > 0);
        assert_eq!(counts.share_in_downtrend(), Some(0.0));
    }

    #[test]
    fn test_aligned_labels_follow_return_dates() {
        let prices = price_series((1..=30).map(|i| i as f64).collect());
        let returns = prices.daily_returns().unwrap();
        let regimes = moving_average_regime(&prices, 5).unwrap();
        let aligned = regimes.aligned_to(&returns);
        assert_eq!(aligned.len(), returns.len());
        assert_eq!(aligned, regimes.labels[1..].to_vec());
    }

    #[test]
    fn test_regime_conditioned_series_share_denominator() {
        let prices = price_series((0..300).map(|i| 100.0 * 1.001f64.powi(i)).collect());
        let returns = prices.daily_returns().unwrap();
        let mut labels = vec![RegimeLabel::Undefined; 19];
        labels.extend((19..returns.len()).map(|i| {
            if i % 3 == 0 {
                RegimeLabel::Downtrend
            } else {
                RegimeLabel::Uptrend
            }
        }));

        let up = regime_conditioned_returns(&returns, &labels, RegimeLabel::Uptrend, CASH).unwrap();
        let down =
            regime_conditioned_returns(&returns, &labels, RegimeLabel::Downtrend, CASH).unwrap();
        assert_eq!(up.anchor(), down.anchor());
        assert_eq!(up.len(), down.len());
        assert_approx_eq!(up.elapsed_years(), down.elapsed_years());
    }

    #[test]
    fn test_regime_performance_annualizes_over_full_period() {
        let prices = price_series((0..253).map(|i| 100.0 * 1.001f64.powi(i)).collect());
        let returns = prices.daily_returns().unwrap();
        let labels: Vec<RegimeLabel> = (0..returns.len())
            .map(|i| if i < 126 { RegimeLabel::Uptrend } else { RegimeLabel::Downtrend })
            .collect();

        let perf = regime_performance(&returns, &labels, CASH).unwrap();
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].regime, RegimeLabel::Downtrend);
        assert_eq!(perf[0].count + perf[1].count, returns.len());
        assert_approx_eq!(perf[0].share_of_total + perf[1].share_of_total, 1.0);

        let full = cagr(&returns).unwrap();
        for row in &perf {
            assert!(row.annualized_return < full);
        }
    }
}

//! Bootstrap percentile confidence intervals for return-series statistics.
//!
//! Each trial draws `n` returns with replacement, rebuilds a series on the
//! original calendar and evaluates the statistic. Trials are independent: trial
//! `i` owns a generator seeded with `mix_seed(seed, i)`, so the collected
//! estimates (and the interval) are identical whether trials run serially or
//! on the rayon pool behind the `parallel` feature.

use crate::errors::{validate_data_length, validate_parameter, BlackSwanError, BlackSwanResult};
use crate::math_utils::{mean, quantile_type7, sample_std, sorted_copy};
use crate::secure_rng::{mix_seed, SecureRng};
use crate::series::ReturnSeries;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub(crate) const MIN_BOOTSTRAP_SAMPLES: usize = 100;
pub(crate) const MAX_BOOTSTRAP_SAMPLES: usize = 100_000;
pub(crate) const MIN_CONFIDENCE_LEVEL: f64 = 0.5;
pub(crate) const MAX_CONFIDENCE_LEVEL: f64 = 0.999;

/// Bootstrap resampling parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapConfiguration {
    /// Number of bootstrap resamples
    pub num_bootstrap_samples: usize,
    /// Confidence level of the percentile interval
    pub confidence_level: f64,
    /// Random seed for reproducible results; `None` draws one from OS entropy
    pub seed: Option<u64>,
}

impl Default for BootstrapConfiguration {
    fn default() -> Self {
        Self {
            num_bootstrap_samples: 2000,
            confidence_level: 0.95,
            seed: Some(42),
        }
    }
}

/// Check sample count and confidence level.
pub fn validate_bootstrap_config(config: &BootstrapConfiguration) -> BlackSwanResult<()> {
    if config.num_bootstrap_samples < MIN_BOOTSTRAP_SAMPLES
        || config.num_bootstrap_samples > MAX_BOOTSTRAP_SAMPLES
    {
        return Err(BlackSwanError::InvalidParameter {
            parameter: "num_bootstrap_samples".to_string(),
            value: config.num_bootstrap_samples as f64,
            constraint: format!("[{}, {}]", MIN_BOOTSTRAP_SAMPLES, MAX_BOOTSTRAP_SAMPLES),
        });
    }
    validate_parameter(
        config.confidence_level,
        MIN_CONFIDENCE_LEVEL,
        MAX_CONFIDENCE_LEVEL,
        "confidence_level",
    )
}

/// Percentile interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidenceInterval {
    /// Confidence level (e.g., 0.95 for 95%)
    pub confidence_level: f64,
    /// Lower bound
    pub lower_bound: f64,
    /// Upper bound
    pub upper_bound: f64,
}

impl ConfidenceInterval {
    /// `value` lies inside the closed interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }

    /// Zero lies outside the interval.
    pub fn excludes_zero(&self) -> bool {
        !self.contains(0.0)
    }

    /// `upper_bound - lower_bound`.
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Bootstrap distribution and interval of one statistic.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapValidation {
    /// Statistic on the observed series
    pub original_estimate: f64,
    /// Finite estimates from the resamples, in trial order
    pub bootstrap_estimates: Vec<f64>,
    /// Mean of the bootstrap estimates minus the original estimate
    pub bias: f64,
    /// Sample standard deviation of the bootstrap estimates
    pub standard_error: f64,
    /// Percentile interval
    pub confidence_interval: ConfidenceInterval,
    /// Resamples whose statistic failed or was not finite
    pub failed_samples: usize,
    /// Seed the trial seeds were derived from
    pub seed: u64,
}

/// Draw `values.len()` observations with replacement.
pub fn generate_bootstrap_sample(values: &[f64], rng: &mut SecureRng) -> Vec<f64> {
    let n = values.len();
    (0..n).map(|_| values[rng.usize(0..n)]).collect()
}

/// Percentile interval from bootstrap estimates (Type 7 quantiles).
///
/// Non-finite estimates are ignored. Falls back to the original estimate
/// when the bounds are not finite.
pub fn calculate_bootstrap_confidence_interval(
    bootstrap_estimates: &[f64],
    original_estimate: f64,
    confidence_level: f64,
) -> BlackSwanResult<ConfidenceInterval> {
    let finite: Vec<f64> = bootstrap_estimates
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .collect();
    if finite.is_empty() {
        return Err(BlackSwanError::StatisticalTestError {
            test_name: "bootstrap".to_string(),
            reason: "no finite bootstrap estimates available".to_string(),
        });
    }
    let sorted = sorted_copy(&finite);

    let alpha = 1.0 - confidence_level;
    let lower_bound = quantile_type7(&sorted, alpha / 2.0);
    let upper_bound = quantile_type7(&sorted, 1.0 - alpha / 2.0);

    if !lower_bound.is_finite() || !upper_bound.is_finite() {
        return Ok(ConfidenceInterval {
            confidence_level,
            lower_bound: original_estimate,
            upper_bound: original_estimate,
        });
    }

    Ok(ConfidenceInterval {
        confidence_level,
        lower_bound,
        upper_bound,
    })
}

fn run_trial<F>(returns: &ReturnSeries, statistic: &F, seed: u64, trial: usize) -> f64
where
    F: Fn(&ReturnSeries) -> BlackSwanResult<f64>,
{
    let mut rng = SecureRng::with_seed(mix_seed(seed, trial));
    let sample = generate_bootstrap_sample(returns.values(), &mut rng);
    returns
        .with_values(sample)
        .and_then(|resampled| statistic(&resampled))
        .unwrap_or(f64::NAN)
}

/// Bootstrap a statistic of `returns` and report its percentile interval.
///
/// Individual resamples whose statistic fails are counted in
/// `failed_samples` and left out of the interval. Fails if the observed
/// statistic itself fails or if fewer than two resamples succeed.
pub fn bootstrap_confidence_interval<F>(
    returns: &ReturnSeries,
    statistic: F,
    config: &BootstrapConfiguration,
) -> BlackSwanResult<BootstrapValidation>
where
    F: Fn(&ReturnSeries) -> BlackSwanResult<f64> + Sync,
{
    validate_bootstrap_config(config)?;
    validate_data_length(returns.values(), 2, "bootstrap_confidence_interval")?;

    let original_estimate = statistic(returns)?;
    let seed = config.seed.unwrap_or_else(|| SecureRng::new().u64());
    let trials = config.num_bootstrap_samples;

    log::debug!(
        "bootstrap: {} resamples of {} returns, seed {}",
        trials,
        returns.len(),
        seed
    );

    #[cfg(feature = "parallel")]
    let raw: Vec<f64> = {
        use rayon::prelude::*;
        (0..trials)
            .into_par_iter()
            .map(|i| run_trial(returns, &statistic, seed, i))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let raw: Vec<f64> = (0..trials)
        .map(|i| run_trial(returns, &statistic, seed, i))
        .collect();

    let bootstrap_estimates: Vec<f64> = raw.into_iter().filter(|x| x.is_finite()).collect();
    let failed_samples = trials - bootstrap_estimates.len();

    if bootstrap_estimates.len() < 2 {
        return Err(BlackSwanError::StatisticalTestError {
            test_name: "bootstrap".to_string(),
            reason: format!("{} of {} resamples failed", failed_samples, trials),
        });
    }
    if failed_samples > 0 {
        log::warn!(
            "bootstrap: {} of {} resamples failed and were excluded",
            failed_samples,
            trials
        );
    }

    let confidence_interval = calculate_bootstrap_confidence_interval(
        &bootstrap_estimates,
        original_estimate,
        config.confidence_level,
    )?;

    Ok(BootstrapValidation {
        original_estimate,
        bias: mean(&bootstrap_estimates) - original_estimate,
        standard_error: sample_std(&bootstrap_estimates),
        bootstrap_estimates,
        confidence_interval,
        failed_samples,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::weekday_calendar;
    use assert_approx_eq::assert_approx_eq;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let mut dates = weekday_calendar(start, values.len() + 1);
        let anchor = dates.remove(0);
        ReturnSeries::new(anchor, dates, values).unwrap()
    }

    fn noisy_returns(n: usize, seed: u64) -> ReturnSeries {
        let mut rng = SecureRng::with_seed(seed);
        series((0..n).map(|_| 0.0005 + 0.01 * rng.standard_normal()).collect())
    }

    fn sample_mean(r: &ReturnSeries) -> BlackSwanResult<f64> {
        Ok(mean(r.values()))
    }

    #[test]
    fn test_percentile_interval_type7() {
        let estimates: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let ci = calculate_bootstrap_confidence_interval(&estimates, 50.0, 0.90).unwrap();
        assert_approx_eq!(ci.lower_bound, 5.0, 1e-9);
        assert_approx_eq!(ci.upper_bound, 95.0, 1e-9);
        assert_approx_eq!(ci.width(), 90.0, 1e-9);
        assert!(ci.excludes_zero());
    }

    #[test]
    fn test_interval_ignores_non_finite_estimates() {
        let estimates = [f64::NAN, 1.0, 2.0, f64::INFINITY, 3.0];
        let ci = calculate_bootstrap_confidence_interval(&estimates, 2.0, 0.5).unwrap();
        assert!(ci.lower_bound >= 1.0 && ci.upper_bound <= 3.0);
        assert!(calculate_bootstrap_confidence_interval(&[f64::NAN], 0.0, 0.95).is_err());
    }

    #[test]
    fn test_same_seed_same_interval() {
        let returns = noisy_returns(400, 1);
        let config = BootstrapConfiguration {
            num_bootstrap_samples: 500,
            ..Default::default()
        };
        let a = bootstrap_confidence_interval(&returns, sample_mean, &config).unwrap();
        let b = bootstrap_confidence_interval(&returns, sample_mean, &config).unwrap();
        assert_eq!(a.confidence_interval, b.confidence_interval);
        assert_eq!(a.bootstrap_estimates, b.bootstrap_estimates);
        assert_eq!(a.seed, 42);
    }

    #[test]
    fn test_different_seeds_give_close_intervals() {
        let returns = noisy_returns(500, 2);
        let run = |seed| {
            let config = BootstrapConfiguration {
                num_bootstrap_samples: 2000,
                confidence_level: 0.95,
                seed: Some(seed),
            };
            bootstrap_confidence_interval(&returns, sample_mean, &config)
                .unwrap()
                .confidence_interval
        };
        let a = run(7);
        let b = run(8);
        assert_ne!(a, b);
        let tolerance = 0.25 * a.width();
        assert!((a.lower_bound - b.lower_bound).abs() < tolerance);
        assert!((a.upper_bound - b.upper_bound).abs() < tolerance);
    }

    #[test]
    fn test_interval_width_matches_standard_error_of_mean() {
        let returns = noisy_returns(500, 3);
        let config = BootstrapConfiguration::default();
        let result = bootstrap_confidence_interval(&returns, sample_mean, &config).unwrap();

        assert!(result.confidence_interval.contains(result.original_estimate));
        let analytic = 2.0 * 1.96 * sample_std(returns.values()) / (returns.len() as f64).sqrt();
        let ratio = result.confidence_interval.width() / analytic;
        assert!(ratio > 0.8 && ratio < 1.2, "width ratio {}", ratio);
        assert!(result.bias.abs() < result.standard_error);
        assert_eq!(result.failed_samples, 0);
    }

    #[test]
    fn test_failed_resamples_are_counted() {
        let returns = series((0..50).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect());
        let positive_only = |r: &ReturnSeries| {
            let total: f64 = r.values().iter().sum();
            if total > 0.0 {
                Err(BlackSwanError::DegenerateDistribution {
                    statistic: "test".to_string(),
                    reason: "positive sum".to_string(),
                })
            } else {
                Ok(total)
            }
        };
        let config = BootstrapConfiguration {
            num_bootstrap_samples: 400,
            ..Default::default()
        };
        let result = bootstrap_confidence_interval(&returns, positive_only, &config).unwrap();
        assert!(result.failed_samples > 0);
        assert_eq!(result.failed_samples + result.bootstrap_estimates.len(), 400);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_resamples_match_serial_order() {
        let returns = noisy_returns(300, 5);
        let seed = 99;
        let trials = 600;
        // Fails on roughly half the resamples so filtering must keep trial order
        let observed = mean(returns.values());
        let at_least_observed = |r: &ReturnSeries| {
            let m = mean(r.values());
            if m >= observed {
                Ok(m)
            } else {
                Err(BlackSwanError::DegenerateDistribution {
                    statistic: "test".to_string(),
                    reason: "below observed mean".to_string(),
                })
            }
        };
        let config = BootstrapConfiguration {
            num_bootstrap_samples: trials,
            confidence_level: 0.95,
            seed: Some(seed),
        };
        let result = bootstrap_confidence_interval(&returns, at_least_observed, &config).unwrap();

        let serial: Vec<f64> = (0..trials)
            .map(|i| {
                let mut rng = SecureRng::with_seed(mix_seed(seed, i));
                let sample = generate_bootstrap_sample(returns.values(), &mut rng);
                returns
                    .with_values(sample)
                    .and_then(|resampled| at_least_observed(&resampled))
                    .unwrap_or(f64::NAN)
            })
            .filter(|x| x.is_finite())
            .collect();

        assert_eq!(result.bootstrap_estimates, serial);
        assert_eq!(result.failed_samples, trials - serial.len());
        assert!(result.failed_samples > 0);
    }

    #[test]
    fn test_invalid_configuration() {
        let returns = noisy_returns(50, 4);
        let too_few = BootstrapConfiguration {
            num_bootstrap_samples: 10,
            ..Default::default()
        };
        assert!(matches!(
            bootstrap_confidence_interval(&returns, sample_mean, &too_few),
            Err(BlackSwanError::InvalidParameter { .. })
        ));
        let bad_level = BootstrapConfiguration {
            confidence_level: 1.0,
            ..Default::default()
        };
        assert!(validate_bootstrap_config(&bad_level).is_err());
        assert!(validate_bootstrap_config(&BootstrapConfiguration::default()).is_ok());
    }
}

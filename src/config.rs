//! # Validation Configuration
//!
//! Every tunable of the claim validation pipeline lives here and is passed
//! explicitly; no analysis step reads hidden globals.

use crate::bootstrap::{validate_bootstrap_config, BootstrapConfiguration};
use crate::errors::{
    validate_min_count, validate_open_unit_interval, validate_parameter, BlackSwanError,
    BlackSwanResult,
};
use crate::scenarios::CASH;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of the four claim evaluations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationConfig {
    /// Outlier quantile for the headline figures
    pub outlier_quantile: f64,
    /// Quantiles of the clustering sensitivity grid
    pub clustering_quantiles: Vec<f64>,
    /// Moving-average window of the headline regime split and backtest
    pub ma_window: usize,
    /// Windows of the clustering grid and backtest sweep
    pub ma_windows: Vec<usize>,
    /// Best/worst day counts of the scenario sweep
    pub scenario_days: Vec<usize>,
    /// Best days removed in the bootstrapped CAGR impact
    pub bootstrap_days: usize,
    /// Annual risk-free rate for Sharpe ratios
    pub risk_free_rate: f64,
    /// Return credited on neutralized or out-of-market days
    pub cash_return: f64,
    /// Bootstrap resamples
    pub bootstrap_iterations: usize,
    /// Bootstrap confidence level
    pub confidence_level: f64,
    /// Bootstrap seed; `None` draws one from OS entropy
    pub seed: Option<u64>,
    /// p-value threshold of every hypothesis test
    pub significance_level: f64,
    /// Excess kurtosis above which fat tails are material
    pub kurtosis_threshold: f64,
    /// Drawdown reduction (fractional points) the strategy must achieve
    pub drawdown_improvement: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ValidationConfig {
    /// Standard configuration: full bootstrap and sensitivity grids
    pub fn standard() -> Self {
        Self {
            outlier_quantile: 0.99,
            clustering_quantiles: vec![0.95, 0.99, 0.999],
            ma_window: 200,
            ma_windows: vec![50, 100, 200, 300],
            scenario_days: vec![5, 10, 20, 50],
            bootstrap_days: 10,
            risk_free_rate: 0.0,
            cash_return: CASH,
            bootstrap_iterations: 2000,
            confidence_level: 0.95,
            seed: Some(42),
            significance_level: 0.05,
            kurtosis_threshold: 1.0,
            drawdown_improvement: 0.20,
        }
    }

    /// Quick configuration: fewer bootstrap resamples, same grids
    pub fn quick() -> Self {
        Self {
            bootstrap_iterations: 200,
            ..Self::standard()
        }
    }

    /// Same configuration with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bootstrap settings derived from this configuration.
    pub fn bootstrap(&self) -> BootstrapConfiguration {
        BootstrapConfiguration {
            num_bootstrap_samples: self.bootstrap_iterations,
            confidence_level: self.confidence_level,
            seed: self.seed,
        }
    }

    /// Check every field; the first violation is returned as `InvalidParameter`.
    pub fn validate(&self) -> BlackSwanResult<()> {
        validate_open_unit_interval(self.outlier_quantile, "outlier_quantile")?;
        non_empty(self.clustering_quantiles.len(), "clustering_quantiles")?;
        for &q in &self.clustering_quantiles {
            validate_open_unit_interval(q, "clustering_quantiles")?;
        }

        validate_min_count(self.ma_window, 1, "ma_window")?;
        non_empty(self.ma_windows.len(), "ma_windows")?;
        for &w in &self.ma_windows {
            validate_min_count(w, 1, "ma_windows")?;
        }

        non_empty(self.scenario_days.len(), "scenario_days")?;
        validate_min_count(self.bootstrap_days, 1, "bootstrap_days")?;

        validate_parameter(self.risk_free_rate, -1.0, 1.0, "risk_free_rate")?;
        validate_parameter(self.cash_return, -0.5, 0.5, "cash_return")?;
        validate_open_unit_interval(self.significance_level, "significance_level")?;
        validate_parameter(self.kurtosis_threshold, 0.0, f64::MAX, "kurtosis_threshold")?;
        validate_parameter(self.drawdown_improvement, 0.0, 1.0, "drawdown_improvement")?;

        validate_bootstrap_config(&self.bootstrap())
    }
}

fn non_empty(len: usize, name: &str) -> BlackSwanResult<()> {
    if len == 0 {
        return Err(BlackSwanError::InvalidParameter {
            parameter: name.to_string(),
            value: 0.0,
            constraint: "at least one entry".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        let config = ValidationConfig::default();
        assert_eq!(config, ValidationConfig::standard());
        assert_eq!(config.ma_window, 200);
        assert_eq!(config.bootstrap_iterations, 2000);
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quick_preset() {
        let quick = ValidationConfig::quick();
        assert!(quick.bootstrap_iterations < ValidationConfig::standard().bootstrap_iterations);
        assert_eq!(quick.ma_windows, ValidationConfig::standard().ma_windows);
        assert!(quick.validate().is_ok());
    }

    #[test]
    fn test_bootstrap_settings_follow_config() {
        let config = ValidationConfig::quick().with_seed(7);
        let bootstrap = config.bootstrap();
        assert_eq!(bootstrap.num_bootstrap_samples, 200);
        assert_eq!(bootstrap.seed, Some(7));
        assert_eq!(bootstrap.confidence_level, 0.95);
    }

    #[test]
    fn test_invalid_fields_rejected() {
        let cases: Vec<(ValidationConfig, &str)> = vec![
            (
                ValidationConfig {
                    outlier_quantile: 1.0,
                    ..Default::default()
                },
                "outlier_quantile",
            ),
            (
                ValidationConfig {
                    clustering_quantiles: vec![0.95, 0.0],
                    ..Default::default()
                },
                "clustering_quantiles",
            ),
            (
                ValidationConfig {
                    ma_window: 0,
                    ..Default::default()
                },
                "ma_window",
            ),
            (
                ValidationConfig {
                    ma_windows: vec![],
                    ..Default::default()
                },
                "ma_windows",
            ),
            (
                ValidationConfig {
                    bootstrap_days: 0,
                    ..Default::default()
                },
                "bootstrap_days",
            ),
            (
                ValidationConfig {
                    significance_level: 0.0,
                    ..Default::default()
                },
                "significance_level",
            ),
            (
                ValidationConfig {
                    bootstrap_iterations: 5,
                    ..Default::default()
                },
                "num_bootstrap_samples",
            ),
            (
                ValidationConfig {
                    confidence_level: 0.2,
                    ..Default::default()
                },
                "confidence_level",
            ),
        ];
        for (config, field) in cases {
            match config.validate() {
                Err(BlackSwanError::InvalidParameter { parameter, .. }) => {
                    assert_eq!(parameter, field)
                }
                other => panic!("{} accepted: {:?}", field, other),
            }
        }
    }
}

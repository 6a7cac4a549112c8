//! # Black Swan Analysis
//!
//! Statistical tools for testing claims about extreme days in long daily
//! price histories.
//!
//! The crate detects tail outliers, classifies each date into an Uptrend or
//! Downtrend regime using a lagged moving average, simulates "missed the best
//! days" scenarios, computes annualized performance metrics and runs the
//! hypothesis tests needed to confirm or reject four claims:
//!
//! 1. daily returns are fat-tailed;
//! 2. a handful of extreme days has an outsized effect on long-run growth;
//! 3. extreme days cluster in downtrends;
//! 4. a trend-following filter materially reduces drawdowns.
//!
//! ## Key Features
//!
//! - **No look-ahead**: the regime label of a date compares its price with a
//!   moving average that ends the day before, and the backtest trades on the
//!   previous day's label.
//! - **Calendar annualization**: every CAGR divides by the elapsed calendar
//!   time of the full period, including for scenario and regime-conditioned
//!   series where some days are replaced with cash.
//! - **Honest p-values**: contingency tests with too-small expected counts are
//!   reported as invalid rather than as a misleading p-value.
//! - **Reproducible bootstrap**: percentile intervals are identical for a given
//!   seed, serial or parallel.
//!
//! ## Quick Start
//!
//! ```rust
//! use blackswans::{
//!     generate_regime_switching_prices, validate_claims, ClaimId, SyntheticMarketConfig,
//!     ValidationConfig,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let prices = generate_regime_switching_prices(&SyntheticMarketConfig {
//!         n_days: 4000,
//!         ..Default::default()
//!     })?;
//!
//!     let summary = validate_claims(&prices, &ValidationConfig::quick())?;
//!     for claim in &summary.claims {
//!         println!("{}: {}", claim.claim, claim.verdict);
//!     }
//!     assert!(summary.claim(ClaimId::FatTails).is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` on every result record. Deserialized
//!   price and return series are checked like constructed ones.
//! - `parallel`: bootstrap resamples run on the rayon thread pool.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod math_utils;
pub mod results;
pub mod secure_rng;
pub mod series;

// Analysis methods
pub mod backtest;
pub mod bootstrap;
pub mod generators;
pub mod outliers;
pub mod performance;
pub mod regimes;
pub mod scenarios;
pub mod validation;

// Re-exports for convenience - main public API
pub use config::ValidationConfig;
pub use errors::{BlackSwanError, BlackSwanResult};
pub use results::{
    BootstrapSummary, ClaimDetails, ClaimId, ClaimVerdict, ClusteringReport, ClusteringRow,
    Evidence, FatTailReport, OutsizedInfluenceReport, TrendFollowingReport, ValidationSummary,
    Verdict,
};
pub use series::{compute_daily_returns, PriceSeries, ReturnSeries};
pub use validation::{validate_claims, ClaimValidator};

// Outlier and regime exports
pub use outliers::{calculate_outlier_stats, OutlierStats, OutlierThresholds, TailStatistics};
pub use regimes::{
    moving_average_regime, outlier_regime_counts, regime_conditioned_returns, regime_performance,
    RegimeLabel, RegimeOutlierCounts, RegimePerformance, RegimeSeries,
};

// Scenario and performance exports
pub use performance::{
    annualized_volatility, cagr, excess_kurtosis, max_drawdown, sharpe_ratio, skewness,
    total_return, PerformanceSummary,
};
pub use scenarios::{
    miss_best_impact, scenario_result, scenario_returns, scenario_sweep, ScenarioKind,
    ScenarioResult, ScenarioReturns, CASH,
};

// Statistical test exports
pub use statistical_tests::{
    chi_square_regime_clustering, jarque_bera_test, kolmogorov_smirnov_test, normality_tests,
    two_proportion_z_test, NormalityTests, TestOutcome, TestResult,
};

// Bootstrap and backtest exports
pub use backtest::{
    backtest_sweep, trend_following_backtest, trend_following_returns, StrategyReturns,
    TrendFollowingBacktest,
};
pub use bootstrap::{
    bootstrap_confidence_interval, calculate_bootstrap_confidence_interval,
    generate_bootstrap_sample, BootstrapConfiguration, BootstrapValidation, ConfidenceInterval,
};

// Data generation exports
pub use generators::{
    generate_gaussian_prices, generate_regime_switching_prices, generate_synthetic_market,
    weekday_calendar, RegimeParams, SyntheticMarket, SyntheticMarketConfig,
};

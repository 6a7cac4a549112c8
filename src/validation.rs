//! Claim validation pipeline.
//!
//! [`ClaimValidator`] evaluates the four claims independently against one
//! price history. Each evaluation is a pure function of the prices and the
//! configuration and ends in a terminal [`Verdict`]. A failure inside one
//! claim (too little data, a degenerate sample, an invalid contingency table)
//! makes that claim Inconclusive and never prevents the other three from being
//! reported.

use crate::backtest::{trend_following_backtest, TrendFollowingBacktest};
use crate::bootstrap::bootstrap_confidence_interval;
use crate::config::ValidationConfig;
use crate::errors::{BlackSwanError, BlackSwanResult};
use crate::math_utils::{mean, sample_std, ZERO_VARIANCE_THRESHOLD};
use crate::outliers::calculate_outlier_stats;
use crate::performance::{excess_kurtosis, skewness};
use crate::regimes::{moving_average_regime, outlier_regime_counts, regime_performance};
use crate::results::{
    BootstrapSummary, ClaimDetails, ClaimId, ClaimVerdict, ClusteringReport, ClusteringRow,
    Evidence, FatTailReport, OutsizedInfluenceReport, TrendFollowingReport, ValidationSummary,
    Verdict,
};
use crate::scenarios::{miss_best_impact, scenario_sweep};
use crate::series::{PriceSeries, ReturnSeries};
use crate::statistical_tests::{
    chi_square_regime_clustering, normality_tests, two_proportion_z_test, TestOutcome,
    MAX_SHAPIRO_WILK_SAMPLE,
};

/// Evaluates the claims with one configuration.
#[derive(Debug, Clone)]
pub struct ClaimValidator {
    config: ValidationConfig,
}

impl ClaimValidator {
    /// Validator with a checked configuration.
    pub fn new(config: ValidationConfig) -> BlackSwanResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Evaluate every claim on `prices`.
    ///
    /// Only a price series too short to yield returns is an error; every other
    /// failure is recorded in the affected claim.
    pub fn validate(&self, prices: &PriceSeries) -> BlackSwanResult<ValidationSummary> {
        let returns = prices.daily_returns()?;
        log::debug!(
            "validating {} returns from {} to {}",
            returns.len(),
            returns.anchor(),
            returns.last_date()
        );

        let claims = ClaimId::ALL
            .iter()
            .map(|&claim| self.evaluate(claim, prices, &returns))
            .collect();

        Ok(ValidationSummary {
            observations: returns.len(),
            start_date: returns.anchor(),
            end_date: returns.last_date(),
            claims,
        })
    }

    /// Evaluate one claim, converting any failure into an Inconclusive verdict.
    pub fn evaluate(
        &self,
        claim: ClaimId,
        prices: &PriceSeries,
        returns: &ReturnSeries,
    ) -> ClaimVerdict {
        log::info!("evaluating claim {}", claim);

        let outcome = match claim {
            ClaimId::FatTails => self.fat_tails(returns),
            ClaimId::OutsizedInfluence => self.outsized_influence(returns),
            ClaimId::RegimeClustering => self.regime_clustering(prices, returns),
            ClaimId::TrendFollowing => self.trend_following(prices),
        };

        match outcome {
            Ok(verdict) => {
                if verdict.verdict == Verdict::Inconclusive {
                    log::warn!("claim {} is inconclusive", claim);
                } else {
                    log::info!("claim {}: {}", claim, verdict.verdict);
                }
                verdict
            }
            Err(e) => {
                log::warn!("claim {} is inconclusive: {}", claim, e);
                ClaimVerdict::inconclusive(claim, format!("{}: {}", e.kind(), e))
            }
        }
    }

    /// Fat tails: both normality tests reject and excess kurtosis is material.
    pub fn fat_tails(&self, returns: &ReturnSeries) -> BlackSwanResult<ClaimVerdict> {
        let cfg = &self.config;
        let values = returns.values();

        let normality = normality_tests(values)?;
        let kurtosis = excess_kurtosis(values)?;
        let skew = skewness(values)?;
        let outliers = calculate_outlier_stats(returns, cfg.outlier_quantile)?;

        let m = mean(values);
        let sd = sample_std(values);
        if sd * sd <= ZERO_VARIANCE_THRESHOLD {
            return Err(BlackSwanError::DegenerateDistribution {
                statistic: "return_sigma".to_string(),
                reason: "returns have zero variance".to_string(),
            });
        }
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        let report = FatTailReport {
            excess_kurtosis: kurtosis,
            skewness: skew,
            max_return_sigma: (max - m) / sd,
            min_return_sigma: (min - m) / sd,
            outliers,
            normality,
        };

        let confirmed = report.normality.both_reject(cfg.significance_level)
            && kurtosis > cfg.kurtosis_threshold;

        let mut evidence = Evidence::new()
            .with_metric("ks_statistic", report.normality.kolmogorov_smirnov.test_statistic)
            .with_metric("ks_p_value", report.normality.kolmogorov_smirnov.p_value)
            .with_metric("jb_statistic", report.normality.jarque_bera.test_statistic)
            .with_metric("jb_p_value", report.normality.jarque_bera.p_value)
            .with_metric("excess_kurtosis", kurtosis)
            .with_metric("skewness", skew)
            .with_metric("max_return_sigma", report.max_return_sigma)
            .with_metric("min_return_sigma", report.min_return_sigma)
            .with_metric("outlier_count", report.outliers.total_count() as f64)
            .with_note(format!("kurtosis threshold {}", cfg.kurtosis_threshold));
        match &report.normality.shapiro_wilk {
            Some(sw) => {
                evidence = evidence
                    .with_metric("sw_statistic", sw.test_statistic)
                    .with_metric("sw_p_value", sw.p_value);
            }
            None => {
                evidence = evidence.with_note(format!(
                    "shapiro_wilk skipped above {} observations",
                    MAX_SHAPIRO_WILK_SAMPLE
                ));
            }
        }

        Ok(ClaimVerdict {
            claim: ClaimId::FatTails,
            verdict: if confirmed { Verdict::Confirmed } else { Verdict::Rejected },
            evidence,
            details: Some(ClaimDetails::FatTails(report)),
        })
    }

    /// Outsized influence: the bootstrap interval of the CAGR lost by missing
    /// the best days excludes zero.
    pub fn outsized_influence(&self, returns: &ReturnSeries) -> BlackSwanResult<ClaimVerdict> {
        let cfg = &self.config;
        let scenarios = scenario_sweep(returns, &cfg.scenario_days, cfg.cash_return)?;

        let n_days = cfg.bootstrap_days;
        let cash = cfg.cash_return;
        let bootstrap = bootstrap_confidence_interval(
            returns,
            |r: &ReturnSeries| miss_best_impact(r, n_days, cash),
            &cfg.bootstrap(),
        )?;
        let impact = BootstrapSummary::from(&bootstrap);
        let ci = impact.confidence_interval;

        let mut evidence = Evidence::new()
            .with_metric("bootstrap_days", n_days as f64)
            .with_metric("cagr_impact", impact.estimate)
            .with_metric("ci_lower", ci.lower_bound)
            .with_metric("ci_upper", ci.upper_bound)
            .with_metric("standard_error", impact.standard_error);
        for row in &scenarios {
            evidence = evidence.with_metric(
                &format!("impact_miss_best_{}", row.n_days),
                row.impact_miss_best(),
            );
        }
        if impact.failed_samples > 0 {
            evidence = evidence
                .with_note(format!("{} bootstrap resamples failed", impact.failed_samples));
        }

        Ok(ClaimVerdict {
            claim: ClaimId::OutsizedInfluence,
            verdict: if ci.excludes_zero() { Verdict::Confirmed } else { Verdict::Rejected },
            evidence,
            details: Some(ClaimDetails::OutsizedInfluence(OutsizedInfluenceReport {
                scenarios,
                bootstrap_days: n_days,
                impact,
            })),
        })
    }

    /// Clustering grid over `ma_windows` x `clustering_quantiles`.
    ///
    /// A combination counts toward confirmation when both tests are valid and
    /// significant with outliers over-represented in Downtrend days. Confirmed
    /// when such combinations are a strict majority of the grid; Inconclusive
    /// when no combination produced a valid chi-square test.
    pub fn regime_clustering(
        &self,
        prices: &PriceSeries,
        returns: &ReturnSeries,
    ) -> BlackSwanResult<ClaimVerdict> {
        let cfg = &self.config;
        let alpha = cfg.significance_level;
        let mut rows = Vec::with_capacity(cfg.ma_windows.len() * cfg.clustering_quantiles.len());
        let mut notes = Vec::new();
        let mut performance = Vec::new();

        for &window in &cfg.ma_windows {
            let labels = match moving_average_regime(prices, window) {
                Ok(regimes) => regimes.aligned_to(returns),
                Err(e) => {
                    log::warn!("clustering: window {} skipped: {}", window, e);
                    notes.push(format!("window {} skipped: {}", window, e));
                    continue;
                }
            };

            if window == cfg.ma_window {
                match regime_performance(returns, &labels, cfg.cash_return) {
                    Ok(p) => performance = p,
                    Err(e) => notes.push(format!("regime performance unavailable: {}", e)),
                }
            }

            for &quantile in &cfg.clustering_quantiles {
                let counts = outlier_regime_counts(returns, &labels, quantile)?;
                let chi_square = TestOutcome::from_result(chi_square_regime_clustering(&counts));
                let z_test = TestOutcome::from_result(two_proportion_z_test(&counts));

                for outcome in [&chi_square, &z_test] {
                    if let TestOutcome::Invalid { reason, .. } = outcome {
                        log::warn!(
                            "clustering: window {} quantile {}: {}",
                            window,
                            quantile,
                            reason
                        );
                        notes.push(format!("window {} quantile {}: {}", window, quantile, reason));
                    }
                }

                rows.push(ClusteringRow {
                    window,
                    quantile,
                    pct_in_downtrend: counts.share_in_downtrend().map(|s| 100.0 * s),
                    counts,
                    chi_square,
                    z_test,
                });
            }
        }

        let valid_rows = rows.iter().filter(|r| r.chi_square.is_valid()).count();
        let significant_rows = rows
            .iter()
            .filter(|r| r.is_significant(alpha) && r.direction() == Some(1.0))
            .count();
        let directions: Vec<f64> = rows.iter().filter_map(ClusteringRow::direction).collect();
        let robust = !directions.is_empty() && directions.iter().all(|&d| d == directions[0]);
        let all_valid = rows
            .iter()
            .all(|r| r.chi_square.is_valid() && r.z_test.is_valid());

        let main = rows
            .iter()
            .find(|r| {
                r.window == cfg.ma_window && (r.quantile - cfg.outlier_quantile).abs() < 1e-12
            })
            .cloned();

        let verdict = if valid_rows == 0 {
            Verdict::Inconclusive
        } else if 2 * significant_rows > rows.len() {
            Verdict::Confirmed
        } else {
            Verdict::Rejected
        };

        let mut evidence = Evidence::new()
            .with_metric("combinations", rows.len() as f64)
            .with_metric("valid_combinations", valid_rows as f64)
            .with_metric("significant_combinations", significant_rows as f64)
            .with_metric("robust", if robust { 1.0 } else { 0.0 });
        evidence.valid = all_valid && valid_rows > 0;
        if let Some(row) = &main {
            evidence = evidence
                .with_metric("outliers_downtrend", row.counts.outliers_down as f64)
                .with_metric("outliers_uptrend", row.counts.outliers_up as f64);
            if let Some(pct) = row.pct_in_downtrend {
                evidence = evidence.with_metric("pct_in_downtrend", pct);
            }
            if let Some(chi) = row.chi_square.result() {
                evidence = evidence.with_metric("chi_square_p_value", chi.p_value);
            }
            if let Some(z) = row.z_test.result() {
                evidence = evidence
                    .with_metric("z_statistic", z.test_statistic)
                    .with_metric("z_p_value", z.p_value);
            }
        }
        evidence.notes.extend(notes);

        Ok(ClaimVerdict {
            claim: ClaimId::RegimeClustering,
            verdict,
            evidence,
            details: Some(ClaimDetails::RegimeClustering(ClusteringReport {
                rows,
                main,
                significant_rows,
                valid_rows,
                robust,
                regime_performance: performance,
            })),
        })
    }

    /// Trend following: the headline-window strategy improves maximum
    /// drawdown by at least `drawdown_improvement`.
    pub fn trend_following(&self, prices: &PriceSeries) -> BlackSwanResult<ClaimVerdict> {
        let cfg = &self.config;
        let main =
            trend_following_backtest(prices, cfg.ma_window, cfg.risk_free_rate, cfg.cash_return)?;

        let mut notes = Vec::new();
        let backtests: Vec<TrendFollowingBacktest> = cfg
            .ma_windows
            .iter()
            .filter_map(|&w| {
                if w == cfg.ma_window {
                    return Some(main);
                }
                match trend_following_backtest(prices, w, cfg.risk_free_rate, cfg.cash_return) {
                    Ok(b) => Some(b),
                    Err(e) => {
                        log::warn!("backtest: window {} skipped: {}", w, e);
                        notes.push(format!("window {} skipped: {}", w, e));
                        None
                    }
                }
            })
            .collect();

        let improvement = main.drawdown_improvement();
        let mut evidence = Evidence::new()
            .with_metric("window", cfg.ma_window as f64)
            .with_metric("buy_hold_max_drawdown", main.buy_hold.max_drawdown)
            .with_metric("strategy_max_drawdown", main.strategy.max_drawdown)
            .with_metric("drawdown_improvement", improvement)
            .with_metric("buy_hold_cagr", main.buy_hold.cagr)
            .with_metric("strategy_cagr", main.strategy.cagr)
            .with_metric("buy_hold_sharpe", main.buy_hold.sharpe_ratio)
            .with_metric("strategy_sharpe", main.strategy.sharpe_ratio)
            .with_metric("time_in_market", main.time_in_market);
        evidence.notes.extend(notes);

        Ok(ClaimVerdict {
            claim: ClaimId::TrendFollowing,
            verdict: if improvement >= cfg.drawdown_improvement {
                Verdict::Confirmed
            } else {
                Verdict::Rejected
            },
            evidence,
            details: Some(ClaimDetails::TrendFollowing(TrendFollowingReport { backtests, main })),
        })
    }
}

/// Validate every claim on `prices` with `config`.
///
/// # Example
/// ```rust
/// use blackswans::{
///     generate_regime_switching_prices, validate_claims, SyntheticMarketConfig, ValidationConfig,
/// };
///
/// let prices = generate_regime_switching_prices(&SyntheticMarketConfig {
///     n_days: 3000,
///     ..Default::default()
/// })
/// .unwrap();
/// let summary = validate_claims(&prices, &ValidationConfig::quick()).unwrap();
/// assert_eq!(summary.claims.len(), 4);
/// ```
pub fn validate_claims(
    prices: &PriceSeries,
    config: &ValidationConfig,
) -> BlackSwanResult<ValidationSummary> {
    ClaimValidator::new(config.clone())?.validate(prices)
}

//! # Claim Results Structures
//!
//! Plain, serializable records handed to the report collaborator: one
//! [`ClaimVerdict`] per claim with its headline [`Evidence`] and the detailed
//! tables it was derived from, wrapped in a [`ValidationSummary`].

use crate::backtest::TrendFollowingBacktest;
use crate::bootstrap::{BootstrapValidation, ConfidenceInterval};
use crate::outliers::OutlierStats;
use crate::regimes::{RegimeOutlierCounts, RegimePerformance};
use crate::scenarios::ScenarioResult;
use crate::statistical_tests::{NormalityTests, TestOutcome};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The four claims under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClaimId {
    /// Daily returns are fat-tailed
    FatTails,
    /// A handful of extreme days drive long-run returns
    OutsizedInfluence,
    /// Outliers cluster in downtrends
    RegimeClustering,
    /// Trend following reduces drawdowns
    TrendFollowing,
}

impl ClaimId {
    /// All claims in evaluation order.
    pub const ALL: [ClaimId; 4] = [
        ClaimId::FatTails,
        ClaimId::OutsizedInfluence,
        ClaimId::RegimeClustering,
        ClaimId::TrendFollowing,
    ];

    /// Short machine-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ClaimId::FatTails => "fat_tails",
            ClaimId::OutsizedInfluence => "outsized_influence",
            ClaimId::RegimeClustering => "regime_clustering",
            ClaimId::TrendFollowing => "trend_following",
        }
    }

    /// One-line statement of the claim.
    pub fn statement(&self) -> &'static str {
        match self {
            ClaimId::FatTails => "daily returns are fat-tailed relative to a normal distribution",
            ClaimId::OutsizedInfluence => {
                "missing a few of the best days materially lowers long-run CAGR"
            }
            ClaimId::RegimeClustering => "extreme days occur disproportionately in downtrends",
            ClaimId::TrendFollowing => {
                "a lagged moving-average filter materially reduces drawdowns"
            }
        }
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal state of a claim evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verdict {
    /// Evidence supports the claim
    Confirmed,
    /// Evidence does not support the claim
    Rejected,
    /// No trustworthy evidence could be produced
    Inconclusive,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Confirmed => "confirmed",
            Verdict::Rejected => "rejected",
            Verdict::Inconclusive => "inconclusive",
        })
    }
}

/// Headline numbers behind a verdict.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Evidence {
    /// False when a sub-test failed or a precondition was violated
    pub valid: bool,
    /// Named metrics (deterministic ordering)
    pub metrics: BTreeMap<String, f64>,
    /// Free-text notes, including captured errors
    pub notes: Vec<String>,
}

impl Evidence {
    /// Empty, valid evidence.
    pub fn new() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }

    /// Invalid evidence carrying an error description.
    pub fn invalid(note: impl Into<String>) -> Self {
        Self {
            valid: false,
            metrics: BTreeMap::new(),
            notes: vec![note.into()],
        }
    }

    /// Record a metric.
    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    /// Record a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Metric by name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Normality tests and tail statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FatTailReport {
    /// Kolmogorov-Smirnov and Jarque-Bera results
    pub normality: NormalityTests,
    /// Excess kurtosis of daily returns
    pub excess_kurtosis: f64,
    /// Skewness of daily returns
    pub skewness: f64,
    /// Largest return in sample standard deviations from the mean
    pub max_return_sigma: f64,
    /// Smallest return in sample standard deviations from the mean
    pub min_return_sigma: f64,
    /// Tail thresholds and statistics at the headline quantile
    pub outliers: OutlierStats,
}

/// Bootstrap summary without the raw resample distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapSummary {
    /// Statistic on the observed series
    pub estimate: f64,
    /// Percentile interval
    pub confidence_interval: ConfidenceInterval,
    /// Bootstrap standard error
    pub standard_error: f64,
    /// Bootstrap bias
    pub bias: f64,
    /// Resamples used
    pub resamples: usize,
    /// Resamples that failed
    pub failed_samples: usize,
}

impl From<&BootstrapValidation> for BootstrapSummary {
    fn from(b: &BootstrapValidation) -> Self {
        Self {
            estimate: b.original_estimate,
            confidence_interval: b.confidence_interval,
            standard_error: b.standard_error,
            bias: b.bias,
            resamples: b.bootstrap_estimates.len(),
            failed_samples: b.failed_samples,
        }
    }
}

/// Scenario sweep and bootstrapped CAGR impact.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutsizedInfluenceReport {
    /// One row per best/worst day count
    pub scenarios: Vec<ScenarioResult>,
    /// Best days removed in the bootstrapped statistic
    pub bootstrap_days: usize,
    /// Bootstrap of `cagr(all) - cagr(miss_best)`
    pub impact: BootstrapSummary,
}

/// One (window, quantile) cell of the clustering grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringRow {
    /// Moving-average window
    pub window: usize,
    /// Outlier quantile
    pub quantile: f64,
    /// Outlier and day counts per regime
    pub counts: RegimeOutlierCounts,
    /// Percentage of outliers on Downtrend days
    pub pct_in_downtrend: Option<f64>,
    /// Chi-square clustering test
    pub chi_square: TestOutcome,
    /// Two-proportion z-test
    pub z_test: TestOutcome,
}

impl ClusteringRow {
    /// Both tests valid and significant at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.chi_square.is_significant(alpha) && self.z_test.is_significant(alpha)
    }

    /// Sign of the z statistic, if the z-test is valid.
    pub fn direction(&self) -> Option<f64> {
        self.z_test.result().map(|r| r.test_statistic.signum())
    }
}

/// Clustering grid and headline regime split.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringReport {
    /// Every (window, quantile) combination
    pub rows: Vec<ClusteringRow>,
    /// Combination matching the headline window and quantile
    pub main: Option<ClusteringRow>,
    /// Combinations significant at the configured level
    pub significant_rows: usize,
    /// Combinations with a valid chi-square test
    pub valid_rows: usize,
    /// All valid combinations agree in the sign of the effect
    pub robust: bool,
    /// Downtrend and Uptrend summaries at the headline window
    pub regime_performance: Vec<RegimePerformance>,
}

/// Backtest sweep.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrendFollowingReport {
    /// One backtest per window
    pub backtests: Vec<TrendFollowingBacktest>,
    /// Backtest at the headline window
    pub main: TrendFollowingBacktest,
}

/// Detailed tables behind a verdict.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClaimDetails {
    /// Fat tails
    FatTails(FatTailReport),
    /// Outsized influence
    OutsizedInfluence(OutsizedInfluenceReport),
    /// Regime clustering
    RegimeClustering(ClusteringReport),
    /// Trend following
    TrendFollowing(TrendFollowingReport),
}

/// Verdict, evidence and detail tables of one claim.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClaimVerdict {
    /// Claim evaluated
    pub claim: ClaimId,
    /// Terminal state
    pub verdict: Verdict,
    /// Headline evidence
    pub evidence: Evidence,
    /// Detail tables; absent when the evaluation failed early
    pub details: Option<ClaimDetails>,
}

impl ClaimVerdict {
    /// Inconclusive verdict with the failure recorded as invalid evidence.
    pub fn inconclusive(claim: ClaimId, reason: impl Into<String>) -> Self {
        Self {
            claim,
            verdict: Verdict::Inconclusive,
            evidence: Evidence::invalid(reason),
            details: None,
        }
    }
}

/// Outcome of a full validation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationSummary {
    /// Number of daily returns analysed
    pub observations: usize,
    /// Base date of the return series
    pub start_date: NaiveDate,
    /// Last return date
    pub end_date: NaiveDate,
    /// One verdict per claim, in [`ClaimId::ALL`] order
    pub claims: Vec<ClaimVerdict>,
}

impl ValidationSummary {
    /// Verdict record for a claim.
    pub fn claim(&self, id: ClaimId) -> Option<&ClaimVerdict> {
        self.claims.iter().find(|c| c.claim == id)
    }

    /// Verdict for a claim; `Inconclusive` if it was not evaluated.
    pub fn verdict(&self, id: ClaimId) -> Verdict {
        self.claim(id).map_or(Verdict::Inconclusive, |c| c.verdict)
    }

    /// Number of claims with the given verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        self.claims.iter().filter(|c| c.verdict == verdict).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_builder() {
        let evidence = Evidence::new()
            .with_metric("p_value", 0.01)
            .with_metric("effect", 2.5)
            .with_note("main case");
        assert!(evidence.valid);
        assert_eq!(evidence.metric("p_value"), Some(0.01));
        assert_eq!(evidence.metric("missing"), None);
        // BTreeMap keeps keys sorted
        assert_eq!(evidence.metrics.keys().next().map(String::as_str), Some("effect"));
    }

    #[test]
    fn test_inconclusive_verdict_is_invalid() {
        let v = ClaimVerdict::inconclusive(ClaimId::RegimeClustering, "expected count below 5");
        assert_eq!(v.verdict, Verdict::Inconclusive);
        assert!(!v.evidence.valid);
        assert_eq!(v.evidence.notes, vec!["expected count below 5".to_string()]);
        assert!(v.details.is_none());
    }

    #[test]
    fn test_summary_lookup() {
        let summary = ValidationSummary {
            observations: 10,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            claims: vec![
                ClaimVerdict::inconclusive(ClaimId::FatTails, "short"),
                ClaimVerdict {
                    claim: ClaimId::TrendFollowing,
                    verdict: Verdict::Confirmed,
                    evidence: Evidence::new(),
                    details: None,
                },
            ],
        };
        assert_eq!(summary.verdict(ClaimId::TrendFollowing), Verdict::Confirmed);
        assert_eq!(summary.verdict(ClaimId::OutsizedInfluence), Verdict::Inconclusive);
        assert_eq!(summary.count(Verdict::Inconclusive), 1);
        assert_eq!(ClaimId::FatTails.to_string(), "fat_tails");
        assert_eq!(Verdict::Rejected.to_string(), "rejected");
    }
}

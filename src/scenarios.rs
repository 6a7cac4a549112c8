//! Counterfactual "missed days" scenarios.
//!
//! Neutralized days earn the `cash` return passed by the caller (normally
//! [`CASH`]); the calendar is untouched so every scenario annualizes over the
//! same period as the unmodified series.

use crate::errors::{BlackSwanError, BlackSwanResult};
use crate::math_utils::float_total_cmp;
use crate::performance::cagr;
use crate::series::ReturnSeries;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Return earned on a neutralized day.
pub const CASH: f64 = 0.0;

/// Named scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScenarioKind {
    /// Unmodified returns
    All,
    /// Best days replaced with cash
    MissBest,
    /// Worst days replaced with cash
    MissWorst,
    /// Best and worst days replaced with cash
    MissBoth,
}

impl ScenarioKind {
    /// All scenarios in reporting order.
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::All,
        ScenarioKind::MissBest,
        ScenarioKind::MissWorst,
        ScenarioKind::MissBoth,
    ];

    /// Report name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::All => "all",
            ScenarioKind::MissBest => "miss_best",
            ScenarioKind::MissWorst => "miss_worst",
            ScenarioKind::MissBoth => "miss_both",
        }
    }
}

/// The four scenario series plus the neutralized positions.
#[derive(Debug, Clone)]
pub struct ScenarioReturns {
    /// Unmodified returns
    pub all: ReturnSeries,
    /// Best `best_n` days neutralized
    pub miss_best: ReturnSeries,
    /// Worst `worst_n` days neutralized
    pub miss_worst: ReturnSeries,
    /// Both sets neutralized
    pub miss_both: ReturnSeries,
    /// Indices of the best days, best first
    pub best_indices: Vec<usize>,
    /// Indices of the worst days, worst first
    pub worst_indices: Vec<usize>,
}

impl ScenarioReturns {
    /// Series for a scenario.
    pub fn series(&self, kind: ScenarioKind) -> &ReturnSeries {
        match kind {
            ScenarioKind::All => &self.all,
            ScenarioKind::MissBest => &self.miss_best,
            ScenarioKind::MissWorst => &self.miss_worst,
            ScenarioKind::MissBoth => &self.miss_both,
        }
    }
}

fn validate_day_counts(len: usize, best_n: usize, worst_n: usize) -> BlackSwanResult<()> {
    if best_n + worst_n > len {
        return Err(BlackSwanError::InvalidParameter {
            parameter: "best_n + worst_n".to_string(),
            value: (best_n + worst_n) as f64,
            constraint: format!("<= series length ({})", len),
        });
    }
    Ok(())
}

/// Indices ranked ascending by return; ties keep chronological order.
fn ranked_indices(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| float_total_cmp(&values[a], &values[b]));
    order
}

fn neutralize(values: &[f64], indices: &[usize], cash: f64) -> Vec<f64> {
    let mut out = values.to_vec();
    for &i in indices {
        out[i] = cash;
    }
    out
}

/// Build the `all`, `miss_best`, `miss_worst` and `miss_both` series.
///
/// Fails with `InvalidParameter` when `best_n + worst_n` exceeds the series
/// length, the only way the best and worst sets could overlap.
pub fn scenario_returns(
    returns: &ReturnSeries,
    best_n: usize,
    worst_n: usize,
    cash: f64,
) -> BlackSwanResult<ScenarioReturns> {
    let values = returns.values();
    validate_day_counts(values.len(), best_n, worst_n)?;

    let order = ranked_indices(values);
    let worst_indices: Vec<usize> = order[..worst_n].to_vec();
    let best_indices: Vec<usize> = order[order.len() - best_n..].iter().rev().copied().collect();
    let both: Vec<usize> = best_indices.iter().chain(worst_indices.iter()).copied().collect();

    Ok(ScenarioReturns {
        all: returns.clone(),
        miss_best: returns.with_values(neutralize(values, &best_indices, cash))?,
        miss_worst: returns.with_values(neutralize(values, &worst_indices, cash))?,
        miss_both: returns.with_values(neutralize(values, &both, cash))?,
        best_indices,
        worst_indices,
    })
}

/// CAGR lost by sitting out the `n_days` best days: `cagr(all) - cagr(miss_best)`.
///
/// Cheaper than [`scenario_returns`]; used as the bootstrap statistic.
pub fn miss_best_impact(returns: &ReturnSeries, n_days: usize, cash: f64) -> BlackSwanResult<f64> {
    let values = returns.values();
    validate_day_counts(values.len(), n_days, 0)?;

    let mut order: Vec<usize> = (0..values.len()).collect();
    if n_days > 0 && n_days < values.len() {
        let pivot = values.len() - n_days;
        order.select_nth_unstable_by(pivot, |&a, &b| float_total_cmp(&values[a], &values[b]));
    }
    let best = &order[values.len() - n_days..];

    let missed = returns.with_values(neutralize(values, best, cash))?;
    Ok(cagr(returns)? - cagr(&missed)?)
}

/// Annualized returns of all four scenarios for one day count.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScenarioResult {
    /// Number of best and of worst days neutralized
    pub n_days: usize,
    /// `n_days` as a fraction of all return days
    pub fraction_of_total: f64,
    /// CAGR of the unmodified series
    pub cagr_all: f64,
    /// CAGR without the best days
    pub cagr_miss_best: f64,
    /// CAGR without the worst days
    pub cagr_miss_worst: f64,
    /// CAGR without both
    pub cagr_miss_both: f64,
}

impl ScenarioResult {
    /// CAGR of a named scenario.
    pub fn cagr(&self, kind: ScenarioKind) -> f64 {
        match kind {
            ScenarioKind::All => self.cagr_all,
            ScenarioKind::MissBest => self.cagr_miss_best,
            ScenarioKind::MissWorst => self.cagr_miss_worst,
            ScenarioKind::MissBoth => self.cagr_miss_both,
        }
    }

    /// CAGR given up by missing the best days.
    pub fn impact_miss_best(&self) -> f64 {
        self.cagr_all - self.cagr_miss_best
    }

    /// CAGR gained by missing the worst days.
    pub fn impact_miss_worst(&self) -> f64 {
        self.cagr_miss_worst - self.cagr_all
    }
}

/// Scenario CAGRs with `n_days` best and `n_days` worst days neutralized.
pub fn scenario_result(
    returns: &ReturnSeries,
    n_days: usize,
    cash: f64,
) -> BlackSwanResult<ScenarioResult> {
    let scenarios = scenario_returns(returns, n_days, n_days, cash)?;
    Ok(ScenarioResult {
        n_days,
        fraction_of_total: n_days as f64 / returns.len() as f64,
        cagr_all: cagr(&scenarios.all)?,
        cagr_miss_best: cagr(&scenarios.miss_best)?,
        cagr_miss_worst: cagr(&scenarios.miss_worst)?,
        cagr_miss_both: cagr(&scenarios.miss_both)?,
    })
}

/// One [`ScenarioResult`] per day count.
pub fn scenario_sweep(
    returns: &ReturnSeries,
    day_counts: &[usize],
    cash: f64,
) -> BlackSwanResult<Vec<ScenarioResult>> {
    day_counts
        .iter()
        .map(|&n| scenario_result(returns, n, cash))
        .collect()
}

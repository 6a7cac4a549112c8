//! Annualized performance metrics.
//!
//! CAGR always annualizes over the elapsed calendar time of the series it is
//! given (anchor date to last return date), never over a count of days. Series
//! that neutralize days (scenarios, regime conditioning, cash positions) keep
//! the original calendar, so they share the same denominator as the full series.

use crate::errors::{validate_data_length, BlackSwanError, BlackSwanResult};
use crate::math_utils::{
    calculate_kurtosis, calculate_skewness, mean, sample_std, ZERO_VARIANCE_THRESHOLD,
};
use crate::series::ReturnSeries;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trading days per year used for Sharpe and volatility annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Sum of `ln(1 + r)`, the log of total compounded growth.
pub fn log_growth(values: &[f64]) -> f64 {
    values.iter().map(|r| r.ln_1p()).sum()
}

/// Total compounded return `prod(1 + r) - 1`.
pub fn total_return(values: &[f64]) -> f64 {
    log_growth(values).exp_m1()
}

/// Compound annual growth rate `prod(1 + r)^(1 / years) - 1`.
///
/// `years` is [`ReturnSeries::elapsed_years`]. Compounding is done in log
/// space so long daily series do not lose precision.
pub fn cagr(returns: &ReturnSeries) -> BlackSwanResult<f64> {
    let years = returns.elapsed_years();
    if years <= 0.0 {
        return Err(BlackSwanError::InvalidParameter {
            parameter: "elapsed_years".to_string(),
            value: years,
            constraint: "> 0".to_string(),
        });
    }
    Ok((log_growth(returns.values()) / years).exp_m1())
}

/// Annualized Sharpe ratio.
///
/// Mean daily excess return over `risk_free_rate / 252` divided by the sample
/// standard deviation of daily returns, scaled by `sqrt(252)`. Fails with
/// `DegenerateDistribution` for zero variance.
pub fn sharpe_ratio(values: &[f64], risk_free_rate: f64) -> BlackSwanResult<f64> {
    validate_data_length(values, 2, "sharpe_ratio")?;

    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = values.iter().map(|r| r - daily_rf).collect();
    let std_dev = sample_std(&excess);

    if std_dev * std_dev <= ZERO_VARIANCE_THRESHOLD {
        return Err(BlackSwanError::DegenerateDistribution {
            statistic: "sharpe_ratio".to_string(),
            reason: "daily returns have zero variance".to_string(),
        });
    }

    Ok(mean(&excess) / std_dev * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Maximum drawdown: the minimum of `wealth / running_peak - 1`.
///
/// Wealth is the cumulative product of `1 + r`; the result is `<= 0`.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut wealth = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;

    for r in values {
        wealth *= 1.0 + r;
        peak = peak.max(wealth);
        worst = worst.min(wealth / peak - 1.0);
    }

    worst
}

/// Annualized volatility: sample standard deviation times `sqrt(252)`.
pub fn annualized_volatility(values: &[f64]) -> BlackSwanResult<f64> {
    validate_data_length(values, 2, "annualized_volatility")?;
    Ok(sample_std(values) * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Excess kurtosis (`m4 / m2^2 - 3`); about 0 for Gaussian data.
pub fn excess_kurtosis(values: &[f64]) -> BlackSwanResult<f64> {
    validate_data_length(values, 2, "excess_kurtosis")?;
    calculate_kurtosis(values)
        .map(|k| k - 3.0)
        .ok_or_else(|| BlackSwanError::DegenerateDistribution {
            statistic: "excess_kurtosis".to_string(),
            reason: "returns have zero variance".to_string(),
        })
}

/// Sample skewness (`m3 / m2^1.5`).
pub fn skewness(values: &[f64]) -> BlackSwanResult<f64> {
    validate_data_length(values, 2, "skewness")?;
    calculate_skewness(values).ok_or_else(|| BlackSwanError::DegenerateDistribution {
        statistic: "skewness".to_string(),
        reason: "returns have zero variance".to_string(),
    })
}

/// CAGR, Sharpe, drawdown and volatility of one return stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerformanceSummary {
    /// Compound annual growth rate
    pub cagr: f64,
    /// Total compounded return over the period
    pub total_return: f64,
    /// Annualized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Maximum drawdown (negative fraction)
    pub max_drawdown: f64,
    /// Annualized volatility
    pub volatility: f64,
}

impl PerformanceSummary {
    /// Compute every metric for `returns`.
    pub fn from_returns(returns: &ReturnSeries, risk_free_rate: f64) -> BlackSwanResult<Self> {
        let values = returns.values();
        Ok(Self {
            cagr: cagr(returns)?,
            total_return: total_return(values),
            sharpe_ratio: sharpe_ratio(values, risk_free_rate)?,
            max_drawdown: max_drawdown(values),
            volatility: annualized_volatility(values)?,
        })
    }
}

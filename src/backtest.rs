//! Moving-average trend-following backtest.
//!
//! The strategy holds the asset on days that follow an Uptrend close and
//! holds cash otherwise. The return earned on date `t` is decided by the label
//! of date `t - 1`, which itself only uses prices up to `t - 1` and a moving
//! average of prices up to `t - 2`. Buy-and-hold is measured over exactly the
//! same period, starting at the first date with a defined label.

use crate::errors::BlackSwanResult;
use crate::performance::PerformanceSummary;
use crate::regimes::{moving_average_regime, RegimeLabel};
use crate::series::{PriceSeries, ReturnSeries};
use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Daily returns of both legs over the common backtest period.
#[derive(Debug, Clone)]
pub struct StrategyReturns {
    /// Moving-average window
    pub window: usize,
    /// Buy-and-hold returns
    pub buy_hold: ReturnSeries,
    /// Strategy returns (cash when out of the market)
    pub strategy: ReturnSeries,
    /// Whether the strategy held the asset on each return date
    pub invested: Vec<bool>,
}

impl StrategyReturns {
    /// Fraction of days invested.
    pub fn time_in_market(&self) -> f64 {
        self.invested.iter().filter(|&&i| i).count() as f64 / self.invested.len() as f64
    }
}

/// Build buy-and-hold and strategy return series for a lagged `window`-day average.
///
/// Requires more than `window + 1` prices so the period holds at least one
/// return.
pub fn trend_following_returns(
    prices: &PriceSeries,
    window: usize,
    cash: f64,
) -> BlackSwanResult<StrategyReturns> {
    let regimes = moving_average_regime(prices, window)?;
    let returns = prices.daily_returns()?;

    // returns[i] runs from price date i to i + 1; labels[window] is the first defined
    let buy_hold = returns.tail_from(window)?;
    let invested: Vec<bool> = regimes.labels[window..returns.len()]
        .iter()
        .map(|&l| l == RegimeLabel::Uptrend)
        .collect();
    let values = buy_hold
        .values()
        .iter()
        .zip(&invested)
        .map(|(&r, &held)| if held { r } else { cash })
        .collect();
    let strategy = buy_hold.with_values(values)?;

    Ok(StrategyReturns {
        window,
        buy_hold,
        strategy,
        invested,
    })
}

/// Performance of both legs for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrendFollowingBacktest {
    /// Moving-average window
    pub window: usize,
    /// Base date of the backtest period
    pub start_date: NaiveDate,
    /// Last return date
    pub end_date: NaiveDate,
    /// Fraction of days the strategy held the asset
    pub time_in_market: f64,
    /// Buy-and-hold metrics
    pub buy_hold: PerformanceSummary,
    /// Strategy metrics
    pub strategy: PerformanceSummary,
}

impl TrendFollowingBacktest {
    /// Drawdown reduction in fractional points: strategy minus buy-and-hold.
    ///
    /// Positive when the strategy's drawdown is shallower.
    pub fn drawdown_improvement(&self) -> f64 {
        self.strategy.max_drawdown - self.buy_hold.max_drawdown
    }
}

/// Run the backtest for one window.
///
/// Fails with `DegenerateDistribution` if either leg has zero variance (for
/// instance, a strategy that never enters the market).
pub fn trend_following_backtest(
    prices: &PriceSeries,
    window: usize,
    risk_free_rate: f64,
    cash: f64,
) -> BlackSwanResult<TrendFollowingBacktest> {
    let legs = trend_following_returns(prices, window, cash)?;
    log::debug!(
        "backtest window {}: {} days, {:.1}% invested",
        window,
        legs.buy_hold.len(),
        100.0 * legs.time_in_market()
    );

    Ok(TrendFollowingBacktest {
        window,
        start_date: legs.buy_hold.anchor(),
        end_date: legs.buy_hold.last_date(),
        time_in_market: legs.time_in_market(),
        buy_hold: PerformanceSummary::from_returns(&legs.buy_hold, risk_free_rate)?,
        strategy: PerformanceSummary::from_returns(&legs.strategy, risk_free_rate)?,
    })
}

/// One backtest per window.
pub fn backtest_sweep(
    prices: &PriceSeries,
    windows: &[usize],
    risk_free_rate: f64,
    cash: f64,
) -> BlackSwanResult<Vec<TrendFollowingBacktest>> {
    windows
        .iter()
        .map(|&w| trend_following_backtest(prices, w, risk_free_rate, cash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BlackSwanError;
    use crate::generators::weekday_calendar;
    use crate::scenarios::CASH;
    use assert_approx_eq::assert_approx_eq;

    fn price_series(values: Vec<f64>) -> PriceSeries {
        let dates = weekday_calendar(NaiveDate::from_ymd_opt(2000, 1, 3).unwrap(), values.len());
        PriceSeries::from_parts(dates, values).unwrap()
    }

    /// Slow rises of 0.1% a day followed by sharp falls of 0.4% a day.
    fn sawtooth(cycles: usize) -> PriceSeries {
        let mut p = 100.0;
        let mut values = vec![p];
        for _ in 0..cycles {
            for _ in 0..600 {
                p *= 1.001;
                values.push(p);
            }
            for _ in 0..200 {
                p *= 0.996;
                values.push(p);
            }
        }
        price_series(values)
    }

    #[test]
    fn test_jump_day_uses_previous_label() {
        // Flat prices, then a 50% jump. The jump day's own close is above the
        // average, but the position was set the evening before at a tie.
        let mut values = vec![100.0; 10];
        values.push(150.0);
        values.extend([151.0, 150.0, 152.0]);
        let legs = trend_following_returns(&price_series(values), 5, CASH).unwrap();

        // returns from price date 5 onward; the jump is return index 9 -> local 4
        assert_eq!(legs.buy_hold.len(), 8);
        assert_approx_eq!(legs.buy_hold.values()[4], 0.5);
        assert!(!legs.invested[4]);
        assert_eq!(legs.strategy.values()[4], CASH);
        // Next day the label from the jump close is Uptrend
        assert!(legs.invested[5]);
        assert_approx_eq!(legs.strategy.values()[5], 151.0 / 150.0 - 1.0);
    }

    #[test]
    fn test_legs_share_calendar() {
        let legs = trend_following_returns(&sawtooth(1), 50, CASH).unwrap();
        assert_eq!(legs.buy_hold.anchor(), legs.strategy.anchor());
        assert_eq!(legs.buy_hold.dates(), legs.strategy.dates());
        assert_eq!(legs.invested.len(), legs.buy_hold.len());
        assert_eq!(legs.buy_hold.len(), 800 - 50);
    }

    #[test]
    fn test_trend_following_cuts_drawdown() {
        let result = trend_following_backtest(&sawtooth(3), 50, 0.0, CASH).unwrap();
        assert!(result.buy_hold.max_drawdown < -0.5);
        assert!(result.strategy.max_drawdown > -0.15);
        assert!(result.drawdown_improvement() > 0.35);
        assert!(result.time_in_market > 0.5 && result.time_in_market < 1.0);
    }

    #[test]
    fn test_sweep_rows_follow_windows() {
        let rows = backtest_sweep(&sawtooth(2), &[20, 50, 100], 0.0, CASH).unwrap();
        assert_eq!(rows.iter().map(|r| r.window).collect::<Vec<_>>(), vec![20, 50, 100]);
        for row in &rows {
            assert!(row.drawdown_improvement() > 0.0);
            assert!(row.start_date < row.end_date);
        }
    }

    #[test]
    fn test_series_too_short_for_window() {
        let prices = price_series(vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert!(matches!(
            trend_following_returns(&prices, 5, CASH),
            Err(BlackSwanError::InsufficientData { .. })
        ));
        assert!(matches!(
            trend_following_returns(&prices, 10, CASH),
            Err(BlackSwanError::InsufficientData { .. })
        ));
    }
}

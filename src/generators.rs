//! Synthetic price generators for testing and validation.
//!
//! ## Available Generators
//!
//! - **Regime switching**: a two-state Markov market alternating long, calm
//!   bull phases with shorter, volatile bear phases. Shocks are unit-variance
//!   Student-t draws, so the series is fat-tailed and its extreme days
//!   concentrate in bear phases.
//! - **Gaussian**: i.i.d. normal returns, the null case for every claim.
//!
//! Both produce prices on a Monday-to-Friday calendar and are reproducible from
//! a seed.

use crate::errors::{validate_min_count, validate_parameter, BlackSwanError, BlackSwanResult};
use crate::secure_rng::SecureRng;
use crate::series::PriceSeries;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Floor on a single day's simple return
const MIN_DAILY_RETURN: f64 = -0.9;

/// `n` consecutive weekdays starting at the first weekday on or after `start`.
pub fn weekday_calendar(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut day = start;
    while dates.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day + Duration::days(1);
    }
    dates
}

/// Return process of one market state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimeParams {
    /// Mean daily return
    pub drift: f64,
    /// Daily volatility
    pub volatility: f64,
    /// Student-t degrees of freedom of the shocks; 0 means Gaussian shocks
    pub tail_df: u32,
    /// Expected length of a stay in this state, in days
    pub mean_duration: f64,
}

impl RegimeParams {
    fn validate(&self, name: &str) -> BlackSwanResult<()> {
        validate_parameter(self.drift, -0.1, 0.1, &format!("{}.drift", name))?;
        validate_parameter(self.volatility, 0.0, 0.5, &format!("{}.volatility", name))?;
        validate_parameter(self.mean_duration, 1.0, f64::MAX, &format!("{}.mean_duration", name))?;
        if self.tail_df != 0 && self.tail_df <= 2 {
            return Err(BlackSwanError::InvalidParameter {
                parameter: format!("{}.tail_df", name),
                value: self.tail_df as f64,
                constraint: "0 (Gaussian) or > 2".to_string(),
            });
        }
        Ok(())
    }

    fn draw(&self, rng: &mut SecureRng) -> f64 {
        let shock = if self.tail_df == 0 {
            rng.standard_normal()
        } else {
            rng.unit_student_t(self.tail_df)
        };
        (self.drift + self.volatility * shock).max(MIN_DAILY_RETURN)
    }
}

/// Configuration of the regime-switching market.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyntheticMarketConfig {
    /// Number of daily returns (the series holds one more price)
    pub n_days: usize,
    /// Date of the first price; moved forward to a weekday if needed
    pub start_date: NaiveDate,
    /// First price
    pub initial_price: f64,
    /// Calm, rising state
    pub bull: RegimeParams,
    /// Volatile, falling state
    pub bear: RegimeParams,
    /// Random seed for reproducible generation
    pub seed: Option<u64>,
}

impl Default for SyntheticMarketConfig {
    fn default() -> Self {
        Self {
            // about 47 years of trading days
            n_days: 12_000,
            start_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
            initial_price: 100.0,
            bull: RegimeParams {
                drift: 0.0006,
                volatility: 0.009,
                tail_df: 5,
                mean_duration: 750.0,
            },
            bear: RegimeParams {
                drift: -0.0015,
                volatility: 0.022,
                tail_df: 4,
                mean_duration: 150.0,
            },
            seed: Some(42),
        }
    }
}

/// Prices plus the hidden state that generated each return.
#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    /// Generated prices
    pub prices: PriceSeries,
    /// `true` where the return ending on that price date was drawn in the bear state
    pub bear_days: Vec<bool>,
}

/// Generate a regime-switching market together with its hidden states.
pub fn generate_synthetic_market(
    config: &SyntheticMarketConfig,
) -> BlackSwanResult<SyntheticMarket> {
    validate_min_count(config.n_days, 1, "n_days")?;
    validate_parameter(config.initial_price, f64::MIN_POSITIVE, f64::MAX, "initial_price")?;
    config.bull.validate("bull")?;
    config.bear.validate("bear")?;

    let mut rng = match config.seed {
        Some(seed) => SecureRng::with_seed(seed),
        None => SecureRng::new(),
    };

    let mut price = config.initial_price;
    let mut prices = Vec::with_capacity(config.n_days + 1);
    let mut bear_days = Vec::with_capacity(config.n_days);
    prices.push(price);

    let mut in_bear = false;
    for _ in 0..config.n_days {
        let state = if in_bear { &config.bear } else { &config.bull };
        price *= 1.0 + state.draw(&mut rng);
        prices.push(price);
        bear_days.push(in_bear);

        if rng.bool(1.0 / state.mean_duration) {
            in_bear = !in_bear;
        }
    }

    let dates = weekday_calendar(config.start_date, prices.len());
    Ok(SyntheticMarket {
        prices: PriceSeries::from_parts(dates, prices)?,
        bear_days,
    })
}

/// Generate regime-switching prices.
pub fn generate_regime_switching_prices(
    config: &SyntheticMarketConfig,
) -> BlackSwanResult<PriceSeries> {
    generate_synthetic_market(config).map(|m| m.prices)
}

/// Generate prices from i.i.d. Gaussian daily returns.
pub fn generate_gaussian_prices(
    n_days: usize,
    drift: f64,
    volatility: f64,
    seed: Option<u64>,
) -> BlackSwanResult<PriceSeries> {
    let regime = RegimeParams {
        drift,
        volatility,
        tail_df: 0,
        mean_duration: f64::MAX,
    };
    let config = SyntheticMarketConfig {
        n_days,
        bull: regime,
        bear: regime,
        seed,
        ..Default::default()
    };
    generate_regime_switching_prices(&config)
}

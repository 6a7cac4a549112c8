//! Price and return series.
//!
//! [`PriceSeries`] enforces the contract expected from the price-history
//! collaborator: strictly increasing dates, finite positive prices. A
//! [`ReturnSeries`] is derived from it with simple (arithmetic) returns and
//! remembers the date of the base price so that the compounding period, and
//! therefore every annualization, spans the full calendar interval.

use crate::errors::{
    validate_all_finite, validate_data_length, BlackSwanError, BlackSwanResult,
};
use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calendar days per year used to convert elapsed time into years.
pub const DAYS_PER_YEAR: f64 = 365.25;

fn validate_strictly_increasing(dates: &[NaiveDate], name: &str) -> BlackSwanResult<()> {
    if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
        return Err(BlackSwanError::InvalidParameter {
            parameter: format!("{}[{}]", name, i + 1),
            value: (i + 1) as f64,
            constraint: "dates strictly increasing without duplicates".to_string(),
        });
    }
    Ok(())
}

/// Ordered `(date, price)` observations. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPriceSeries"))]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from `(date, price)` pairs.
    ///
    /// Fails with `InvalidParameter` on an empty input, unordered or duplicate
    /// dates, or a non-finite or non-positive price.
    pub fn new(points: Vec<(NaiveDate, f64)>) -> BlackSwanResult<Self> {
        let (dates, prices) = points.into_iter().unzip();
        Self::from_parts(dates, prices)
    }

    /// Build a series from parallel date and price vectors.
    pub fn from_parts(dates: Vec<NaiveDate>, prices: Vec<f64>) -> BlackSwanResult<Self> {
        if dates.len() != prices.len() {
            return Err(BlackSwanError::InvalidParameter {
                parameter: "prices.len".to_string(),
                value: prices.len() as f64,
                constraint: format!("equal to dates.len ({})", dates.len()),
            });
        }
        if dates.is_empty() {
            return Err(BlackSwanError::InvalidParameter {
                parameter: "prices.len".to_string(),
                value: 0.0,
                constraint: "at least one observation".to_string(),
            });
        }
        validate_strictly_increasing(&dates, "dates")?;
        validate_all_finite(&prices, "prices")?;
        if let Some((i, &price)) = prices.iter().enumerate().find(|(_, p)| **p <= 0.0) {
            return Err(BlackSwanError::InvalidParameter {
                parameter: format!("prices[{}]", i),
                value: price,
                constraint: "> 0".to_string(),
            });
        }

        Ok(Self { dates, prices })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Always false for a constructed series; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Price levels.
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// First observation date.
    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last observation date.
    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Iterate over `(date, price)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.prices.iter().copied())
    }

    /// Restrict the series to the inclusive date range `[start, end]`.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> BlackSwanResult<Self> {
        let (dates, prices): (Vec<_>, Vec<_>) = self
            .iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .unzip();
        if dates.is_empty() {
            return Err(BlackSwanError::InsufficientData {
                operation: format!("slice_dates({}..={})", start, end),
                required: 1,
                actual: 0,
            });
        }
        Ok(Self { dates, prices })
    }

    /// Simple daily returns, see [`compute_daily_returns`].
    pub fn daily_returns(&self) -> BlackSwanResult<ReturnSeries> {
        compute_daily_returns(self)
    }
}

/// Convert prices into simple returns `(p_t - p_{t-1}) / p_{t-1}`.
///
/// The result has one fewer observation than the input; its anchor date is
/// the first price date. Fails with `InsufficientData` for fewer than two
/// prices.
pub fn compute_daily_returns(prices: &PriceSeries) -> BlackSwanResult<ReturnSeries> {
    validate_data_length(prices.prices(), 2, "daily_returns")?;

    let values: Vec<f64> = prices
        .prices()
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    Ok(ReturnSeries {
        anchor: prices.first_date(),
        dates: prices.dates()[1..].to_vec(),
        values,
    })
}

/// Ordered `(date, return)` observations plus the base date of the period.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawReturnSeries"))]
pub struct ReturnSeries {
    anchor: NaiveDate,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Build a return series directly.
    ///
    /// `anchor` is the date of the base price the first return is measured
    /// from and must precede `dates[0]`. Returns must be finite and above -1.
    pub fn new(
        anchor: NaiveDate,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> BlackSwanResult<Self> {
        validate_data_length(&values, 1, "return_series")?;
        if dates.len() != values.len() {
            return Err(BlackSwanError::InvalidParameter {
                parameter: "values.len".to_string(),
                value: values.len() as f64,
                constraint: format!("equal to dates.len ({})", dates.len()),
            });
        }
        if anchor >= dates[0] {
            return Err(BlackSwanError::InvalidParameter {
                parameter: "anchor".to_string(),
                value: 0.0,
                constraint: format!("anchor {} before first return date {}", anchor, dates[0]),
            });
        }
        validate_strictly_increasing(&dates, "dates")?;
        Self::validate_values(&values)?;

        Ok(Self {
            anchor,
            dates,
            values,
        })
    }

    fn validate_values(values: &[f64]) -> BlackSwanResult<()> {
        validate_all_finite(values, "returns")?;
        if let Some((i, &r)) = values.iter().enumerate().find(|(_, r)| **r <= -1.0) {
            return Err(BlackSwanError::InvalidParameter {
                parameter: format!("returns[{}]", i),
                value: r,
                constraint: "> -1".to_string(),
            });
        }
        Ok(())
    }

    /// Same calendar, different values. Used for scenario, regime-conditioned
    /// and resampled series so they keep the original elapsed time.
    pub fn with_values(&self, values: Vec<f64>) -> BlackSwanResult<Self> {
        if values.len() != self.values.len() {
            return Err(BlackSwanError::InvalidParameter {
                parameter: "values.len".to_string(),
                value: values.len() as f64,
                constraint: format!("equal to series length ({})", self.values.len()),
            });
        }
        Self::validate_values(&values)?;
        Ok(Self {
            anchor: self.anchor,
            dates: self.dates.clone(),
            values,
        })
    }

    /// Observations from `start` onward. The anchor becomes the date of the
    /// observation just before `start`.
    pub fn tail_from(&self, start: usize) -> BlackSwanResult<Self> {
        if start >= self.values.len() {
            return Err(BlackSwanError::InsufficientData {
                operation: "tail_from".to_string(),
                required: start + 1,
                actual: self.values.len(),
            });
        }
        let anchor = if start == 0 {
            self.anchor
        } else {
            self.dates[start - 1]
        };
        Ok(Self {
            anchor,
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        })
    }

    /// Date of the base price of the period.
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Return dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of returns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed series; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Date of the last return.
    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Iterate over `(date, return)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Calendar years from the anchor to the last return date.
    pub fn elapsed_years(&self) -> f64 {
        (self.last_date() - self.anchor).num_days() as f64 / DAYS_PER_YEAR
    }
}

/// Unchecked wire form; deserialized series go through the constructors.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawPriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = BlackSwanError;

    fn try_from(raw: RawPriceSeries) -> BlackSwanResult<Self> {
        Self::from_parts(raw.dates, raw.prices)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawReturnSeries {
    anchor: NaiveDate,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawReturnSeries> for ReturnSeries {
    type Error = BlackSwanError;

    fn try_from(raw: RawReturnSeries) -> BlackSwanResult<Self> {
        Self::new(raw.anchor, raw.dates, raw.values)
    }
}

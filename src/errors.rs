//! Error types and validation functions for tail and regime analysis.
//!
//! Every fallible operation in the crate returns [`BlackSwanResult`]. Parameter
//! and data-sufficiency errors are raised at the call boundary; statistical
//! validity problems are raised by the individual test that detects them so the
//! orchestrator can record them per claim instead of aborting.

use thiserror::Error;

/// Error taxonomy for the analysis engine.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BlackSwanError {
    /// Malformed configuration or input that violates the series contract.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Offending value (indices and counts are reported as floats)
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Series too short for the requested operation.
    #[error("Insufficient data for {operation}: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Operation that needed the data
        operation: String,
        /// Minimum required data points
        required: usize,
        /// Actual number of data points provided
        actual: usize,
    },

    /// Zero-variance input makes a ratio-based statistic undefined.
    #[error("Degenerate distribution: {statistic} is undefined ({reason})")]
    DegenerateDistribution {
        /// Statistic that could not be computed
        statistic: String,
        /// Why the distribution is degenerate
        reason: String,
    },

    /// A statistical precondition is violated; the p-value would not be trustworthy.
    #[error("Statistical test {test_name} is not valid: {reason}")]
    StatisticalTestError {
        /// Name of the statistical test
        test_name: String,
        /// Violated precondition
        reason: String,
    },
}

/// Result type for analysis operations.
pub type BlackSwanResult<T> = Result<T, BlackSwanError>;

impl BlackSwanError {
    /// Short machine-readable name of the error kind, used in evidence records.
    pub fn kind(&self) -> &'static str {
        match self {
            BlackSwanError::InvalidParameter { .. } => "invalid_parameter",
            BlackSwanError::InsufficientData { .. } => "insufficient_data",
            BlackSwanError::DegenerateDistribution { .. } => "degenerate_distribution",
            BlackSwanError::StatisticalTestError { .. } => "statistical_test_error",
        }
    }
}

/// Validates that a series has at least `min_required` observations.
///
/// # Example
/// ```rust
/// use blackswans::errors::validate_data_length;
///
/// let data = vec![1.0, 2.0, 3.0];
/// assert!(validate_data_length(&data, 2, "test").is_ok());
/// assert!(validate_data_length(&data, 5, "test").is_err());
/// ```
pub fn validate_data_length<T>(
    data: &[T],
    min_required: usize,
    operation: &str,
) -> BlackSwanResult<()> {
    if data.len() < min_required {
        return Err(BlackSwanError::InsufficientData {
            operation: operation.to_string(),
            required: min_required,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Validates that a parameter lies in the closed range `[min, max]`.
///
/// # Example
/// ```rust
/// use blackswans::errors::validate_parameter;
///
/// assert!(validate_parameter(0.5, 0.0, 1.0, "rate").is_ok());
/// assert!(validate_parameter(1.5, 0.0, 1.0, "rate").is_err());
/// ```
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> BlackSwanResult<()> {
    if value.is_nan() {
        return Err(BlackSwanError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        return Err(BlackSwanError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        });
    }

    Ok(())
}

/// Validates that a probability-like parameter lies strictly inside `(0, 1)`.
///
/// Used for quantiles, confidence levels and significance thresholds.
pub fn validate_open_unit_interval(value: f64, name: &str) -> BlackSwanResult<()> {
    if value.is_nan() || value <= 0.0 || value >= 1.0 {
        return Err(BlackSwanError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "(0, 1) exclusive".to_string(),
        });
    }
    Ok(())
}

/// Validates that a count parameter is at least `min`.
pub fn validate_min_count(value: usize, min: usize, name: &str) -> BlackSwanResult<()> {
    if value < min {
        return Err(BlackSwanError::InvalidParameter {
            parameter: name.to_string(),
            value: value as f64,
            constraint: format!(">= {}", min),
        });
    }
    Ok(())
}

/// Validates that every value in a slice is finite.
///
/// Returns on the first NaN or infinity, reporting its index.
///
/// # Example
/// ```rust
/// use blackswans::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0], "prices").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN], "prices").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str) -> BlackSwanResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(BlackSwanError::InvalidParameter {
            parameter: format!("{}[{}]", name, i),
            value,
            constraint: "finite value".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_data_length_insufficient() {
        let data = vec![1.0, 2.0];
        let result = validate_data_length(&data, 5, "daily_returns");

        match result {
            Err(BlackSwanError::InsufficientData {
                operation,
                required,
                actual,
            }) => {
                assert_eq!(operation, "daily_returns");
                assert_eq!(required, 5);
                assert_eq!(actual, 2);
            }
            _ => panic!("Expected InsufficientData error"),
        }
    }

    #[test]
    fn test_validate_data_length_exact_minimum() {
        let data = vec![1.0, 2.0, 3.0];
        assert!(validate_data_length(&data, 3, "test").is_ok());
    }

    #[test]
    fn test_validate_parameter_out_of_range() {
        match validate_parameter(1.5, 0.0, 1.0, "risk_free_rate") {
            Err(BlackSwanError::InvalidParameter {
                parameter,
                value,
                constraint,
            }) => {
                assert_eq!(parameter, "risk_free_rate");
                assert_eq!(value, 1.5);
                assert_eq!(constraint, "[0, 1]");
            }
            _ => panic!("Expected InvalidParameter error"),
        }
        assert!(validate_parameter(0.0, 0.0, 1.0, "test").is_ok());
        assert!(validate_parameter(1.0, 0.0, 1.0, "test").is_ok());
        assert!(validate_parameter(f64::NAN, 0.0, 1.0, "test").is_err());
    }

    #[test]
    fn test_open_unit_interval_excludes_bounds() {
        assert!(validate_open_unit_interval(0.99, "quantile").is_ok());
        assert!(validate_open_unit_interval(0.0, "quantile").is_err());
        assert!(validate_open_unit_interval(1.0, "quantile").is_err());
        assert!(validate_open_unit_interval(-0.1, "quantile").is_err());
        assert!(validate_open_unit_interval(f64::NAN, "quantile").is_err());
    }

    #[test]
    fn test_validate_all_finite_reports_index() {
        let err = validate_all_finite(&[1.0, 2.0, f64::INFINITY], "prices").unwrap_err();
        match err {
            BlackSwanError::InvalidParameter { parameter, .. } => {
                assert_eq!(parameter, "prices[2]");
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_error_kind_names() {
        let err = BlackSwanError::StatisticalTestError {
            test_name: "chi_square".to_string(),
            reason: "expected count below 5".to_string(),
        };
        assert_eq!(err.kind(), "statistical_test_error");
        assert!(err.to_string().contains("chi_square"));
    }
}

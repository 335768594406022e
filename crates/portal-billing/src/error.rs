//! Error types for billing parsing
//!
//! The resolvers themselves are total; only parsing stored configuration
//! values and recording hours can fail.

/// Billing error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BillingError {
    /// Payment schedule string not recognised
    #[error("unknown payment schedule: '{0}' (expected '1st' or '15th')")]
    UnknownSchedule(String),

    /// Retainer type string not recognised
    #[error("unknown retainer type: '{0}'")]
    UnknownRetainerType(String),

    /// Hours must be finite and non-negative
    #[error("invalid hours for {field}: {value}")]
    NegativeHours {
        /// Which quantity
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Result alias for billing operations
pub type BillingResult<T> = Result<T, BillingError>;

/// Reject negative or non-finite hour values
///
/// # Errors
/// [`BillingError::NegativeHours`] naming `field`.
pub fn check_hours(field: &'static str, value: f64) -> BillingResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(BillingError::NegativeHours { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_hours_accepts_zero_and_positive() {
        assert_eq!(check_hours("used", 0.0), Ok(0.0));
        assert_eq!(check_hours("used", 12.5), Ok(12.5));
    }

    #[test]
    fn check_hours_rejects_negative_and_nan() {
        assert!(matches!(
            check_hours("allocated", -1.0),
            Err(BillingError::NegativeHours { field: "allocated", .. })
        ));
        assert!(check_hours("used", f64::NAN).is_err());
        assert!(check_hours("used", f64::INFINITY).is_err());
    }

    #[test]
    fn messages_name_the_input() {
        let err = BillingError::UnknownSchedule("30th".to_string());
        assert!(err.to_string().contains("30th"));
    }
}

//! Portal Billing - retainer cycles and hour usage
//!
//! Pure, side-effect-free helpers used by dashboards and timesheets:
//! - Resolves the billing cycle containing a date for a payment schedule
//! - Classifies hour usage into green / yellow / red
//! - Sums logged hours per cycle for a retainer
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portal_billing::{
//!     classify_hour_usage, resolve_billing_period, HealthStatus, PaymentSchedule,
//! };
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let cycle = resolve_billing_period(date, Some(PaymentSchedule::Fifteenth));
//! assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2023, 12, 15).unwrap());
//!
//! assert_eq!(classify_hour_usage(31.0, 40.0).status, HealthStatus::Yellow);
//! ```

#![warn(unreachable_pub)]

pub mod cycle;
pub mod error;
pub mod retainer;
pub mod usage;

// Re-exports for convenience
pub use cycle::{cycles_in_range, resolve_billing_period, BillingCycle, PaymentSchedule};
pub use error::{BillingError, BillingResult};
pub use retainer::{hours_in_cycle, RetainerState, RetainerType, TimeEntry};
pub use usage::{
    classify_hour_usage, HealthStatus, HourStatus, RED_REMAINING_HOURS, YELLOW_USED_RATIO,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

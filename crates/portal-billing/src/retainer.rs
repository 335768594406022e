//! Retainer state
//!
//! Ties a client's retainer configuration to the cycle and usage
//! resolvers.

use crate::cycle::{resolve_billing_period, BillingCycle, PaymentSchedule};
use crate::error::{check_hours, BillingError, BillingResult};
use crate::usage::{classify_hour_usage, HourStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Billing arrangement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetainerType {
    /// No hour cap
    Unlimited,
    /// Capped hours per cycle
    #[default]
    Hourly,
    /// Single fixed-scope engagement
    OneTime,
}

impl RetainerType {
    /// Stored name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlimited => "unlimited",
            Self::Hourly => "hourly",
            Self::OneTime => "one_time",
        }
    }

    /// Whether hours are capped per cycle
    #[inline]
    #[must_use]
    pub fn is_capped(&self) -> bool {
        matches!(self, Self::Hourly)
    }
}

impl fmt::Display for RetainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetainerType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unlimited" => Ok(Self::Unlimited),
            "hourly" => Ok(Self::Hourly),
            "one_time" | "one-time" | "onetime" => Ok(Self::OneTime),
            _ => Err(BillingError::UnknownRetainerType(s.to_string())),
        }
    }
}

/// Logged time, reduced to what billing needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Day the work was done
    pub date: NaiveDate,
    /// Hours worked
    pub hours: f64,
}

impl TimeEntry {
    /// Create new entry
    ///
    /// # Errors
    /// [`BillingError::NegativeHours`] for negative or non-finite hours.
    pub fn new(date: NaiveDate, hours: f64) -> BillingResult<Self> {
        Ok(Self {
            date,
            hours: check_hours("hours", hours)?,
        })
    }
}

/// Sum of hours logged inside `cycle`
#[must_use]
pub fn hours_in_cycle<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    cycle: &BillingCycle,
) -> f64 {
    entries
        .into_iter()
        .filter(|e| cycle.contains(e.date))
        .map(|e| e.hours)
        .sum()
}

/// A client's retainer configuration and current usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainerState {
    /// Arrangement
    pub retainer_type: RetainerType,
    /// Hours per cycle; zero means no cap
    pub hours_allocated: f64,
    /// Hours used in the current cycle
    pub hours_used: f64,
    /// Cycle anchor; unset means calendar month
    pub payment_schedule: Option<PaymentSchedule>,
}

impl RetainerState {
    /// Create state with no hours
    #[inline]
    #[must_use]
    pub fn new(retainer_type: RetainerType) -> Self {
        Self {
            retainer_type,
            hours_allocated: 0.0,
            hours_used: 0.0,
            payment_schedule: None,
        }
    }

    /// With allocation and usage
    ///
    /// # Errors
    /// [`BillingError::NegativeHours`] for negative or non-finite values.
    pub fn with_hours(mut self, allocated: f64, used: f64) -> BillingResult<Self> {
        self.hours_allocated = check_hours("hours_allocated", allocated)?;
        self.hours_used = check_hours("hours_used", used)?;
        Ok(self)
    }

    /// With payment schedule
    #[inline]
    #[must_use]
    pub fn with_schedule(mut self, schedule: PaymentSchedule) -> Self {
        self.payment_schedule = Some(schedule);
        self
    }

    /// Cycle containing `today`
    #[must_use]
    pub fn current_cycle(&self, today: NaiveDate) -> BillingCycle {
        resolve_billing_period(today, self.payment_schedule)
    }

    /// Recompute `hours_used` from `entries` in the cycle containing `today`
    #[must_use]
    pub fn with_usage_from<'a>(
        mut self,
        entries: impl IntoIterator<Item = &'a TimeEntry>,
        today: NaiveDate,
    ) -> Self {
        let cycle = self.current_cycle(today);
        self.hours_used = hours_in_cycle(entries, &cycle);
        self
    }

    /// Usage health; uncapped arrangements are always green
    #[must_use]
    pub fn hour_status(&self) -> HourStatus {
        let allocated = if self.retainer_type.is_capped() {
            self.hours_allocated
        } else {
            0.0
        };
        classify_hour_usage(self.hours_used, allocated)
    }
}

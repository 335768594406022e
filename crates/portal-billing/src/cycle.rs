//! Billing period resolution
//!
//! A retainer's hours reset on its payment anchor day:
//! - `1st`: calendar months `[1st, next 1st)`
//! - `15th`: `[15th, 15th of the following month)`
//!
//! Cycles for one schedule tile the calendar; every date belongs to exactly
//! one cycle and consecutive cycles share a boundary.

use crate::error::BillingError;
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of month on which a billing cycle starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentSchedule {
    /// Calendar month
    #[default]
    #[serde(rename = "1st")]
    First,
    /// Mid-month to mid-month
    #[serde(rename = "15th")]
    Fifteenth,
}

impl PaymentSchedule {
    /// Stored name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::Fifteenth => "15th",
        }
    }

    /// Day of month a cycle starts on
    #[inline]
    #[must_use]
    pub fn anchor_day(&self) -> u32 {
        match self {
            Self::First => 1,
            Self::Fifteenth => 15,
        }
    }
}

impl fmt::Display for PaymentSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentSchedule {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1st" => Ok(Self::First),
            "15th" => Ok(Self::Fifteenth),
            other => Err(BillingError::UnknownSchedule(other.to_string())),
        }
    }
}

/// One billing cycle, `[start_date, end_date)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingCycle {
    /// Display label, e.g. "January 2024" or "Dec 15, 2023 - Jan 14, 2024"
    pub label: String,
    /// First day of the cycle
    pub start_date: NaiveDate,
    /// First day of the next cycle (exclusive)
    pub end_date: NaiveDate,
    /// Schedule the cycle was resolved with
    pub schedule: PaymentSchedule,
}

impl BillingCycle {
    /// Whether `date` falls inside the cycle
    #[inline]
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date < self.end_date
    }

    /// Cycle length in days
    #[inline]
    #[must_use]
    pub fn len_days(&self) -> i64 {
        self.end_date.signed_duration_since(self.start_date).num_days()
    }

    /// Last day inside the cycle
    #[inline]
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.end_date - Duration::days(1)
    }

    /// Following cycle
    #[must_use]
    pub fn next(&self) -> Self {
        resolve_billing_period(self.end_date, Some(self.schedule))
    }

    /// Preceding cycle
    #[must_use]
    pub fn previous(&self) -> Self {
        resolve_billing_period(self.start_date - Duration::days(1), Some(self.schedule))
    }

    /// Days left in the cycle counting `today`; zero once the cycle is over,
    /// the full length before it starts
    #[must_use]
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        let from = today.max(self.start_date);
        self.end_date.signed_duration_since(from).num_days().max(0)
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {})", self.label, self.start_date, self.end_date)
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Resolve the cycle containing `date`
///
/// An unset schedule falls back to the calendar month.
#[must_use]
pub fn resolve_billing_period(date: NaiveDate, schedule: Option<PaymentSchedule>) -> BillingCycle {
    let schedule = schedule.unwrap_or_default();
    let first = month_start(date);

    match schedule {
        PaymentSchedule::First => BillingCycle {
            label: first.format("%B %Y").to_string(),
            start_date: first,
            end_date: first + Months::new(1),
            schedule,
        },
        PaymentSchedule::Fifteenth => {
            let anchor = i64::from(schedule.anchor_day() - 1);
            let start = if date.day() >= schedule.anchor_day() {
                first + Duration::days(anchor)
            } else {
                (first - Months::new(1)) + Duration::days(anchor)
            };
            let end = start + Months::new(1);
            let last = end - Duration::days(1);
            BillingCycle {
                label: format!("{} - {}", start.format("%b %-d, %Y"), last.format("%b %-d, %Y")),
                start_date: start,
                end_date: end,
                schedule,
            }
        }
    }
}

/// Consecutive cycles covering `[from, to]`; empty when `from > to`
#[must_use]
pub fn cycles_in_range(
    from: NaiveDate,
    to: NaiveDate,
    schedule: Option<PaymentSchedule>,
) -> Vec<BillingCycle> {
    let mut cycles = Vec::new();
    if from > to {
        return cycles;
    }
    let mut cycle = resolve_billing_period(from, schedule);
    while cycle.start_date <= to {
        let next = cycle.next();
        cycles.push(cycle);
        cycle = next;
    }
    cycles
}

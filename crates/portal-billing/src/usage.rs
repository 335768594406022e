//! Hour usage health
//!
//! Traffic-light status for a retainer's hour consumption in the current
//! cycle. Red wins over the percentage rule and also fires on overrun.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remaining hours at or below which usage is red
pub const RED_REMAINING_HOURS: f64 = 2.0;

/// Used fraction at or above which usage is yellow
pub const YELLOW_USED_RATIO: f64 = 0.75;

/// Traffic-light health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Comfortable
    Green,
    /// Most hours used
    Yellow,
    /// Nearly or fully exhausted
    Red,
}

impl HealthStatus {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hour usage summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourStatus {
    /// Health
    pub status: HealthStatus,
    /// Hours left, never negative
    pub remaining: f64,
    /// Share of the allocation used, in percent; zero without a cap
    pub percentage_used: f64,
}

impl HourStatus {
    /// Whether usage exceeded the allocation
    #[inline]
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.percentage_used > 100.0
    }
}

/// Classify `used` hours against `allocated`
///
/// `allocated == 0` means no cap and is always green.
#[must_use]
pub fn classify_hour_usage(used: f64, allocated: f64) -> HourStatus {
    if allocated <= 0.0 {
        return HourStatus {
            status: HealthStatus::Green,
            remaining: 0.0,
            percentage_used: 0.0,
        };
    }

    // Unclamped so an overrun still reads as red.
    let remaining = allocated - used;
    let ratio = used / allocated;
    let status = if remaining <= RED_REMAINING_HOURS {
        HealthStatus::Red
    } else if ratio >= YELLOW_USED_RATIO {
        HealthStatus::Yellow
    } else {
        HealthStatus::Green
    };

    HourStatus {
        status,
        remaining: remaining.max(0.0),
        percentage_used: ratio * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_at_two_remaining() {
        let status = classify_hour_usage(38.0, 40.0);
        assert_eq!(status.status, HealthStatus::Red);
        assert!((status.remaining - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn yellow_from_three_quarters() {
        let status = classify_hour_usage(31.0, 40.0);
        assert_eq!(status.status, HealthStatus::Yellow);
        assert!((status.percentage_used - 77.5).abs() < 1e-9);

        assert_eq!(classify_hour_usage(30.0, 40.0).status, HealthStatus::Yellow);
        assert_eq!(classify_hour_usage(29.9, 40.0).status, HealthStatus::Green);
    }

    #[test]
    fn green_when_comfortable() {
        let status = classify_hour_usage(10.0, 40.0);
        assert_eq!(status.status, HealthStatus::Green);
        assert!((status.remaining - 30.0).abs() < f64::EPSILON);
        assert!((status.percentage_used - 25.0).abs() < 1e-9);
    }

    #[test]
    fn no_cap_is_always_green() {
        for used in [0.0, 5.0, 1_000.0] {
            assert_eq!(classify_hour_usage(used, 0.0).status, HealthStatus::Green);
        }
    }

    #[test]
    fn overrun_is_red_with_zero_remaining() {
        let status = classify_hour_usage(45.0, 40.0);
        assert_eq!(status.status, HealthStatus::Red);
        assert!(status.remaining.abs() < f64::EPSILON);
        assert!(status.is_over());
    }

    #[test]
    fn red_beats_percentage_on_small_allocations() {
        // 1 of 3 hours is 33%, but only 2 remain
        assert_eq!(classify_hour_usage(1.0, 3.0).status, HealthStatus::Red);
    }
}

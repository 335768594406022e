use chrono::{Duration, NaiveDate};
use portal_billing::{
    classify_hour_usage, cycles_in_range, resolve_billing_period, HealthStatus, PaymentSchedule,
};
use proptest::prelude::*;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0i64..3_650).prop_map(move |n| base + Duration::days(n))
}

fn schedule_strategy() -> impl Strategy<Value = Option<PaymentSchedule>> {
    prop_oneof![
        Just(None),
        Just(Some(PaymentSchedule::First)),
        Just(Some(PaymentSchedule::Fifteenth)),
    ]
}

#[test]
fn test_year_boundary_scenarios() {
    let dec20 = NaiveDate::from_ymd_opt(2023, 12, 20).unwrap();
    let cycle = resolve_billing_period(dec20, Some(PaymentSchedule::Fifteenth));
    assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2023, 12, 15).unwrap());
    assert_eq!(cycle.end_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

    let jan10 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    assert_eq!(resolve_billing_period(jan10, Some(PaymentSchedule::Fifteenth)), cycle);
}

#[test]
fn test_hour_status_boundaries() {
    let red = classify_hour_usage(38.0, 40.0);
    assert_eq!(red.status, HealthStatus::Red);
    assert!((red.remaining - 2.0).abs() < f64::EPSILON);

    let yellow = classify_hour_usage(31.0, 40.0);
    assert_eq!(yellow.status, HealthStatus::Yellow);
    assert!((yellow.percentage_used - 77.5).abs() < 1e-9);

    assert_eq!(classify_hour_usage(10.0, 40.0).status, HealthStatus::Green);
    assert_eq!(classify_hour_usage(99.0, 0.0).status, HealthStatus::Green);
}

proptest! {
    #[test]
    fn prop_cycle_contains_its_date(date in date_strategy(), schedule in schedule_strategy()) {
        let cycle = resolve_billing_period(date, schedule);
        prop_assert!(cycle.contains(date));
        prop_assert!((28..=31).contains(&cycle.len_days()));
    }

    #[test]
    fn prop_cycles_are_identical_or_disjoint(
        a in date_strategy(),
        b in date_strategy(),
        schedule in schedule_strategy(),
    ) {
        let ca = resolve_billing_period(a, schedule);
        let cb = resolve_billing_period(b, schedule);
        let disjoint = ca.end_date <= cb.start_date || cb.end_date <= ca.start_date;
        prop_assert!(ca == cb || disjoint);
    }

    #[test]
    fn prop_cycles_tile_without_gaps(
        from in date_strategy(),
        span in 0i64..800,
        schedule in schedule_strategy(),
    ) {
        let to = from + Duration::days(span);
        let cycles = cycles_in_range(from, to, schedule);

        prop_assert!(cycles[0].contains(from));
        prop_assert!(cycles[cycles.len() - 1].contains(to));
        for pair in cycles.windows(2) {
            prop_assert_eq!(pair[0].end_date, pair[1].start_date);
        }
        for cycle in &cycles {
            prop_assert_eq!(&resolve_billing_period(cycle.last_day(), schedule), cycle);
        }
    }

    #[test]
    fn prop_red_whenever_two_or_fewer_remain(
        allocated in 0.5f64..500.0,
        slack in -50.0f64..1.99,
    ) {
        let used = (allocated - slack).max(0.0);
        let status = classify_hour_usage(used, allocated);
        prop_assert_eq!(status.status, HealthStatus::Red);
        prop_assert!(status.remaining >= 0.0);
    }

    #[test]
    fn prop_remaining_is_never_negative(used in 0.0f64..1_000.0, allocated in 0.0f64..1_000.0) {
        let status = classify_hour_usage(used, allocated);
        prop_assert!(status.remaining >= 0.0);
    }
}

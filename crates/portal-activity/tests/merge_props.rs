use chrono::{DateTime, TimeZone, Utc};
use portal_activity::{
    classify_all, feed_order, paginate, ActivityDetail, ActivityItem, ActivityType, CompanyId,
    KWayMerge, PagePosition, Role, SourceBatch, SourceKind,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn detail_strategy() -> impl Strategy<Value = ActivityDetail> {
    prop_oneof![
        Just(ActivityDetail::NoteAdded),
        Just(ActivityDetail::CompanyUpdate),
        any::<bool>().prop_map(|resolved| ActivityDetail::ChangeRequest { resolved }),
        (any::<bool>(), any::<bool>()).prop_map(|(resolved, team)| ActivityDetail::FileFlag {
            resolved,
            flagged_for: if team { Role::Team } else { Role::Client },
        }),
        any::<bool>().prop_map(|is_blocked| ActivityDetail::ProjectBlocked { is_blocked }),
        proptest::option::of(any::<bool>())
            .prop_map(|is_approved| ActivityDetail::DeliverableReview { is_approved }),
        (0.0f64..12.0).prop_map(|hours| ActivityDetail::HoursLogged { hours }),
    ]
}

/// Up to 6 sources of up to 20 items; timestamps drawn from a small range
/// so ties are common.
fn batches_strategy() -> impl Strategy<Value = Vec<Vec<(i64, ActivityDetail)>>> {
    prop::collection::vec(
        prop::collection::vec((0i64..50, detail_strategy()), 0..20),
        0..6,
    )
}

fn build(raw: Vec<Vec<(i64, ActivityDetail)>>) -> Vec<SourceBatch> {
    raw.into_iter()
        .enumerate()
        .map(|(source, rows)| {
            let mut items: Vec<ActivityItem> = rows
                .into_iter()
                .enumerate()
                .map(|(n, (secs, detail))| {
                    ActivityItem::new(
                        format!("s{source}-{n:03}"),
                        CompanyId::from("acme"),
                        at(secs),
                        detail,
                        "item",
                    )
                })
                .collect();
            items.sort_by(feed_order);
            SourceBatch::new(SourceKind::ALL[source % SourceKind::ALL.len()], items)
        })
        .collect()
}

fn sorted_all(batches: &[SourceBatch]) -> Vec<ActivityItem> {
    let mut all: Vec<ActivityItem> = batches.iter().flat_map(|b| b.items.clone()).collect();
    all.sort_by(feed_order);
    all
}

#[test]
fn test_empty_merge() {
    assert_eq!(KWayMerge::new(Vec::new()).count(), 0);
    let page = paginate(KWayMerge::new(Vec::new()), None, &PagePosition::Start, 5);
    assert!(page.items.is_empty());
    assert!(!page.has_more);
}

proptest! {
    #[test]
    fn prop_merge_is_sorted_and_complete(raw in batches_strategy()) {
        let batches = build(raw);
        let expected = sorted_all(&batches);
        let merged: Vec<ActivityItem> = KWayMerge::new(batches).collect();

        for pair in merged.windows(2) {
            prop_assert!(pair[0].timestamp >= pair[1].timestamp);
            if pair[0].timestamp == pair[1].timestamp {
                prop_assert!(pair[0].id > pair[1].id);
            }
            prop_assert_ne!(feed_order(&pair[0], &pair[1]), Ordering::Greater);
        }
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn prop_filter_before_truncate(
        raw in batches_strategy(),
        limit in 1usize..15,
        allow_flags in any::<bool>(),
    ) {
        let allowed: BTreeSet<ActivityType> = if allow_flags {
            [ActivityType::FileFlag, ActivityType::ChangeRequest].into_iter().collect()
        } else {
            [ActivityType::NoteAdded].into_iter().collect()
        };
        let batches = build(raw);
        let expected: Vec<ActivityItem> = sorted_all(&batches)
            .into_iter()
            .filter(|i| allowed.contains(&i.activity_type()))
            .collect();

        let page = paginate(KWayMerge::new(batches), Some(&allowed), &PagePosition::Start, limit);

        prop_assert!(page.items.iter().all(|i| allowed.contains(&i.activity_type())));
        prop_assert_eq!(page.items.len(), expected.len().min(limit));
        prop_assert_eq!(&page.items[..], &expected[..page.items.len()]);
        prop_assert_eq!(page.has_more, expected.len() > limit);
        prop_assert_eq!(page.next_cursor.is_some(), page.has_more);
    }

    #[test]
    fn prop_cursor_pages_cover_feed_once(raw in batches_strategy(), limit in 1usize..7) {
        let batches = build(raw);
        let expected = sorted_all(&batches);

        let mut seen = Vec::new();
        let mut position = PagePosition::Start;
        loop {
            let page = paginate(KWayMerge::new(batches.clone()), None, &position, limit);
            seen.extend(page.items);
            match page.next_cursor {
                Some(cursor) => position = PagePosition::After(cursor),
                None => break,
            }
        }
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_classifier_is_idempotent(raw in batches_strategy(), team in any::<bool>()) {
        let role = if team { Role::Team } else { Role::Client };
        let mut items = sorted_all(&build(raw));

        let first = classify_all(&mut items, role);
        let flags: Vec<bool> = items.iter().map(|i| i.is_action_item).collect();
        let second = classify_all(&mut items, role);
        let again: Vec<bool> = items.iter().map(|i| i.is_action_item).collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(flags, again);
    }
}

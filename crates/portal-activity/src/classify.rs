//! Action-item classification
//!
//! Deterministic per-type rules over the item's own payload and the
//! viewer's role. No hidden state: classifying twice yields the same flags.

use crate::types::{ActivityDetail, ActivityItem, Role};

/// Whether `item` still needs a response from a viewer with `role`
#[must_use]
pub fn is_action_item(item: &ActivityItem, role: Role) -> bool {
    match &item.detail {
        ActivityDetail::ChangeRequest { resolved } => !resolved,
        ActivityDetail::FileFlag {
            resolved,
            flagged_for,
        } => !resolved && *flagged_for == role,
        ActivityDetail::ProjectBlocked { is_blocked } => *is_blocked,
        ActivityDetail::DeliverableReview { is_approved } => is_approved.is_none(),
        ActivityDetail::CompanyUpdate
        | ActivityDetail::HoursLogged { .. }
        | ActivityDetail::FileUploaded { .. }
        | ActivityDetail::CredentialAdded
        | ActivityDetail::NoteAdded
        | ActivityDetail::TaskCompleted
        | ActivityDetail::ProjectCompleted
        | ActivityDetail::DeliverableApproved => false,
    }
}

/// Set `is_action_item` on every item; returns the number of action items
pub fn classify_all(items: &mut [ActivityItem], role: Role) -> usize {
    let mut count = 0;
    for item in items.iter_mut() {
        item.is_action_item = is_action_item(item, role);
        count += usize::from(item.is_action_item);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompanyId;
    use chrono::{TimeZone, Utc};

    fn item(detail: ActivityDetail) -> ActivityItem {
        ActivityItem::new(
            "x",
            CompanyId::from("acme"),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            detail,
            "s",
        )
    }

    #[test]
    fn change_request_until_resolved() {
        let open = item(ActivityDetail::ChangeRequest { resolved: false });
        let done = item(ActivityDetail::ChangeRequest { resolved: true });
        assert!(is_action_item(&open, Role::Team));
        assert!(!is_action_item(&done, Role::Team));
    }

    #[test]
    fn file_flag_requires_matching_role() {
        let flag = item(ActivityDetail::FileFlag {
            resolved: false,
            flagged_for: Role::Client,
        });
        assert!(is_action_item(&flag, Role::Client));
        assert!(!is_action_item(&flag, Role::Team));

        let resolved = item(ActivityDetail::FileFlag {
            resolved: true,
            flagged_for: Role::Client,
        });
        assert!(!is_action_item(&resolved, Role::Client));
    }

    #[test]
    fn blocked_project_while_blocked() {
        let blocked = item(ActivityDetail::ProjectBlocked { is_blocked: true });
        let cleared = item(ActivityDetail::ProjectBlocked { is_blocked: false });
        assert!(is_action_item(&blocked, Role::Client));
        assert!(!is_action_item(&cleared, Role::Client));
    }

    #[test]
    fn review_while_pending() {
        let pending = item(ActivityDetail::DeliverableReview { is_approved: None });
        assert!(is_action_item(&pending, Role::Client));
        assert!(!is_action_item(
            &item(ActivityDetail::DeliverableReview { is_approved: Some(false) }),
            Role::Client
        ));
    }

    #[test]
    fn informational_types_never_action_items() {
        let details = [
            ActivityDetail::CompanyUpdate,
            ActivityDetail::HoursLogged { hours: 2.0 },
            ActivityDetail::FileUploaded { file_name: "a.pdf".to_string() },
            ActivityDetail::CredentialAdded,
            ActivityDetail::NoteAdded,
            ActivityDetail::TaskCompleted,
            ActivityDetail::ProjectCompleted,
            ActivityDetail::DeliverableApproved,
        ];
        for detail in details {
            for role in [Role::Team, Role::Client] {
                assert!(!is_action_item(&item(detail.clone()), role));
            }
        }
    }

    #[test]
    fn classify_all_counts_and_is_idempotent() {
        let mut items = vec![
            item(ActivityDetail::ChangeRequest { resolved: false }),
            item(ActivityDetail::NoteAdded),
            item(ActivityDetail::FileFlag {
                resolved: false,
                flagged_for: Role::Team,
            }),
        ];
        assert_eq!(classify_all(&mut items, Role::Team), 2);
        let first: Vec<bool> = items.iter().map(|i| i.is_action_item).collect();
        assert_eq!(classify_all(&mut items, Role::Team), 2);
        let second: Vec<bool> = items.iter().map(|i| i.is_action_item).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![true, false, true]);
    }
}

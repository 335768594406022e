//! Core types for the activity feed
//!
//! Defines the fundamental types shared by every stage of the pipeline:
//! - Identifiers (company, project, activity)
//! - The closed [`ActivityType`] enumeration and its per-type payload
//! - The canonical [`ActivityItem`] and feed ordering
//! - Request windows, cursors and the [`ActivityFeed`] response

use crate::error::FeedWarning;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Company (client) identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl CompanyId {
    /// Create new company ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompanyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Project (campaign) identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Activity identifier, unique within its source type
///
/// Compared bytewise; used as the merge tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// User responsible for an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// User ID
    pub id: String,
    /// Name shown in the feed
    pub display_name: String,
}

impl Actor {
    /// Create new actor
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Role of the viewer (or of the side a file flag is raised for)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Agency staff
    Team,
    /// Client-side user
    Client,
}

impl Role {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Team => "team",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team" => Ok(Role::Team),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Closed set of feed event types
///
/// The wire names are fixed and shared with the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Company update post
    CompanyUpdate,
    /// Deliverable change request
    ChangeRequest,
    /// File flag
    FileFlag,
    /// Project marked blocked
    ProjectBlocked,
    /// Deliverable awaiting review
    DeliverableReview,
    /// Time entry logged
    HoursLogged,
    /// File created
    FileUploaded,
    /// Credential added
    CredentialAdded,
    /// Note added
    NoteAdded,
    /// Task moved to done
    TaskCompleted,
    /// Project moved to complete
    ProjectCompleted,
    /// Deliverable approved
    DeliverableApproved,
}

impl ActivityType {
    /// Every variant, in wire order
    pub const ALL: [ActivityType; 12] = [
        ActivityType::CompanyUpdate,
        ActivityType::ChangeRequest,
        ActivityType::FileFlag,
        ActivityType::ProjectBlocked,
        ActivityType::DeliverableReview,
        ActivityType::HoursLogged,
        ActivityType::FileUploaded,
        ActivityType::CredentialAdded,
        ActivityType::NoteAdded,
        ActivityType::TaskCompleted,
        ActivityType::ProjectCompleted,
        ActivityType::DeliverableApproved,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::CompanyUpdate => "company_update",
            ActivityType::ChangeRequest => "change_request",
            ActivityType::FileFlag => "file_flag",
            ActivityType::ProjectBlocked => "project_blocked",
            ActivityType::DeliverableReview => "deliverable_review",
            ActivityType::HoursLogged => "hours_logged",
            ActivityType::FileUploaded => "file_uploaded",
            ActivityType::CredentialAdded => "credential_added",
            ActivityType::NoteAdded => "note_added",
            ActivityType::TaskCompleted => "task_completed",
            ActivityType::ProjectCompleted => "project_completed",
            ActivityType::DeliverableApproved => "deliverable_approved",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown activity type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity type: '{0}'")]
pub struct UnknownActivityType(pub String);

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownActivityType(s.to_string()))
    }
}

/// Per-type payload of an activity item
///
/// Holds exactly the state the classifier needs; the item's
/// [`ActivityType`] is derived from the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityDetail {
    /// Company update post
    CompanyUpdate,
    /// Change request on a deliverable
    ChangeRequest {
        /// Team has addressed the request
        resolved: bool,
    },
    /// Flag raised on a file
    FileFlag {
        /// Flag has been resolved
        resolved: bool,
        /// Side expected to respond
        flagged_for: Role,
    },
    /// Project marked blocked
    ProjectBlocked {
        /// Project is still blocked
        is_blocked: bool,
    },
    /// Deliverable submitted for review
    DeliverableReview {
        /// `None` while pending
        is_approved: Option<bool>,
    },
    /// Time entry
    HoursLogged {
        /// Hours logged
        hours: f64,
    },
    /// File created
    FileUploaded {
        /// Uploaded file name
        file_name: String,
    },
    /// Credential added
    CredentialAdded,
    /// Note added
    NoteAdded,
    /// Task moved to done
    TaskCompleted,
    /// Project moved to complete
    ProjectCompleted,
    /// Deliverable approved
    DeliverableApproved,
}

impl ActivityDetail {
    /// Activity type of this payload
    #[must_use]
    pub fn activity_type(&self) -> ActivityType {
        match self {
            ActivityDetail::CompanyUpdate => ActivityType::CompanyUpdate,
            ActivityDetail::ChangeRequest { .. } => ActivityType::ChangeRequest,
            ActivityDetail::FileFlag { .. } => ActivityType::FileFlag,
            ActivityDetail::ProjectBlocked { .. } => ActivityType::ProjectBlocked,
            ActivityDetail::DeliverableReview { .. } => ActivityType::DeliverableReview,
            ActivityDetail::HoursLogged { .. } => ActivityType::HoursLogged,
            ActivityDetail::FileUploaded { .. } => ActivityType::FileUploaded,
            ActivityDetail::CredentialAdded => ActivityType::CredentialAdded,
            ActivityDetail::NoteAdded => ActivityType::NoteAdded,
            ActivityDetail::TaskCompleted => ActivityType::TaskCompleted,
            ActivityDetail::ProjectCompleted => ActivityType::ProjectCompleted,
            ActivityDetail::DeliverableApproved => ActivityType::DeliverableApproved,
        }
    }
}

/// Navigation target of an item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityLink {
    /// Owning project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Referenced file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// One normalized event in the unified feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    /// Stable identifier within the source type
    pub id: ActivityId,
    /// Owning company
    pub company_id: CompanyId,
    /// Owning project, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Responsible user; `None` for system events
    pub actor: Option<Actor>,
    /// Short human-readable description
    pub summary: String,
    /// Type and per-type payload
    #[serde(flatten)]
    pub detail: ActivityDetail,
    /// Set by the classifier
    #[serde(default)]
    pub is_action_item: bool,
    /// Navigation target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<ActivityLink>,
}

impl ActivityItem {
    /// Create new item (not yet classified)
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        company_id: CompanyId,
        timestamp: DateTime<Utc>,
        detail: ActivityDetail,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: ActivityId(id.into()),
            company_id,
            project_id: None,
            timestamp,
            actor: None,
            summary: summary.into(),
            detail,
            is_action_item: false,
            link: None,
        }
    }

    /// With owning project (also used as the default link)
    #[inline]
    #[must_use]
    pub fn with_project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = project_id;
        self
    }

    /// With actor
    #[inline]
    #[must_use]
    pub fn with_actor(mut self, actor: Option<Actor>) -> Self {
        self.actor = actor;
        self
    }

    /// With navigation link
    #[inline]
    #[must_use]
    pub fn with_link(mut self, link: ActivityLink) -> Self {
        self.link = Some(link);
        self
    }

    /// Activity type
    #[inline]
    #[must_use]
    pub fn activity_type(&self) -> ActivityType {
        self.detail.activity_type()
    }

    /// Position of this item in feed order
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> FeedCursor {
        FeedCursor {
            timestamp: self.timestamp,
            activity_type: self.activity_type(),
            id: self.id.clone(),
        }
    }
}

/// Feed ordering: newest first, ties by id descending, then by type
///
/// Type is the final key because ids are only unique per source type.
#[must_use]
pub fn feed_order(a: &ActivityItem, b: &ActivityItem) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.id.cmp(&a.id))
        .then_with(|| b.activity_type().cmp(&a.activity_type()))
}

/// Keyset position in the feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedCursor {
    /// Timestamp of the last seen item
    pub timestamp: DateTime<Utc>,
    /// Type of the last seen item
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Id of the last seen item
    pub id: ActivityId,
}

impl FeedCursor {
    /// Whether `item` comes strictly after this cursor in feed order
    #[must_use]
    pub fn precedes(&self, item: &ActivityItem) -> bool {
        let ord = item
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| item.id.cmp(&self.id))
            .then_with(|| item.activity_type().cmp(&self.activity_type));
        ord == Ordering::Less
    }
}

/// Event-time window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest included event time
    pub start: DateTime<Utc>,
    /// Latest included event time
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window covering the `days_back` days up to `now`
    ///
    /// `None` when the start falls outside the representable range.
    #[must_use]
    pub fn days_back(now: DateTime<Utc>, days_back: u32) -> Option<Self> {
        let start = Duration::try_days(i64::from(days_back))
            .and_then(|span| now.checked_sub_signed(span))?;
        Some(Self { start, end: now })
    }

    /// Whether `ts` falls inside the window
    #[inline]
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Feed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeed {
    /// Page of items in feed order
    pub items: Vec<ActivityItem>,
    /// More filtered items exist after this page
    pub has_more: bool,
    /// Cursor for the next page, set when `has_more`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<FeedCursor>,
    /// Number of action items in `items`
    pub action_items: usize,
    /// Non-fatal problems encountered while building the page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FeedWarning>,
}

impl ActivityFeed {
    /// Whether the page was built from every source without problems
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn item(id: &str, secs: i64, detail: ActivityDetail) -> ActivityItem {
        ActivityItem::new(id, CompanyId::from("acme"), at(secs), detail, "s")
    }

    #[test]
    fn activity_type_wire_names_roundtrip() {
        for t in ActivityType::ALL {
            assert_eq!(t.as_str().parse::<ActivityType>().unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn activity_type_rejects_unknown() {
        let err = "file_flagged".parse::<ActivityType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown activity type: 'file_flagged'");
    }

    #[test]
    fn detail_determines_type() {
        let flag = ActivityDetail::FileFlag {
            resolved: false,
            flagged_for: Role::Team,
        };
        assert_eq!(flag.activity_type(), ActivityType::FileFlag);
        assert_eq!(
            ActivityDetail::HoursLogged { hours: 1.5 }.activity_type(),
            ActivityType::HoursLogged
        );
    }

    #[test]
    fn item_serializes_with_type_tag() {
        let it = item("n1", 0, ActivityDetail::NoteAdded);
        let value = serde_json::to_value(&it).unwrap();
        assert_eq!(value["type"], "note_added");
        assert_eq!(value["company_id"], "acme");

        let back: ActivityItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, it);
    }

    #[test]
    fn feed_order_newest_first_then_id_descending() {
        let older = item("z", 0, ActivityDetail::NoteAdded);
        let newer = item("a", 10, ActivityDetail::NoteAdded);
        assert_eq!(feed_order(&newer, &older), Ordering::Less);

        let low = item("a", 5, ActivityDetail::NoteAdded);
        let high = item("b", 5, ActivityDetail::NoteAdded);
        assert_eq!(feed_order(&high, &low), Ordering::Less);
    }

    #[test]
    fn cursor_precedes_only_later_items() {
        let first = item("b", 10, ActivityDetail::NoteAdded);
        let second = item("a", 10, ActivityDetail::NoteAdded);
        let third = item("z", 5, ActivityDetail::NoteAdded);

        let cursor = first.cursor();
        assert!(!cursor.precedes(&first));
        assert!(cursor.precedes(&second));
        assert!(cursor.precedes(&third));
    }

    #[test]
    fn window_contains_bounds() {
        let now = at(86_400 * 3);
        let window = TimeWindow::days_back(now, 2).unwrap();
        assert!(window.contains(now));
        assert!(window.contains(at(86_400)));
        assert!(!window.contains(at(86_400 - 1)));
        assert!(!window.contains(now + Duration::seconds(1)));
    }

    #[test]
    fn window_before_earliest_date_is_none() {
        assert!(TimeWindow::days_back(DateTime::<Utc>::MIN_UTC, 1).is_none());
        assert!(TimeWindow::days_back(at(0), u32::MAX).is_none());
    }
}

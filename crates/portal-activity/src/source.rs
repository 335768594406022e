//! Source adapter port
//!
//! Each adapter serves exactly one entity kind for a company within a time
//! window, newest first. Retries and backoff belong to the adapter.
//!
//! Raw rows mirror the backend tables and may be partial; every field the
//! normalizer requires is optional here and checked there.

use crate::error::SourceError;
use crate::types::{Actor, CompanyId, Role, TimeWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Entity kind served by an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Company update posts
    Updates,
    /// Deliverables (review, change request, approval)
    Deliverables,
    /// File flags
    FileFlags,
    /// Files
    Files,
    /// Notes
    Notes,
    /// Time entries
    TimeEntries,
    /// Credentials
    Credentials,
    /// Task status transitions
    TaskTransitions,
    /// Project status transitions
    ProjectTransitions,
}

impl SourceKind {
    /// Every kind
    pub const ALL: [SourceKind; 9] = [
        SourceKind::Updates,
        SourceKind::Deliverables,
        SourceKind::FileFlags,
        SourceKind::Files,
        SourceKind::Notes,
        SourceKind::TimeEntries,
        SourceKind::Credentials,
        SourceKind::TaskTransitions,
        SourceKind::ProjectTransitions,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Updates => "updates",
            SourceKind::Deliverables => "deliverables",
            SourceKind::FileFlags => "file_flags",
            SourceKind::Files => "files",
            SourceKind::Notes => "notes",
            SourceKind::TimeEntries => "time_entries",
            SourceKind::Credentials => "credentials",
            SourceKind::TaskTransitions => "task_transitions",
            SourceKind::ProjectTransitions => "project_transitions",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Company update post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Who wrote it
    pub author: Option<Actor>,
    /// Title
    pub title: Option<String>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Deliverable review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
    /// Submitted, awaiting client review
    PendingReview,
    /// Client asked for changes
    ChangesRequested,
    /// Client approved
    Approved,
}

/// Deliverable row; one row yields one event according to its status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverableRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Title
    pub title: Option<String>,
    /// Review state
    pub status: Option<DeliverableStatus>,
    /// Who wrote it
    pub author: Option<Actor>,
    /// Who asked for changes
    pub requested_by: Option<Actor>,
    /// Who approved
    pub approved_by: Option<Actor>,
    /// `None` while pending
    pub is_approved: Option<bool>,
    /// Team has addressed the change request
    pub change_request_resolved: bool,
    /// Last status change
    pub updated_at: Option<DateTime<Utc>>,
}

/// Flag raised on a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFlagRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Flagged file
    pub file_id: Option<String>,
    /// File name
    pub file_name: Option<String>,
    /// Who raised the flag
    pub flagged_by: Option<Actor>,
    /// Role expected to act
    pub flagged_for: Option<Role>,
    /// Why the file was flagged
    pub reason: Option<String>,
    /// Whether the flag is cleared
    pub resolved: Option<bool>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Uploaded file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// File name
    pub file_name: Option<String>,
    /// Uploader
    pub uploaded_by: Option<Actor>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Note on a company or project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Who wrote it
    pub author: Option<Actor>,
    /// Note text
    pub body: Option<String>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Time entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeEntryRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Who logged the time
    pub logged_by: Option<Actor>,
    /// Hours worked
    pub hours: Option<f64>,
    /// Work description
    pub description: Option<String>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Stored credential (only its label reaches the feed)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Display label
    pub label: Option<String>,
    /// Who stored it
    pub created_by: Option<Actor>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Task status change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTransitionRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Task title
    pub task_title: Option<String>,
    /// Who made the change
    pub assignee: Option<Actor>,
    /// New status
    pub to_status: Option<String>,
    /// Time of the change
    pub transitioned_at: Option<DateTime<Utc>>,
}

/// Project status change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectTransitionRow {
    /// Row id, unique per table
    pub id: Option<String>,
    /// Owning company
    pub company_id: Option<String>,
    /// Related project, if any
    pub project_id: Option<String>,
    /// Project name
    pub project_name: Option<String>,
    /// Who made the change
    pub assignee: Option<Actor>,
    /// New status
    pub to_status: Option<String>,
    /// Current blocked flag of the project
    pub is_blocked: Option<bool>,
    /// Time of the change
    pub transitioned_at: Option<DateTime<Utc>>,
}

/// Raw record as returned by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RawRecord {
    /// Company update post
    Updates(UpdateRow),
    /// Deliverable row
    Deliverables(DeliverableRow),
    /// File flag
    FileFlags(FileFlagRow),
    /// Uploaded file
    Files(FileRow),
    /// Note
    Notes(NoteRow),
    /// Time entry
    TimeEntries(TimeEntryRow),
    /// Stored credential
    Credentials(CredentialRow),
    /// Task status change
    TaskTransitions(TaskTransitionRow),
    /// Project status change
    ProjectTransitions(ProjectTransitionRow),
}

impl RawRecord {
    /// Kind of the originating table
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            RawRecord::Updates(_) => SourceKind::Updates,
            RawRecord::Deliverables(_) => SourceKind::Deliverables,
            RawRecord::FileFlags(_) => SourceKind::FileFlags,
            RawRecord::Files(_) => SourceKind::Files,
            RawRecord::Notes(_) => SourceKind::Notes,
            RawRecord::TimeEntries(_) => SourceKind::TimeEntries,
            RawRecord::Credentials(_) => SourceKind::Credentials,
            RawRecord::TaskTransitions(_) => SourceKind::TaskTransitions,
            RawRecord::ProjectTransitions(_) => SourceKind::ProjectTransitions,
        }
    }

    /// Record id, when present
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            RawRecord::Updates(r) => r.id.as_deref(),
            RawRecord::Deliverables(r) => r.id.as_deref(),
            RawRecord::FileFlags(r) => r.id.as_deref(),
            RawRecord::Files(r) => r.id.as_deref(),
            RawRecord::Notes(r) => r.id.as_deref(),
            RawRecord::TimeEntries(r) => r.id.as_deref(),
            RawRecord::Credentials(r) => r.id.as_deref(),
            RawRecord::TaskTransitions(r) => r.id.as_deref(),
            RawRecord::ProjectTransitions(r) => r.id.as_deref(),
        }
    }

    /// Owning company, when present
    #[must_use]
    pub fn company_id(&self) -> Option<&str> {
        match self {
            RawRecord::Updates(r) => r.company_id.as_deref(),
            RawRecord::Deliverables(r) => r.company_id.as_deref(),
            RawRecord::FileFlags(r) => r.company_id.as_deref(),
            RawRecord::Files(r) => r.company_id.as_deref(),
            RawRecord::Notes(r) => r.company_id.as_deref(),
            RawRecord::TimeEntries(r) => r.company_id.as_deref(),
            RawRecord::Credentials(r) => r.company_id.as_deref(),
            RawRecord::TaskTransitions(r) => r.company_id.as_deref(),
            RawRecord::ProjectTransitions(r) => r.company_id.as_deref(),
        }
    }

    /// Event time as stored in the table's own timestamp column
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            RawRecord::Updates(r) => r.created_at,
            RawRecord::Deliverables(r) => r.updated_at,
            RawRecord::FileFlags(r) => r.created_at,
            RawRecord::Files(r) => r.created_at,
            RawRecord::Notes(r) => r.created_at,
            RawRecord::TimeEntries(r) => r.created_at,
            RawRecord::Credentials(r) => r.created_at,
            RawRecord::TaskTransitions(r) => r.transitioned_at,
            RawRecord::ProjectTransitions(r) => r.transitioned_at,
        }
    }
}

/// Read-only provider of one entity kind
#[async_trait]
pub trait SourceAdapter: Send + Sync + fmt::Debug {
    /// Kind served by this adapter
    fn kind(&self) -> SourceKind;

    /// Records for `company` within `window`, newest first
    ///
    /// # Errors
    /// Any backend failure; the feed degrades by omitting this source.
    async fn fetch(
        &self,
        company: &CompanyId,
        window: &TimeWindow,
    ) -> Result<Vec<RawRecord>, SourceError>;
}

/// Company as known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    /// Company ID
    pub id: CompanyId,
    /// Display name
    pub name: String,
}

/// Resolves company ids before any source is consulted
#[async_trait]
pub trait CompanyDirectory: Send + Sync + fmt::Debug {
    /// `Ok(None)` when no such company is visible to the caller
    ///
    /// # Errors
    /// Directory backend failure.
    async fn lookup(&self, company: &CompanyId) -> Result<Option<CompanySummary>, SourceError>;
}

/// In-memory adapter over a fixed record set
///
/// Behaves like a table query: filters by company and window and returns
/// newest first.
#[derive(Debug, Clone)]
pub struct StaticSource {
    kind: SourceKind,
    records: Vec<RawRecord>,
}

impl StaticSource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    /// With records (kept as-is; filtering happens at fetch time)
    #[must_use]
    pub fn with_records(mut self, records: impl IntoIterator<Item = RawRecord>) -> Self {
        self.records.extend(records);
        self
    }

    /// Split a mixed record set into one source per kind
    #[must_use]
    pub fn partition(records: impl IntoIterator<Item = RawRecord>) -> Vec<StaticSource> {
        let mut by_kind: HashMap<SourceKind, Vec<RawRecord>> = HashMap::new();
        for record in records {
            by_kind.entry(record.kind()).or_default().push(record);
        }
        SourceKind::ALL
            .into_iter()
            .filter_map(|kind| {
                by_kind
                    .remove(&kind)
                    .map(|records| StaticSource::new(kind).with_records(records))
            })
            .collect()
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(
        &self,
        company: &CompanyId,
        window: &TimeWindow,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let mut rows: Vec<RawRecord> = self
            .records
            .iter()
            .filter(|r| r.company_id() == Some(company.as_str()))
            .filter(|r| r.timestamp().map_or(true, |ts| window.contains(ts)))
            .cloned()
            .collect();
        // Rows without a timestamp sort last; the normalizer drops them.
        rows.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(rows)
    }
}

/// In-memory company directory
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    companies: HashMap<CompanyId, CompanySummary>,
}

impl StaticDirectory {
    /// Create empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With company
    #[must_use]
    pub fn with_company(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = CompanyId::new(id);
        self.companies.insert(
            id.clone(),
            CompanySummary {
                id,
                name: name.into(),
            },
        );
        self
    }
}

#[async_trait]
impl CompanyDirectory for StaticDirectory {
    async fn lookup(&self, company: &CompanyId) -> Result<Option<CompanySummary>, SourceError> {
        Ok(self.companies.get(company).cloned())
    }
}

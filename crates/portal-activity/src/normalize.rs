//! Raw record to [`ActivityItem`] mapping
//!
//! Normalization is total: each record yields one item, is skipped because
//! it is not a feed event (e.g. a task moved to "in progress"), or is
//! dropped as malformed with a logged reason.

use crate::error::{FeedWarning, NormalizeError};
use crate::source::{
    CredentialRow, DeliverableRow, DeliverableStatus, FileFlagRow, FileRow, NoteRow,
    ProjectTransitionRow, RawRecord, SourceKind, TaskTransitionRow, TimeEntryRow, UpdateRow,
};
use crate::types::{ActivityDetail, ActivityItem, ActivityLink, CompanyId, ProjectId};
use chrono::{DateTime, Utc};

/// Longest note excerpt kept in a summary, in characters
const NOTE_EXCERPT_CHARS: usize = 80;

/// Output of normalizing one source's records
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Items, in input order
    pub items: Vec<ActivityItem>,
    /// One warning per dropped record
    pub warnings: Vec<FeedWarning>,
    /// Records that are not feed events
    pub skipped: usize,
}

/// Normalize every record returned by one adapter
#[must_use]
pub fn normalize_batch(kind: SourceKind, records: &[RawRecord]) -> Normalized {
    let mut out = Normalized::default();
    out.items.reserve(records.len());

    for record in records {
        match normalize_record(kind, record) {
            Ok(Some(item)) => out.items.push(item),
            Ok(None) => {
                tracing::debug!(
                    source = %kind,
                    record_id = ?record.id(),
                    "skipping non-feed record"
                );
                out.skipped += 1;
            }
            Err(err) => {
                tracing::warn!(
                    source = %kind,
                    record_id = ?record.id(),
                    reason = %err,
                    "dropping malformed record"
                );
                out.warnings.push(FeedWarning::MalformedRecord {
                    source_kind: kind,
                    record_id: record.id().map(str::to_string),
                    reason: err.to_string(),
                });
            }
        }
    }

    out
}

/// Map one record
///
/// # Returns
/// - `Ok(Some(item))` for a feed event
/// - `Ok(None)` for a well-formed record that is not a feed event
///
/// # Errors
/// [`NormalizeError`] when the record cannot be represented faithfully.
pub fn normalize_record(
    expected: SourceKind,
    record: &RawRecord,
) -> Result<Option<ActivityItem>, NormalizeError> {
    if record.kind() != expected {
        return Err(NormalizeError::WrongSource {
            expected,
            actual: record.kind(),
        });
    }

    match record {
        RawRecord::Updates(row) => update(row).map(Some),
        RawRecord::Deliverables(row) => deliverable(row).map(Some),
        RawRecord::FileFlags(row) => file_flag(row).map(Some),
        RawRecord::Files(row) => file(row).map(Some),
        RawRecord::Notes(row) => note(row).map(Some),
        RawRecord::TimeEntries(row) => time_entry(row).map(Some),
        RawRecord::Credentials(row) => credential(row).map(Some),
        RawRecord::TaskTransitions(row) => task_transition(row),
        RawRecord::ProjectTransitions(row) => project_transition(row),
    }
}

/// Fields every feed event needs
struct Envelope {
    id: String,
    company_id: CompanyId,
    project_id: Option<ProjectId>,
    timestamp: DateTime<Utc>,
}

impl Envelope {
    fn parse(
        id: Option<&String>,
        company_id: Option<&String>,
        project_id: Option<&String>,
        timestamp: Option<DateTime<Utc>>,
        timestamp_field: &'static str,
    ) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: required_str("id", id)?.to_string(),
            company_id: CompanyId::new(required_str("company_id", company_id)?),
            project_id: non_empty(project_id).map(|p| ProjectId(p.to_string())),
            timestamp: timestamp.ok_or(NormalizeError::MissingField(timestamp_field))?,
        })
    }

    fn into_item(
        self,
        detail: ActivityDetail,
        summary: String,
        file_id: Option<&String>,
    ) -> ActivityItem {
        let link = ActivityLink {
            project_id: self.project_id.clone(),
            file_id: non_empty(file_id).map(str::to_string),
        };
        let item = ActivityItem::new(self.id, self.company_id, self.timestamp, detail, summary)
            .with_project(self.project_id);
        if link == ActivityLink::default() {
            item
        } else {
            item.with_link(link)
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn required_str<'a>(
    field: &'static str,
    value: Option<&'a String>,
) -> Result<&'a str, NormalizeError> {
    non_empty(value).ok_or(NormalizeError::MissingField(field))
}

fn label_or<'a>(value: Option<&'a String>, fallback: &'a str) -> &'a str {
    non_empty(value).unwrap_or(fallback)
}

fn update(row: &UpdateRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.created_at,
        "created_at",
    )?;
    let summary = match non_empty(row.title.as_ref()) {
        Some(title) => format!("Update posted: {title}"),
        None => "Update posted".to_string(),
    };
    Ok(env
        .into_item(ActivityDetail::CompanyUpdate, summary, None)
        .with_actor(row.author.clone()))
}

fn deliverable(row: &DeliverableRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.updated_at,
        "updated_at",
    )?;
    let status = row.status.ok_or(NormalizeError::MissingField("status"))?;
    let title = label_or(row.title.as_ref(), "deliverable");

    let (detail, summary, actor) = match status {
        DeliverableStatus::PendingReview => {
            if row.is_approved == Some(true) {
                return Err(NormalizeError::invalid(
                    "is_approved",
                    "pending review but already approved",
                ));
            }
            (
                ActivityDetail::DeliverableReview {
                    is_approved: row.is_approved,
                },
                format!("Ready for review: {title}"),
                row.author.clone(),
            )
        }
        DeliverableStatus::ChangesRequested => (
            ActivityDetail::ChangeRequest {
                resolved: row.change_request_resolved,
            },
            format!("Changes requested: {title}"),
            row.requested_by.clone(),
        ),
        DeliverableStatus::Approved => (
            ActivityDetail::DeliverableApproved,
            format!("Approved: {title}"),
            row.approved_by.clone(),
        ),
    };

    Ok(env.into_item(detail, summary, None).with_actor(actor))
}

fn file_flag(row: &FileFlagRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.created_at,
        "created_at",
    )?;
    let flagged_for = row
        .flagged_for
        .ok_or(NormalizeError::MissingField("flagged_for"))?;
    let file_name = label_or(row.file_name.as_ref(), "file");
    let summary = match non_empty(row.reason.as_ref()) {
        Some(reason) => format!("Flagged {file_name} for {flagged_for}: {reason}"),
        None => format!("Flagged {file_name} for {flagged_for}"),
    };
    let detail = ActivityDetail::FileFlag {
        resolved: row.resolved.unwrap_or(false),
        flagged_for,
    };
    Ok(env
        .into_item(detail, summary, row.file_id.as_ref())
        .with_actor(row.flagged_by.clone()))
}

fn file(row: &FileRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.created_at,
        "created_at",
    )?;
    let file_name = required_str("file_name", row.file_name.as_ref())?.to_string();
    let summary = format!("Uploaded {file_name}");
    Ok(env
        .into_item(ActivityDetail::FileUploaded { file_name }, summary, row.id.as_ref())
        .with_actor(row.uploaded_by.clone()))
}

fn note(row: &NoteRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.created_at,
        "created_at",
    )?;
    let summary = match non_empty(row.body.as_ref()) {
        Some(body) => format!("Note: {}", excerpt(body, NOTE_EXCERPT_CHARS)),
        None => "Note added".to_string(),
    };
    Ok(env
        .into_item(ActivityDetail::NoteAdded, summary, None)
        .with_actor(row.author.clone()))
}

fn time_entry(row: &TimeEntryRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.created_at,
        "created_at",
    )?;
    let hours = row.hours.ok_or(NormalizeError::MissingField("hours"))?;
    if !hours.is_finite() || hours < 0.0 {
        return Err(NormalizeError::invalid(
            "hours",
            format!("expected a non-negative number, got {hours}"),
        ));
    }
    let summary = match non_empty(row.description.as_ref()) {
        Some(desc) => format!("{hours}h logged: {desc}"),
        None => format!("{hours}h logged"),
    };
    Ok(env
        .into_item(ActivityDetail::HoursLogged { hours }, summary, None)
        .with_actor(row.logged_by.clone()))
}

fn credential(row: &CredentialRow) -> Result<ActivityItem, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.created_at,
        "created_at",
    )?;
    let summary = format!(
        "Credential added: {}",
        label_or(row.label.as_ref(), "unnamed")
    );
    Ok(env
        .into_item(ActivityDetail::CredentialAdded, summary, None)
        .with_actor(row.created_by.clone()))
}

fn task_transition(row: &TaskTransitionRow) -> Result<Option<ActivityItem>, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.transitioned_at,
        "transitioned_at",
    )?;
    let to_status = required_str("to_status", row.to_status.as_ref())?;
    if !to_status.eq_ignore_ascii_case("done") {
        return Ok(None);
    }
    let summary = format!(
        "Task completed: {}",
        label_or(row.task_title.as_ref(), "untitled task")
    );
    Ok(Some(
        env.into_item(ActivityDetail::TaskCompleted, summary, None)
            .with_actor(row.assignee.clone()),
    ))
}

fn project_transition(
    row: &ProjectTransitionRow,
) -> Result<Option<ActivityItem>, NormalizeError> {
    let env = Envelope::parse(
        row.id.as_ref(),
        row.company_id.as_ref(),
        row.project_id.as_ref(),
        row.transitioned_at,
        "transitioned_at",
    )?;
    let to_status = required_str("to_status", row.to_status.as_ref())?.to_ascii_lowercase();
    let name = label_or(row.project_name.as_ref(), "project");

    let (detail, summary) = match to_status.as_str() {
        "blocked" => (
            ActivityDetail::ProjectBlocked {
                is_blocked: row.is_blocked.unwrap_or(true),
            },
            format!("Project blocked: {name}"),
        ),
        "complete" | "completed" => (
            ActivityDetail::ProjectCompleted,
            format!("Project completed: {name}"),
        ),
        _ => return Ok(None),
    };

    Ok(Some(
        env.into_item(detail, summary, None)
            .with_actor(row.assignee.clone()),
    ))
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

//! Testing utilities for the agency portal workspace
//!
//! Raw record builders, misbehaving adapters and a ready-made feed service
//! pinned to a fixed clock.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use portal_activity::{
    ActivityFeedService, CompanyId, CredentialRow, DeliverableRow, DeliverableStatus, FeedConfig,
    FileFlagRow, FileRow, FixedClock, NoteRow, ProjectTransitionRow, RawRecord, Role,
    SourceAdapter, SourceError, SourceKind, StaticDirectory, StaticSource, TaskTransitionRow,
    TimeEntryRow, TimeWindow, UpdateRow,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const COMPANY: &str = "acme";
pub const OTHER_COMPANY: &str = "globex";

/// Reference "now" for feed tests: 2024-03-01T12:00:00Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `minutes` before [`fixed_now`]
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    fixed_now() - Duration::minutes(minutes)
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(fixed_now()))
}

/// Directory knowing [`COMPANY`] and [`OTHER_COMPANY`]
pub fn directory() -> Arc<StaticDirectory> {
    Arc::new(
        StaticDirectory::new()
            .with_company(COMPANY, "Acme Corp")
            .with_company(OTHER_COMPANY, "Globex"),
    )
}

fn s(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub fn update(id: &str, at: DateTime<Utc>) -> RawRecord {
    RawRecord::Updates(UpdateRow {
        id: s(id),
        company_id: s(COMPANY),
        title: s("Weekly update"),
        created_at: Some(at),
        ..UpdateRow::default()
    })
}

pub fn deliverable(id: &str, at: DateTime<Utc>, status: DeliverableStatus) -> RawRecord {
    RawRecord::Deliverables(DeliverableRow {
        id: s(id),
        company_id: s(COMPANY),
        project_id: s("campaign-1"),
        title: s("Landing page"),
        status: Some(status),
        is_approved: (status == DeliverableStatus::Approved).then_some(true),
        updated_at: Some(at),
        ..DeliverableRow::default()
    })
}

pub fn change_request(id: &str, at: DateTime<Utc>, resolved: bool) -> RawRecord {
    RawRecord::Deliverables(DeliverableRow {
        id: s(id),
        company_id: s(COMPANY),
        project_id: s("campaign-1"),
        title: s("Landing page"),
        status: Some(DeliverableStatus::ChangesRequested),
        change_request_resolved: resolved,
        updated_at: Some(at),
        ..DeliverableRow::default()
    })
}

pub fn file_flag(id: &str, at: DateTime<Utc>, flagged_for: Role, resolved: bool) -> RawRecord {
    RawRecord::FileFlags(FileFlagRow {
        id: s(id),
        company_id: s(COMPANY),
        project_id: s("campaign-1"),
        file_id: s(&format!("file-{id}")),
        file_name: s("brief.pdf"),
        flagged_for: Some(flagged_for),
        reason: s("needs signature"),
        resolved: Some(resolved),
        created_at: Some(at),
        ..FileFlagRow::default()
    })
}

pub fn file(id: &str, at: DateTime<Utc>) -> RawRecord {
    RawRecord::Files(FileRow {
        id: s(id),
        company_id: s(COMPANY),
        file_name: s("logo.svg"),
        created_at: Some(at),
        ..FileRow::default()
    })
}

pub fn note(id: &str, at: DateTime<Utc>) -> RawRecord {
    RawRecord::Notes(NoteRow {
        id: s(id),
        company_id: s(COMPANY),
        body: s("Call notes"),
        created_at: Some(at),
        ..NoteRow::default()
    })
}

pub fn time_entry(id: &str, at: DateTime<Utc>, hours: f64) -> RawRecord {
    RawRecord::TimeEntries(TimeEntryRow {
        id: s(id),
        company_id: s(COMPANY),
        hours: Some(hours),
        description: s("Design review"),
        created_at: Some(at),
        ..TimeEntryRow::default()
    })
}

pub fn credential(id: &str, at: DateTime<Utc>) -> RawRecord {
    RawRecord::Credentials(CredentialRow {
        id: s(id),
        company_id: s(COMPANY),
        label: s("CMS admin"),
        created_at: Some(at),
        ..CredentialRow::default()
    })
}

pub fn task_transition(id: &str, at: DateTime<Utc>, to_status: &str) -> RawRecord {
    RawRecord::TaskTransitions(TaskTransitionRow {
        id: s(id),
        company_id: s(COMPANY),
        task_title: s("Write copy"),
        to_status: s(to_status),
        transitioned_at: Some(at),
        ..TaskTransitionRow::default()
    })
}

pub fn project_transition(id: &str, at: DateTime<Utc>, to_status: &str) -> RawRecord {
    RawRecord::ProjectTransitions(ProjectTransitionRow {
        id: s(id),
        company_id: s(COMPANY),
        project_id: s("campaign-1"),
        project_name: s("Spring campaign"),
        to_status: s(to_status),
        is_blocked: Some(to_status.eq_ignore_ascii_case("blocked")),
        transitioned_at: Some(at),
        ..ProjectTransitionRow::default()
    })
}

/// Copy of `record` owned by another company
pub fn for_company(record: RawRecord, company: &str) -> RawRecord {
    let company = s(company);
    match record {
        RawRecord::Updates(row) => RawRecord::Updates(UpdateRow { company_id: company, ..row }),
        RawRecord::Deliverables(row) => {
            RawRecord::Deliverables(DeliverableRow { company_id: company, ..row })
        }
        RawRecord::FileFlags(row) => {
            RawRecord::FileFlags(FileFlagRow { company_id: company, ..row })
        }
        RawRecord::Files(row) => RawRecord::Files(FileRow { company_id: company, ..row }),
        RawRecord::Notes(row) => RawRecord::Notes(NoteRow { company_id: company, ..row }),
        RawRecord::TimeEntries(row) => {
            RawRecord::TimeEntries(TimeEntryRow { company_id: company, ..row })
        }
        RawRecord::Credentials(row) => {
            RawRecord::Credentials(CredentialRow { company_id: company, ..row })
        }
        RawRecord::TaskTransitions(row) => {
            RawRecord::TaskTransitions(TaskTransitionRow { company_id: company, ..row })
        }
        RawRecord::ProjectTransitions(row) => {
            RawRecord::ProjectTransitions(ProjectTransitionRow { company_id: company, ..row })
        }
    }
}

/// `total` events, one minute apart, of which `flags` are unresolved team
/// flags spread evenly through the set. The rest cycle through the other
/// entity kinds.
pub fn mixed_events(total: usize, flags: usize) -> Vec<RawRecord> {
    let every = if flags == 0 { usize::MAX } else { (total / flags).max(1) };
    let mut flagged = 0;
    (0..total)
        .map(|i| {
            let at = minutes_ago(i64::try_from(i).unwrap_or(i64::MAX) + 1);
            let id = format!("e{i:03}");
            if flagged < flags && i % every == 0 {
                flagged += 1;
                return file_flag(&id, at, Role::Team, false);
            }
            match i % 6 {
                0 => note(&id, at),
                1 => time_entry(&id, at, 1.5),
                2 => file(&id, at),
                3 => update(&id, at),
                4 => credential(&id, at),
                _ => task_transition(&id, at, "done"),
            }
        })
        .collect()
}

/// One in-memory adapter per kind present in `records`
pub fn static_sources(records: Vec<RawRecord>) -> Vec<Arc<dyn SourceAdapter>> {
    StaticSource::partition(records)
        .into_iter()
        .map(|source| Arc::new(source) as Arc<dyn SourceAdapter>)
        .collect()
}

/// Feed service over `records` with [`directory`] and [`fixed_clock`]
pub fn feed_service(config: FeedConfig, records: Vec<RawRecord>) -> ActivityFeedService {
    ActivityFeedService::new(config, directory())
        .unwrap()
        .with_sources(static_sources(records))
        .with_clock(fixed_clock())
}

/// Adapter that always fails
#[derive(Debug, Clone)]
pub struct FailingSource {
    kind: SourceKind,
    reason: String,
}

impl FailingSource {
    pub fn new(kind: SourceKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for FailingSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(
        &self,
        _company: &CompanyId,
        _window: &TimeWindow,
    ) -> Result<Vec<RawRecord>, SourceError> {
        Err(SourceError::Unavailable(self.reason.clone()))
    }
}

/// Adapter that answers only after `delay`
#[derive(Debug, Clone)]
pub struct SlowSource {
    inner: StaticSource,
    delay: std::time::Duration,
    finished: Option<Arc<AtomicBool>>,
}

impl SlowSource {
    pub fn new(inner: StaticSource, delay: std::time::Duration) -> Self {
        Self {
            inner,
            delay,
            finished: None,
        }
    }

    /// Set `flag` once the delay has elapsed
    pub fn with_finished_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.finished = Some(flag);
        self
    }
}

#[async_trait]
impl SourceAdapter for SlowSource {
    fn kind(&self) -> SourceKind {
        self.inner.kind()
    }

    async fn fetch(
        &self,
        company: &CompanyId,
        window: &TimeWindow,
    ) -> Result<Vec<RawRecord>, SourceError> {
        tokio::time::sleep(self.delay).await;
        if let Some(flag) = &self.finished {
            flag.store(true, Ordering::SeqCst);
        }
        self.inner.fetch(company, window).await
    }
}

/// Adapter that returns its records verbatim, ignoring scope and order
#[derive(Debug, Clone)]
pub struct RawSource {
    kind: SourceKind,
    records: Vec<RawRecord>,
}

impl RawSource {
    pub fn new(kind: SourceKind, records: Vec<RawRecord>) -> Self {
        Self { kind, records }
    }
}

#[async_trait]
impl SourceAdapter for RawSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(
        &self,
        _company: &CompanyId,
        _window: &TimeWindow,
    ) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

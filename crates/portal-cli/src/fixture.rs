//! JSON fixtures standing in for the backend
//!
//! ```json
//! {
//!   "companies": [{ "id": "acme", "name": "Acme Corp" }],
//!   "records": [{ "source": "notes", "id": "n1", "company_id": "acme", "created_at": "..." }]
//! }
//! ```

use anyhow::Context;
use portal_activity::{
    ActivityFeedService, CompanySummary, FeedConfig, RawRecord, SourceAdapter, StaticDirectory,
    StaticSource,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Companies and raw records loaded from disk
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Fixture {
    #[serde(default)]
    pub(crate) companies: Vec<CompanySummary>,
    #[serde(default)]
    pub(crate) records: Vec<RawRecord>,
}

impl Fixture {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let fixture: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing fixture {}", path.display()))?;
        tracing::debug!(
            companies = fixture.companies.len(),
            records = fixture.records.len(),
            "fixture loaded"
        );
        Ok(fixture)
    }

    /// Feed service with one in-memory adapter per record kind
    pub(crate) fn into_service(self, config: FeedConfig) -> anyhow::Result<ActivityFeedService> {
        let directory = self
            .companies
            .into_iter()
            .fold(StaticDirectory::new(), |dir, company| {
                dir.with_company(company.id.0, company.name)
            });
        let sources = StaticSource::partition(self.records)
            .into_iter()
            .map(|source| Arc::new(source) as Arc<dyn SourceAdapter>);
        Ok(ActivityFeedService::new(config, Arc::new(directory))?.with_sources(sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_activity::{FeedRequest, FixedClock, Role, SourceKind};
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "companies": [{ "id": "acme", "name": "Acme Corp" }],
        "records": [
            { "source": "notes", "id": "n1", "company_id": "acme",
              "body": "Kickoff call", "created_at": "2024-03-01T09:00:00Z" },
            { "source": "file_flags", "id": "f1", "company_id": "acme",
              "flagged_for": "client", "resolved": false,
              "created_at": "2024-03-01T10:00:00Z" },
            { "source": "notes", "id": "n0", "company_id": "acme",
              "created_at": "2023-01-01T00:00:00Z" }
        ]
    }"#;

    #[tokio::test]
    async fn fixture_builds_a_working_service() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let fixture = Fixture::load(file.path()).unwrap();
        assert_eq!(fixture.companies.len(), 1);
        assert_eq!(fixture.records.len(), 3);

        let now = "2024-03-01T12:00:00Z".parse().unwrap();
        let service = fixture
            .into_service(FeedConfig::default())
            .unwrap()
            .with_clock(Arc::new(FixedClock(now)));
        assert_eq!(
            service.source_kinds(),
            vec![SourceKind::FileFlags, SourceKind::Notes]
        );

        let feed = service
            .fetch(&FeedRequest::new("acme", service.config()), Role::Client)
            .await
            .unwrap();
        let ids: Vec<_> = feed.items.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, vec!["f1", "n1"]);
        assert_eq!(feed.action_items, 1);
    }

    #[tokio::test]
    async fn bundled_sample_fixture() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample.json"));
        let fixture = Fixture::load(path).unwrap();
        assert_eq!(fixture.records.len(), 11);

        let now = "2024-03-01T12:00:00Z".parse().unwrap();
        let service = fixture
            .into_service(FeedConfig::default())
            .unwrap()
            .with_clock(Arc::new(FixedClock(now)));
        let feed = service
            .fetch(&FeedRequest::new("acme", service.config()), Role::Team)
            .await
            .unwrap();

        // the in-progress task transition is not an event
        assert_eq!(feed.items.len(), 10);
        assert_eq!(feed.items[0].id.to_string(), "u1");
        assert_eq!(feed.action_items, 3);
        assert!(feed.is_complete());
    }

    #[test]
    fn unreadable_fixture_reports_path() {
        let err = Fixture::load(Path::new("/no/such/fixture.json")).unwrap_err();
        assert!(err.to_string().contains("/no/such/fixture.json"));
    }

    #[test]
    fn garbage_fixture_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(Fixture::load(file.path()).is_err());
    }
}

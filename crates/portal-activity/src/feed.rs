//! Activity feed service
//!
//! Request flow:
//! 1. Validate the request and resolve the company (fatal on failure)
//! 2. Fan out to every source adapter concurrently, each under its own timeout
//! 3. Normalize, re-validate scope and classify each source's records
//! 4. K-way merge, filter and paginate
//!
//! A failing or slow adapter only removes its own contribution and adds a
//! warning. Dropping the returned future cancels every outstanding adapter
//! call; nothing is written, so there is nothing to roll back.

use crate::cache::{FeedCache, FeedCacheKey};
use crate::classify::classify_all;
use crate::clock::{Clock, SystemClock};
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult, FeedWarning};
use crate::merge::{paginate, KWayMerge, SourceBatch};
use crate::normalize::normalize_batch;
use crate::request::{FeedQuery, FeedRequest};
use crate::source::{CompanyDirectory, CompanySummary, SourceAdapter, SourceKind};
use crate::types::{ActivityFeed, CompanyId, Role, TimeWindow};
use futures::future::join_all;
use std::sync::Arc;

/// Assembles activity feeds from injected source adapters
#[derive(Debug)]
pub struct ActivityFeedService {
    /// Configuration
    config: FeedConfig,
    /// Company resolution
    directory: Arc<dyn CompanyDirectory>,
    /// One adapter per entity kind
    sources: Vec<Arc<dyn SourceAdapter>>,
    /// Time source for request windows
    clock: Arc<dyn Clock>,
    /// Result cache, when enabled
    cache: Option<FeedCache>,
}

impl ActivityFeedService {
    /// Create service with no sources
    ///
    /// # Errors
    /// [`FeedError::Config`] if `config` is inconsistent.
    pub fn new(config: FeedConfig, directory: Arc<dyn CompanyDirectory>) -> FeedResult<Self> {
        config.validate()?;
        let cache = config
            .cache_enabled
            .then(|| FeedCache::new(config.cache_capacity, config.cache_ttl()));
        Ok(Self {
            config,
            directory,
            sources: Vec::new(),
            clock: Arc::new(SystemClock),
            cache,
        })
    }

    /// With source adapter
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.sources.push(source);
        self
    }

    /// With several source adapters
    #[must_use]
    pub fn with_sources(
        mut self,
        sources: impl IntoIterator<Item = Arc<dyn SourceAdapter>>,
    ) -> Self {
        self.sources.extend(sources);
        self
    }

    /// With clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Get result cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> Option<&FeedCache> {
        self.cache.as_ref()
    }

    /// Kinds of the registered adapters
    #[must_use]
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Validate a raw query, then build the feed
    ///
    /// # Errors
    /// See [`ActivityFeedService::fetch`] and [`FeedQuery::validate`].
    pub async fn query(&self, query: FeedQuery, role: Role) -> FeedResult<ActivityFeed> {
        let request = query.validate(&self.config)?;
        self.fetch(&request, role).await
    }

    /// Build one page of the feed for a viewer with `role`
    ///
    /// # Errors
    /// - [`FeedError::InvalidFilter`] if the request is out of range
    /// - [`FeedError::InvalidCompany`] if the company does not exist
    /// - [`FeedError::CompanyLookup`] if the directory fails
    pub async fn fetch(&self, request: &FeedRequest, role: Role) -> FeedResult<ActivityFeed> {
        request.validate(&self.config)?;
        tracing::info!(
            company = %request.company_id,
            %role,
            limit = request.limit,
            types = request.type_filter.as_ref().map_or(0, |t| t.len()),
            "building activity feed"
        );

        let company = self.resolve_company(&request.company_id).await?;

        let key = FeedCacheKey::new(request, role);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                tracing::debug!(company = %company.id, "feed cache hit");
                return Ok(hit.as_ref().clone());
            }
        }

        let window = TimeWindow::days_back(self.clock.now(), request.days_back).ok_or_else(|| {
            FeedError::InvalidFilter(format!(
                "days_back {} reaches past the earliest date",
                request.days_back
            ))
        })?;
        let (mut batches, mut warnings) = self.collect(&company.id, &window).await;

        for batch in &mut batches {
            classify_all(&mut batch.items, role);
        }

        let page = paginate(
            KWayMerge::new(batches),
            request.type_filter.as_ref(),
            &request.position,
            request.limit,
        );
        let action_items = page.items.iter().filter(|i| i.is_action_item).count();
        warnings.sort_by_key(FeedWarning::source_kind);

        let feed = ActivityFeed {
            items: page.items,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
            action_items,
            warnings,
        };
        tracing::info!(
            company = %company.id,
            items = feed.items.len(),
            has_more = feed.has_more,
            action_items = feed.action_items,
            warnings = feed.warnings.len(),
            "activity feed built"
        );

        if let Some(cache) = &self.cache {
            cache.insert(key, Arc::new(feed.clone())).await;
        }
        Ok(feed)
    }

    async fn resolve_company(&self, company: &CompanyId) -> FeedResult<CompanySummary> {
        match self.directory.lookup(company).await {
            Ok(Some(summary)) => Ok(summary),
            Ok(None) => {
                tracing::warn!(%company, "unknown company");
                Err(FeedError::InvalidCompany(company.clone()))
            }
            Err(source) => {
                tracing::error!(%company, error = %source, "company lookup failed");
                Err(FeedError::CompanyLookup {
                    company: company.clone(),
                    source,
                })
            }
        }
    }

    /// Fan out to every adapter and turn each answer into a sorted,
    /// in-scope batch; failures become warnings.
    async fn collect(
        &self,
        company: &CompanyId,
        window: &TimeWindow,
    ) -> (Vec<SourceBatch>, Vec<FeedWarning>) {
        let timeout = self.config.adapter_timeout();
        let timeout_ms = self.config.adapter_timeout_ms;

        let calls = self.sources.iter().map(|source| async move {
            let kind = source.kind();
            let outcome = tokio::time::timeout(timeout, source.fetch(company, window)).await;
            (kind, outcome)
        });
        let outcomes = join_all(calls).await;

        let mut batches = Vec::with_capacity(outcomes.len());
        let mut warnings = Vec::new();

        for (kind, outcome) in outcomes {
            let records = match outcome {
                Ok(Ok(records)) => records,
                Ok(Err(err)) => {
                    tracing::warn!(source = %kind, error = %err, "source unavailable; omitting");
                    warnings.push(FeedWarning::SourceUnavailable {
                        source_kind: kind,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(_) => {
                    tracing::warn!(source = %kind, timeout_ms, "source timed out; omitting");
                    warnings.push(FeedWarning::SourceTimedOut {
                        source_kind: kind,
                        timeout_ms,
                    });
                    continue;
                }
            };
            tracing::debug!(source = %kind, records = records.len(), "source answered");

            let normalized = normalize_batch(kind, &records);
            warnings.extend(normalized.warnings);

            let mut batch = SourceBatch::new(kind, normalized.items);
            warnings.extend(batch.retain_in_scope(company, window));
            warnings.extend(batch.ensure_sorted());
            batches.push(batch);
        }

        (batches, warnings)
    }
}

//! Short-lived feed result cache using moka
//!
//! Source data changes asynchronously, so entries expire after a short TTL.
//! Only complete (warning-free) feeds are stored; a degraded result is never
//! pinned.

use crate::request::FeedRequest;
use crate::types::{ActivityFeed, CompanyId, Role};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Cache key: the validated request plus the viewer role
///
/// Role is part of the key because classification depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedCacheKey {
    /// Viewer role
    pub role: Role,
    /// Validated request
    pub request: FeedRequest,
}

impl FeedCacheKey {
    /// Create new key
    #[inline]
    #[must_use]
    pub fn new(request: &FeedRequest, role: Role) -> Self {
        Self {
            role,
            request: request.clone(),
        }
    }

    /// Company the cached feed belongs to
    #[inline]
    #[must_use]
    pub fn company(&self) -> &CompanyId {
        &self.request.company_id
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// TTL cache of assembled feeds
#[derive(Debug, Clone)]
pub struct FeedCache {
    inner: Cache<FeedCacheKey, Arc<ActivityFeed>>,
}

impl FeedCache {
    /// Create cache with capacity and time-to-live
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached feed, if present and fresh
    #[inline]
    pub async fn get(&self, key: &FeedCacheKey) -> Option<Arc<ActivityFeed>> {
        self.inner.get(key).await
    }

    /// Store a feed; incomplete feeds are ignored
    ///
    /// Returns whether the feed was stored.
    pub async fn insert(&self, key: FeedCacheKey, feed: Arc<ActivityFeed>) -> bool {
        if !feed.is_complete() {
            tracing::debug!(company = %key.company(), "not caching degraded feed");
            return false;
        }
        self.inner.insert(key, feed).await;
        true
    }

    /// Drop every cached feed of `company`
    pub async fn invalidate_company(&self, company: &CompanyId) {
        let keys: Vec<Arc<FeedCacheKey>> = self
            .inner
            .iter()
            .filter(|(key, _)| key.company() == company)
            .map(|(key, _)| key)
            .collect();
        for key in keys {
            self.inner.invalidate(key.as_ref()).await;
        }
    }

    /// Drop everything
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Apply pending maintenance (expiry, eviction, counters)
    #[inline]
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::error::FeedWarning;
    use crate::source::SourceKind;

    fn feed(warnings: Vec<FeedWarning>) -> Arc<ActivityFeed> {
        Arc::new(ActivityFeed {
            items: Vec::new(),
            has_more: false,
            next_cursor: None,
            action_items: 0,
            warnings,
        })
    }

    fn key(company: &str, role: Role) -> FeedCacheKey {
        FeedCacheKey::new(&FeedRequest::new(company, &FeedConfig::default()), role)
    }

    #[tokio::test]
    async fn stores_and_returns_complete_feeds() {
        let cache = FeedCache::new(10, Duration::from_secs(30));
        assert!(cache.insert(key("acme", Role::Team), feed(Vec::new())).await);
        assert!(cache.get(&key("acme", Role::Team)).await.is_some());
        assert!(cache.get(&key("acme", Role::Client)).await.is_none());
    }

    #[tokio::test]
    async fn ignores_degraded_feeds() {
        let cache = FeedCache::new(10, Duration::from_secs(30));
        let degraded = feed(vec![FeedWarning::SourceUnavailable {
            source_kind: SourceKind::Notes,
            reason: "down".to_string(),
        }]);
        assert!(!cache.insert(key("acme", Role::Team), degraded).await);
        assert!(cache.get(&key("acme", Role::Team)).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_company_only_touches_that_company() {
        let cache = FeedCache::new(10, Duration::from_secs(30));
        cache.insert(key("acme", Role::Team), feed(Vec::new())).await;
        cache.insert(key("acme", Role::Client), feed(Vec::new())).await;
        cache.insert(key("globex", Role::Team), feed(Vec::new())).await;

        cache.invalidate_company(&CompanyId::from("acme")).await;

        assert!(cache.get(&key("acme", Role::Team)).await.is_none());
        assert!(cache.get(&key("acme", Role::Client)).await.is_none());
        assert!(cache.get(&key("globex", Role::Team)).await.is_some());

        cache.run_pending_tasks().await;
        assert_eq!(cache.stats().entry_count, 1);
    }
}

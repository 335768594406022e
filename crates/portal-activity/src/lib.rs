//! Portal Activity - unified activity feed
//!
//! Merges many independently stored event kinds into one time-ordered,
//! filterable feed for a company:
//! - Fans out to injected source adapters, each under its own timeout
//! - Normalizes raw rows into [`ActivityItem`]s
//! - Flags which items need action from the viewer's [`Role`]
//! - K-way merges the per-source streams, then filters and paginates
//!
//! A failing adapter degrades the feed to partial data with a
//! [`FeedWarning`]; an unknown company fails the request.
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_activity::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), FeedError> {
//! let directory = Arc::new(StaticDirectory::new().with_company("acme", "Acme"));
//! let service = ActivityFeedService::new(FeedConfig::default(), directory)?
//!     .with_source(Arc::new(StaticSource::new(SourceKind::Notes)));
//!
//! let feed = service.query(FeedQuery::new("acme"), Role::Team).await?;
//! println!("{} items, {} need action", feed.items.len(), feed.action_items);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod merge;
pub mod normalize;
pub mod request;
pub mod source;
pub mod types;

// Re-exports for convenience
pub use cache::{CacheStats, FeedCache, FeedCacheKey};
pub use classify::{classify_all, is_action_item};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FeedConfig, CACHE_TTL_CEILING_SECS, DAYS_BACK_CEILING};
pub use error::{FeedError, FeedResult, FeedWarning, NormalizeError, SourceError};
pub use feed::ActivityFeedService;
pub use merge::{paginate, KWayMerge, Page, PagePosition, SourceBatch};
pub use normalize::{normalize_batch, normalize_record, Normalized};
pub use request::{FeedQuery, FeedRequest};
pub use source::{
    CompanyDirectory, CompanySummary, CredentialRow, DeliverableRow, DeliverableStatus,
    FileFlagRow, FileRow, NoteRow, ProjectTransitionRow, RawRecord, SourceAdapter, SourceKind,
    StaticDirectory, StaticSource, TaskTransitionRow, TimeEntryRow, UpdateRow,
};
pub use types::{
    feed_order, ActivityDetail, ActivityFeed, ActivityId, ActivityItem, ActivityLink,
    ActivityType, Actor, CompanyId, FeedCursor, ProjectId, Role, TimeWindow, UnknownActivityType,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the activity feed
    pub use crate::{
        ActivityFeed, ActivityFeedService, ActivityItem, ActivityType, CompanyDirectory,
        CompanyId, FeedConfig, FeedError, FeedQuery, FeedRequest, FeedWarning, RawRecord, Role,
        SourceAdapter, SourceKind, StaticDirectory, StaticSource,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

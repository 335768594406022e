//! K-way merge and pagination
//!
//! Each source arrives newest first. The merge keeps one head per source in
//! a binary heap, so producing `m` items from `k` sources costs
//! O(m log k) and never sorts the whole set.
//!
//! Order of operations per request:
//! 1. scope re-validation (company, window), per source
//! 2. type allow-list
//! 3. position (offset or cursor), then limit
//!
//! Filtering happens before truncation so a page is never under-filled.

use crate::error::FeedWarning;
use crate::source::SourceKind;
use crate::types::{feed_order, ActivityItem, ActivityType, CompanyId, FeedCursor, TimeWindow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

/// Normalized items from one adapter
#[derive(Debug, Clone)]
pub struct SourceBatch {
    /// Adapter kind
    pub kind: SourceKind,
    /// Items, expected newest first
    pub items: Vec<ActivityItem>,
}

impl SourceBatch {
    /// Create new batch
    #[inline]
    #[must_use]
    pub fn new(kind: SourceKind, items: Vec<ActivityItem>) -> Self {
        Self { kind, items }
    }

    /// Drop items outside `company` or `window`
    ///
    /// Adapters already scope their queries; anything caught here is
    /// reported as [`FeedWarning::OutOfScope`].
    pub fn retain_in_scope(
        &mut self,
        company: &CompanyId,
        window: &TimeWindow,
    ) -> Vec<FeedWarning> {
        let kind = self.kind;
        let mut warnings = Vec::new();
        self.items.retain(|item| {
            let keep = item.company_id == *company && window.contains(item.timestamp);
            if !keep {
                tracing::warn!(
                    source = %kind,
                    record_id = %item.id,
                    "record outside request scope"
                );
                warnings.push(FeedWarning::OutOfScope {
                    source_kind: kind,
                    record_id: item.id.0.clone(),
                });
            }
            keep
        });
        warnings
    }

    /// Restore feed order if the adapter broke its ordering contract
    pub fn ensure_sorted(&mut self) -> Option<FeedWarning> {
        let sorted = self
            .items
            .windows(2)
            .all(|w| feed_order(&w[0], &w[1]) != Ordering::Greater);
        if sorted {
            return None;
        }
        tracing::warn!(source = %self.kind, "adapter returned unsorted records; re-sorting");
        self.items.sort_by(feed_order);
        Some(FeedWarning::UnsortedSource {
            source_kind: self.kind,
        })
    }
}

/// Current head of one source inside the heap
#[derive(Debug)]
struct Head {
    item: ActivityItem,
    source: usize,
}

impl Ord for Head {
    // Max-heap: the item that comes first in feed order is the greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        feed_order(&other.item, &self.item).then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

/// Lazy k-way merge over sorted batches, yielding items in feed order
#[derive(Debug)]
pub struct KWayMerge {
    heap: BinaryHeap<Head>,
    sources: Vec<std::vec::IntoIter<ActivityItem>>,
}

impl KWayMerge {
    /// Start merging `batches`; each must already be in feed order
    #[must_use]
    pub fn new(batches: Vec<SourceBatch>) -> Self {
        let mut sources: Vec<_> = batches.into_iter().map(|b| b.items.into_iter()).collect();
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, iter) in sources.iter_mut().enumerate() {
            if let Some(item) = iter.next() {
                heap.push(Head { item, source });
            }
        }
        Self { heap, sources }
    }
}

impl Iterator for KWayMerge {
    type Item = ActivityItem;

    fn next(&mut self) -> Option<Self::Item> {
        let Head { item, source } = self.heap.pop()?;
        if let Some(next) = self.sources[source].next() {
            self.heap.push(Head { item: next, source });
        }
        Some(item)
    }
}

/// Where a page starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePosition {
    /// First page
    #[default]
    Start,
    /// Skip this many filtered items
    Offset(usize),
    /// Start strictly after this item
    After(FeedCursor),
}

/// One page of the merged feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Items in feed order
    pub items: Vec<ActivityItem>,
    /// At least one filtered item follows the page
    pub has_more: bool,
    /// Position of the last returned item, when `has_more`
    pub next_cursor: Option<FeedCursor>,
}

/// Cut one page out of a merged stream
///
/// Consumes at most the filtered items up to the page end plus one, which
/// is enough to decide `has_more`.
pub fn paginate<'a>(
    merged: impl Iterator<Item = ActivityItem> + 'a,
    type_filter: Option<&'a BTreeSet<ActivityType>>,
    position: &PagePosition,
    limit: usize,
) -> Page {
    let filtered = merged.filter(move |item| {
        type_filter.map_or(true, |allowed| allowed.contains(&item.activity_type()))
    });

    let mut positioned: Box<dyn Iterator<Item = ActivityItem> + 'a> = match position {
        PagePosition::Start => Box::new(filtered),
        PagePosition::Offset(n) => Box::new(filtered.skip(*n)),
        PagePosition::After(cursor) => {
            let cursor = cursor.clone();
            Box::new(filtered.skip_while(move |item| !cursor.precedes(item)))
        }
    };

    let items: Vec<ActivityItem> = positioned.by_ref().take(limit).collect();
    let has_more = positioned.next().is_some();
    let next_cursor = if has_more {
        items.last().map(ActivityItem::cursor)
    } else {
        None
    };

    Page {
        items,
        has_more,
        next_cursor,
    }
}

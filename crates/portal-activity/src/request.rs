//! Feed requests
//!
//! [`FeedQuery`] is the loose shape received from callers; [`FeedRequest`]
//! is the validated form the service works with.

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::merge::PagePosition;
use crate::types::{ActivityType, CompanyId, FeedCursor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unvalidated feed request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedQuery {
    /// Company to show; required
    pub company_id: String,
    /// Window size in days
    pub days_back: Option<u32>,
    /// Allowed type names; empty or absent means all types
    pub type_filter: Option<Vec<String>>,
    /// Page size
    pub limit: Option<usize>,
    /// Filtered items to skip
    pub offset: Option<usize>,
    /// Start after this item
    pub cursor: Option<FeedCursor>,
}

impl FeedQuery {
    /// Create query for a company
    #[inline]
    #[must_use]
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            ..Self::default()
        }
    }

    /// Validate against `config`, filling defaults
    ///
    /// # Errors
    /// - [`FeedError::InvalidCompany`] for an empty company id
    /// - [`FeedError::InvalidFilter`] for unknown types or out-of-range values
    pub fn validate(self, config: &FeedConfig) -> FeedResult<FeedRequest> {
        let company = self.company_id.trim();
        if company.is_empty() {
            return Err(FeedError::InvalidCompany(CompanyId::new(company)));
        }

        let type_filter = match self.type_filter {
            Some(names) if !names.is_empty() => Some(
                names
                    .iter()
                    .map(|n| n.trim().parse::<ActivityType>())
                    .collect::<Result<BTreeSet<_>, _>>()?,
            ),
            _ => None,
        };

        let position = match (self.offset, self.cursor) {
            (Some(_), Some(_)) => {
                return Err(FeedError::InvalidFilter(
                    "offset and cursor are mutually exclusive".to_string(),
                ))
            }
            (Some(0) | None, None) => PagePosition::Start,
            (Some(n), None) => PagePosition::Offset(n),
            (None, Some(cursor)) => PagePosition::After(cursor),
        };

        let request = FeedRequest {
            company_id: CompanyId::new(company),
            days_back: self.days_back.unwrap_or(config.default_days_back),
            type_filter,
            limit: self.limit.unwrap_or(config.default_limit),
            position,
        };
        request.validate(config)?;
        Ok(request)
    }
}

/// Validated feed request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedRequest {
    /// Company to show
    pub company_id: CompanyId,
    /// Window size in days
    pub days_back: u32,
    /// Allowed types; `None` means all
    pub type_filter: Option<BTreeSet<ActivityType>>,
    /// Page size
    pub limit: usize,
    /// Page start
    pub position: PagePosition,
}

impl FeedRequest {
    /// First page for `company` with configured defaults
    #[must_use]
    pub fn new(company_id: impl Into<String>, config: &FeedConfig) -> Self {
        Self {
            company_id: CompanyId::new(company_id),
            days_back: config.default_days_back,
            type_filter: None,
            limit: config.default_limit,
            position: PagePosition::Start,
        }
    }

    /// With type allow-list
    #[must_use]
    pub fn with_types(mut self, types: impl IntoIterator<Item = ActivityType>) -> Self {
        let set: BTreeSet<_> = types.into_iter().collect();
        self.type_filter = (!set.is_empty()).then_some(set);
        self
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// With window size
    #[inline]
    #[must_use]
    pub fn with_days_back(mut self, days_back: u32) -> Self {
        self.days_back = days_back;
        self
    }

    /// With page start
    #[inline]
    #[must_use]
    pub fn with_position(mut self, position: PagePosition) -> Self {
        self.position = position;
        self
    }

    /// Range checks against `config`
    ///
    /// # Errors
    /// [`FeedError::InvalidFilter`] naming the offending value.
    pub fn validate(&self, config: &FeedConfig) -> FeedResult<()> {
        if self.company_id.as_str().trim().is_empty() {
            return Err(FeedError::InvalidCompany(self.company_id.clone()));
        }
        if self.limit == 0 || self.limit > config.max_limit {
            return Err(FeedError::InvalidFilter(format!(
                "limit must be within 1..={}, got {}",
                config.max_limit, self.limit
            )));
        }
        if self.days_back == 0 || self.days_back > config.max_days_back {
            return Err(FeedError::InvalidFilter(format!(
                "days_back must be within 1..={}, got {}",
                config.max_days_back, self.days_back
            )));
        }
        Ok(())
    }

    /// Whether items of `activity_type` pass the allow-list
    #[inline]
    #[must_use]
    pub fn allows(&self, activity_type: ActivityType) -> bool {
        self.type_filter
            .as_ref()
            .map_or(true, |set| set.contains(&activity_type))
    }
}

//! Error types for the activity feed
//!
//! Two tiers:
//! - [`FeedError`]: fatal, the request fails
//! - [`FeedWarning`]: non-fatal, collected next to a best-effort result
//!
//! Adapters report [`SourceError`]; the normalizer reports
//! [`NormalizeError`] which is downgraded to a warning per record.

use crate::source::SourceKind;
use crate::types::{CompanyId, UnknownActivityType};
use serde::{Deserialize, Serialize};

/// Fatal feed error
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// No such company (or empty id)
    #[error("invalid company: '{0}'")]
    InvalidCompany(CompanyId),

    /// Request filter rejected
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Company directory could not be consulted
    #[error("company lookup failed for '{company}': {source}")]
    CompanyLookup {
        /// Company being resolved
        company: CompanyId,
        /// Underlying directory failure
        #[source]
        source: SourceError,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// Errors caused by the caller's request (as opposed to the backend)
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidCompany(_) | Self::InvalidFilter(_))
    }
}

impl From<UnknownActivityType> for FeedError {
    fn from(err: UnknownActivityType) -> Self {
        Self::InvalidFilter(err.to_string())
    }
}

/// Non-fatal problem attached to a feed response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedWarning {
    /// Adapter failed; its contribution is omitted
    #[error("source {source_kind} unavailable: {reason}")]
    SourceUnavailable {
        /// Failing source
        #[serde(rename = "source")]
        source_kind: SourceKind,
        /// Adapter error message
        reason: String,
    },

    /// Adapter exceeded its timeout; its contribution is omitted
    #[error("source {source_kind} timed out after {timeout_ms}ms")]
    SourceTimedOut {
        /// Slow source
        #[serde(rename = "source")]
        source_kind: SourceKind,
        /// Timeout applied
        timeout_ms: u64,
    },

    /// Record dropped during normalization
    #[error(
        "malformed {source_kind} record {}: {reason}",
        .record_id.as_deref().unwrap_or("<no id>")
    )]
    MalformedRecord {
        /// Source of the record
        #[serde(rename = "source")]
        source_kind: SourceKind,
        /// Record id, when present
        record_id: Option<String>,
        /// Why it was dropped
        reason: String,
    },

    /// Record outside the requested company or window
    #[error("{source_kind} record {record_id} outside request scope")]
    OutOfScope {
        /// Source of the record
        #[serde(rename = "source")]
        source_kind: SourceKind,
        /// Record id
        record_id: String,
    },

    /// Adapter returned records out of order; the source was re-sorted
    #[error("source {source_kind} returned unsorted records")]
    UnsortedSource {
        /// Offending source
        #[serde(rename = "source")]
        source_kind: SourceKind,
    },
}

impl FeedWarning {
    /// Whether a whole source is missing from the result
    #[inline]
    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::SourceTimedOut { .. }
        )
    }

    /// Source the warning refers to
    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::SourceUnavailable { source_kind, .. }
            | Self::SourceTimedOut { source_kind, .. }
            | Self::MalformedRecord { source_kind, .. }
            | Self::OutOfScope { source_kind, .. }
            | Self::UnsortedSource { source_kind } => *source_kind,
        }
    }
}

/// Error returned by a source adapter or company directory
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// Backend not reachable
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with an error
    #[error("backend error: {0}")]
    Backend(String),
}

/// Why a raw record could not be normalized
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// Required field absent
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// Field present but unusable
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Description
        reason: String,
    },

    /// Record delivered by an adapter of another kind
    #[error("record of kind {actual} delivered by {expected} source")]
    WrongSource {
        /// Adapter kind
        expected: SourceKind,
        /// Record kind
        actual: SourceKind,
    },
}

impl NormalizeError {
    /// Create invalid value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_error_display() {
        let err = FeedError::InvalidCompany(CompanyId::from("nope"));
        assert_eq!(err.to_string(), "invalid company: 'nope'");
        assert!(err.is_client_error());
    }

    #[test]
    fn unknown_type_becomes_invalid_filter() {
        let err: FeedError = UnknownActivityType("bogus".to_string()).into();
        assert!(matches!(err, FeedError::InvalidFilter(_)));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn lookup_failure_is_not_client_error() {
        let err = FeedError::CompanyLookup {
            company: CompanyId::from("acme"),
            source: SourceError::Unavailable("db down".to_string()),
        };
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("db down"));
    }

    #[test]
    fn warning_display_and_source() {
        let w = FeedWarning::MalformedRecord {
            source_kind: SourceKind::Notes,
            record_id: None,
            reason: "missing required field 'id'".to_string(),
        };
        assert_eq!(
            w.to_string(),
            "malformed notes record <no id>: missing required field 'id'"
        );
        assert_eq!(w.source_kind(), SourceKind::Notes);
        assert!(!w.is_source_failure());

        let t = FeedWarning::SourceTimedOut {
            source_kind: SourceKind::Files,
            timeout_ms: 50,
        };
        assert!(t.is_source_failure());
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let w = FeedWarning::UnsortedSource {
            source_kind: SourceKind::TimeEntries,
        };
        let value = serde_json::to_value(&w).unwrap();
        assert_eq!(value["kind"], "unsorted_source");
        assert_eq!(value["source"], "time_entries");
    }
}

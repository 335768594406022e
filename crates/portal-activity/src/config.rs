//! Feed configuration
//!
//! Defaults suit the dashboard feed; deployments override them from YAML.

use crate::error::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound for `max_days_back`
pub const DAYS_BACK_CEILING: u32 = 36_500;

/// Upper bound for `cache_ttl_secs`
pub const CACHE_TTL_CEILING_SECS: u64 = 7 * 24 * 60 * 60;

/// Activity feed configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Page size when the request omits `limit`
    pub default_limit: usize,
    /// Largest accepted `limit`
    pub max_limit: usize,
    /// Window when the request omits `days_back`
    pub default_days_back: u32,
    /// Largest accepted `days_back`
    pub max_days_back: u32,
    /// Per-adapter timeout in milliseconds
    pub adapter_timeout_ms: u64,
    /// Whether complete results are cached
    pub cache_enabled: bool,
    /// Cache time-to-live in seconds
    pub cache_ttl_secs: u64,
    /// Maximum cached feeds
    pub cache_capacity: u64,
}

impl FeedConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default and maximum page size
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// With adapter timeout
    #[inline]
    #[must_use]
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With cache settings
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, enabled: bool, ttl: Duration) -> Self {
        self.cache_enabled = enabled;
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Per-adapter timeout
    #[inline]
    #[must_use]
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    /// Cache time-to-live
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// [`FeedError::Config`] describing the first violated constraint.
    pub fn validate(&self) -> FeedResult<()> {
        if self.default_limit == 0 {
            return Err(FeedError::Config("default_limit must be positive".to_string()));
        }
        if self.max_limit < self.default_limit {
            return Err(FeedError::Config(format!(
                "max_limit ({}) is below default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }
        if self.default_days_back == 0 || self.max_days_back < self.default_days_back {
            return Err(FeedError::Config(format!(
                "default_days_back ({}) must be within 1..={}",
                self.default_days_back, self.max_days_back
            )));
        }
        if self.max_days_back > DAYS_BACK_CEILING {
            return Err(FeedError::Config(format!(
                "max_days_back ({}) exceeds {DAYS_BACK_CEILING}",
                self.max_days_back
            )));
        }
        if self.adapter_timeout_ms == 0 {
            return Err(FeedError::Config("adapter_timeout_ms must be positive".to_string()));
        }
        if self.cache_enabled && (self.cache_ttl_secs == 0 || self.cache_capacity == 0) {
            return Err(FeedError::Config(
                "cache_ttl_secs and cache_capacity must be positive when caching".to_string(),
            ));
        }
        if self.cache_ttl_secs > CACHE_TTL_CEILING_SECS {
            return Err(FeedError::Config(format!(
                "cache_ttl_secs ({}) exceeds {CACHE_TTL_CEILING_SECS}",
                self.cache_ttl_secs
            )));
        }
        Ok(())
    }

    /// Parse and validate YAML; omitted keys keep their defaults
    ///
    /// # Errors
    /// [`FeedError::Config`] on malformed YAML or invalid values.
    pub fn from_yaml_str(yaml: &str) -> FeedResult<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| FeedError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    ///
    /// # Errors
    /// [`FeedError::Config`] when the file is unreadable or invalid.
    pub fn from_path(path: impl AsRef<Path>) -> FeedResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_yaml_str(&yaml)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            default_days_back: 30,
            max_days_back: 365,
            adapter_timeout_ms: 5_000,
            cache_enabled: true,
            cache_ttl_secs: 30,
            cache_capacity: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = FeedConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.adapter_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn yaml_overrides_selected_keys() {
        let config =
            FeedConfig::from_yaml_str("default_limit: 10\nadapter_timeout_ms: 250\n").unwrap();
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.adapter_timeout_ms, 250);
        assert_eq!(config.max_limit, 100);
    }

    #[test]
    fn yaml_rejects_inconsistent_limits() {
        let err = FeedConfig::from_yaml_str("default_limit: 50\nmax_limit: 10\n").unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
        assert!(err.to_string().contains("max_limit"));
    }

    #[test]
    fn yaml_rejects_garbage() {
        assert!(FeedConfig::from_yaml_str("default_limit: [1, 2").is_err());
    }

    #[test]
    fn oversized_window_and_ttl_rejected() {
        let wide = FeedConfig {
            max_days_back: u32::MAX,
            ..FeedConfig::default()
        };
        let err = wide.validate().unwrap_err();
        assert!(err.to_string().contains("max_days_back"));

        let long_lived = FeedConfig::new().with_cache(true, Duration::from_secs(u64::MAX / 2));
        let err = long_lived.validate().unwrap_err();
        assert!(err.to_string().contains("cache_ttl_secs"));

        let at_ceiling = FeedConfig {
            max_days_back: DAYS_BACK_CEILING,
            cache_ttl_secs: CACHE_TTL_CEILING_SECS,
            ..FeedConfig::default()
        };
        assert!(at_ceiling.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = FeedConfig::new()
            .with_limits(5, 10)
            .with_adapter_timeout(Duration::from_millis(75))
            .with_cache(false, Duration::from_secs(0));
        assert_eq!(config.max_limit, 10);
        assert_eq!(config.adapter_timeout_ms, 75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_ttl_secs: 5").unwrap();
        let config = FeedConfig::from_path(file.path()).unwrap();
        assert_eq!(config.cache_ttl_secs, 5);

        let missing = FeedConfig::from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(missing.to_string().contains("reading"));
    }
}

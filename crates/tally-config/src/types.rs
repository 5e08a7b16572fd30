//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [cache]      # TTL horizon and per-session capacity
//! [store]      # backing store selection and connection settings
//! [analysis]   # thresholds for the analysis engine
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Dataset cache configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSection>,

    /// Backing store configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreSection>,

    /// Analysis thresholds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSection>,
}

impl TallyConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: TallyConfig) {
        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.store.is_some() {
            self.store = other.store;
        }

        if other.analysis.is_some() {
            self.analysis = other.analysis;
        }
    }

    /// Effective cache section (defaults when absent).
    pub fn cache(&self) -> CacheSection {
        self.cache.clone().unwrap_or_default()
    }

    /// Effective store section (defaults when absent).
    pub fn store(&self) -> StoreSection {
        self.store.clone().unwrap_or_default()
    }

    /// Effective analysis section (defaults when absent).
    pub fn analysis(&self) -> AnalysisSection {
        self.analysis.clone().unwrap_or_default()
    }

    /// Point the store at a different Redis URL, keeping its other settings.
    pub fn override_store_url(&mut self, url: impl Into<String>) {
        let mut store = self.store();
        store.url = url.into();
        self.store = Some(store);
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        let cache = self.cache();
        if cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be greater than zero"));
        }
        if cache.max_datasets_per_session == 0 {
            return Err(invalid(
                "cache.max_datasets_per_session",
                "must be greater than zero",
            ));
        }

        let store = self.store();
        if store.backend == StoreBackend::Redis && store.url.trim().is_empty() {
            return Err(invalid("store.url", "required for the redis backend"));
        }
        if store.connect_timeout_ms == 0 || store.operation_timeout_ms == 0 {
            return Err(invalid("store", "timeouts must be greater than zero"));
        }

        let analysis = self.analysis();
        if !(0.0..=1.0).contains(&analysis.correlation_threshold) {
            return Err(invalid(
                "analysis.correlation_threshold",
                "must be between 0 and 1",
            ));
        }
        if !(analysis.significance > 0.0 && analysis.significance < 1.0) {
            return Err(invalid(
                "analysis.significance",
                "must be strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Dataset cache section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// TTL applied to every session key, in seconds.
    pub ttl_secs: u64,
    /// Datasets kept per session before the oldest is evicted.
    pub max_datasets_per_session: usize,
    /// Rows included in each dataset's preview.
    pub preview_rows: usize,
}

impl CacheSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            max_datasets_per_session: 3,
            preview_rows: 5,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which backing store holds the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// In-process store; contents vanish with the process.
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Backing store section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    /// Redis connection URL.
    pub url: String,
    pub connect_timeout_ms: u64,
    pub operation_timeout_ms: u64,
}

impl StoreSection {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: "redis://127.0.0.1:6379/0".to_string(),
            connect_timeout_ms: 2000,
            operation_timeout_ms: 2000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Analysis thresholds section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub correlation_threshold: f64,
    pub high_cardinality_threshold: usize,
    pub max_categories_for_chi2: usize,
    pub normality_min_samples: usize,
    pub significance: f64,
    pub overview_top_values: usize,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.7,
            high_cardinality_threshold: 50,
            max_categories_for_chi2: 20,
            normality_min_samples: 8,
            significance: 0.05,
            overview_top_values: 10,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = TallyConfig::from_toml("").unwrap();
        assert!(config.cache.is_none());
        assert!(config.store.is_none());
        assert_eq!(config.cache().ttl_secs, 1800);
        assert_eq!(config.store().backend, StoreBackend::Redis);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = TallyConfig::from_toml(
            r#"
[cache]
ttl_secs = 600
max_datasets_per_session = 5

[store]
backend = "memory"

[analysis]
correlation_threshold = 0.5
"#,
        )
        .unwrap();

        let cache = config.cache();
        assert_eq!(cache.ttl(), Duration::from_secs(600));
        assert_eq!(cache.max_datasets_per_session, 5);
        // unset keys keep their defaults
        assert_eq!(cache.preview_rows, 5);

        assert_eq!(config.store().backend, StoreBackend::Memory);
        assert_eq!(config.store().connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.analysis().correlation_threshold, 0.5);
        assert_eq!(config.analysis().high_cardinality_threshold, 50);
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let err = TallyConfig::from_toml("[store]\nbackend = \"sqlite\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_replaces_sections() {
        let mut base = TallyConfig::from_toml(
            r#"
[cache]
ttl_secs = 60

[store]
url = "redis://base:6379"
"#,
        )
        .unwrap();
        let overlay = TallyConfig::from_toml("[store]\nurl = \"redis://project:6379\"\n").unwrap();

        base.merge(overlay);
        assert_eq!(base.store().url, "redis://project:6379");
        assert_eq!(base.cache().ttl_secs, 60);
    }

    #[test]
    fn test_override_store_url_keeps_backend() {
        let mut config = TallyConfig::from_toml("[store]\nconnect_timeout_ms = 100\n").unwrap();
        config.override_store_url("redis://elsewhere:6380");
        let store = config.store();
        assert_eq!(store.url, "redis://elsewhere:6380");
        assert_eq!(store.connect_timeout_ms, 100);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = TallyConfig::new();
        config.cache = Some(CacheSection {
            ttl_secs: 90,
            ..Default::default()
        });
        config.store = Some(StoreSection {
            backend: StoreBackend::Memory,
            ..Default::default()
        });

        let text = config.to_toml().unwrap();
        assert!(text.contains("backend = \"memory\""));
        assert!(!text.contains("[analysis]"));
        assert_eq!(TallyConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_ttl = TallyConfig::from_toml("[cache]\nttl_secs = 0\n").unwrap();
        assert!(matches!(
            zero_ttl.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "cache.ttl_secs"
        ));

        let zero_cap = TallyConfig::from_toml("[cache]\nmax_datasets_per_session = 0\n").unwrap();
        assert!(zero_cap.validate().is_err());

        let threshold = TallyConfig::from_toml("[analysis]\ncorrelation_threshold = 1.5\n").unwrap();
        assert!(threshold.validate().is_err());

        let no_url = TallyConfig::from_toml("[store]\nurl = \"\"\n").unwrap();
        assert!(no_url.validate().is_err());

        let memory = TallyConfig::from_toml("[store]\nbackend = \"memory\"\nurl = \"\"\n").unwrap();
        assert!(memory.validate().is_ok());
    }
}

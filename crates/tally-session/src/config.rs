//! Configuration for the dataset cache and its Redis backend.

use std::time::Duration;

/// Default lifetime of every cached key (30 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default number of datasets a session may hold before FIFO eviction.
pub const DEFAULT_MAX_DATASETS: usize = 3;

/// Default number of rows kept in a dataset preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Default timeout for establishing a store connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default timeout for a single store command or transaction.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for the dataset cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime applied to every key on write, and again on each read.
    pub ttl: Duration,

    /// Maximum number of datasets per session before the oldest is evicted.
    pub max_datasets_per_session: usize,

    /// Number of leading rows stored in each dataset's preview.
    pub preview_rows: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_datasets_per_session: DEFAULT_MAX_DATASETS,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL horizon for cached keys.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the per-session dataset cap. Zero is treated as one.
    pub fn with_max_datasets(mut self, max: usize) -> Self {
        self.max_datasets_per_session = max.max(1);
        self
    }

    /// Set the number of preview rows.
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }
}

/// Connection settings for [`RedisStore`](crate::RedisStore).
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379/0`.
    pub url: String,

    /// Upper bound on establishing the shared connection.
    pub connect_timeout: Duration,

    /// Upper bound on any single command or transaction.
    pub operation_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl RedisConfig {
    /// Configuration for the given URL with default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

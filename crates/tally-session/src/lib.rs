//! Session-scoped dataset cache for Tally.
//!
//! Datasets uploaded by an anonymous session are cached server-side together
//! with derived analysis artifacts. The cache provides:
//! - per-session capacity with FIFO eviction by insertion time
//! - duplicate detection by content hash and title
//! - a single TTL horizon for every key, reset on read
//! - atomic multi-key writes and cascading removal
//! - pluggable backing stores ([`RedisStore`], [`MemoryStore`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_session::{CacheConfig, DatasetCache, MemoryStore, NewDataset};
//!
//! let cache = DatasetCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
//! let id = cache.add_dataset("sid", NewDataset::new("sales.csv"), &table).await?;
//! let (meta, table) = cache.get_dataset("sid", &id).await?.expect("cached");
//! ```

mod cache;
pub mod codec;
mod config;
mod error;
pub mod keys;
mod meta;
mod store;
mod ttl;

pub use cache::{DatasetCache, SessionStats};
pub use config::{
    CacheConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_DATASETS, DEFAULT_OPERATION_TIMEOUT,
    DEFAULT_PREVIEW_ROWS, DEFAULT_TTL, RedisConfig,
};
pub use error::{DuplicateKind, Error, Result};
pub use meta::{ArtifactKind, DatasetMeta, NewDataset};
pub use store::{BackingStore, MemoryStore, RedisStore, StoreOp};
pub use ttl::TtlTracker;

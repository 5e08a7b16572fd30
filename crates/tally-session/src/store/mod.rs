//! Backing store abstraction.
//!
//! [`BackingStore`] is the narrow key/value surface the dataset cache needs:
//! byte values with TTL, string sets, prefix scans and an all-or-nothing
//! batch. Implementations map every native failure, including timeouts, to
//! [`Error::Unavailable`](crate::Error::Unavailable).

mod memory;
mod redis;

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// One step of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set {
        key: String,
        value: Vec<u8>,
        ttl: Duration,
    },
    Delete {
        key: String,
    },
    Expire {
        key: String,
        ttl: Duration,
    },
    SetAdd {
        key: String,
        member: String,
    },
    SetRemove {
        key: String,
        member: String,
    },
}

/// Key/value store holding cached datasets.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Value of `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Delete keys and return how many existed.
    async fn delete(&self, keys: &[String]) -> Result<usize>;

    /// Reset the lifetime of `key`. Returns `false` when it does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remaining lifetime, `None` when absent or without expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    async fn set_add(&self, key: &str, member: &str) -> Result<()>;

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>>;

    async fn set_remove(&self, key: &str, member: &str) -> Result<()>;

    /// Every live key starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Apply all operations so that either all or none become visible.
    async fn execute_atomically(&self, ops: &[StoreOp]) -> Result<()>;

    /// Health probe.
    async fn ping(&self) -> Result<()>;
}

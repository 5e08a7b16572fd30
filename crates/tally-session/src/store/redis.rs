//! Redis-backed store.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, RedisResult};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{BackingStore, StoreOp};
use crate::config::RedisConfig;
use crate::error::{Error, Result};

const SCAN_BATCH: usize = 100;

/// [`BackingStore`] over a shared, multiplexed Redis connection.
///
/// The connection is established on first use. A failed attempt is reported
/// as [`Error::Unavailable`] and retried on the next call; nothing retries
/// within a call. Every command is bounded by the configured operation
/// timeout.
pub struct RedisStore {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    config: RedisConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &self.config.url)
            .field("connected", &self.conn.initialized())
            .finish()
    }
}

impl RedisStore {
    /// Create a store for the given configuration without connecting.
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            config,
        })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                debug!(url = %self.config.url, "Connecting to Redis");
                match timeout(
                    self.config.connect_timeout,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                {
                    Ok(Ok(conn)) => Ok(conn),
                    Ok(Err(e)) => {
                        warn!(error = %e, "Redis connection failed");
                        Err(Error::from(e))
                    }
                    Err(_) => {
                        warn!(timeout = ?self.config.connect_timeout, "Redis connection timed out");
                        Err(Error::Unavailable(format!(
                            "connect timed out after {:?}",
                            self.config.connect_timeout
                        )))
                    }
                }
            })
            .await?;
        Ok(conn.clone())
    }

    async fn run<T, F, Fut>(&self, command: &str, f: F) -> Result<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self.connection().await?;
        match timeout(self.config.operation_timeout, f(conn)).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Unavailable(format!(
                "{command} timed out after {:?}",
                self.config.operation_timeout
            ))),
        }
    }
}

fn millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

/// Escape glob metacharacters so `prefix` matches literally in `SCAN MATCH`.
fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl BackingStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.run("GET", |mut conn| async move {
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.run("SET", |mut conn| async move {
            let _: () = ::redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(millis(ttl))
                .query_async(&mut conn)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.run("DEL", |mut conn| async move {
            let removed: usize = conn.del(keys).await?;
            Ok(removed)
        })
        .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.run("PEXPIRE", |mut conn| async move {
            let applied: bool = ::redis::cmd("PEXPIRE")
                .arg(key)
                .arg(millis(ttl))
                .query_async(&mut conn)
                .await?;
            Ok(applied)
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.run("EXISTS", |mut conn| async move {
            let exists: bool = conn.exists(key).await?;
            Ok(exists)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.run("PTTL", |mut conn| async move {
            // -2: missing, -1: no expiry
            let ms: i64 = ::redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
            Ok(u64::try_from(ms).ok().map(Duration::from_millis))
        })
        .await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.run("SADD", |mut conn| async move {
            let _: usize = conn.sadd(key, member).await?;
            Ok(())
        })
        .await
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>> {
        self.run("SMEMBERS", |mut conn| async move {
            let members: BTreeSet<String> = conn.smembers(key).await?;
            Ok(members)
        })
        .await
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        self.run("SREM", |mut conn| async move {
            let _: usize = conn.srem(key, member).await?;
            Ok(())
        })
        .await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = match_pattern(prefix);
        self.run("SCAN", |mut conn| async move {
            let mut cursor = 0u64;
            let mut keys = BTreeSet::new();
            loop {
                let (next, batch): (u64, Vec<String>) = ::redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await?;
                keys.extend(batch);
                cursor = next;
                if cursor == 0 {
                    break;
                }
            }
            Ok(keys.into_iter().collect())
        })
        .await
    }

    async fn execute_atomically(&self, ops: &[StoreOp]) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                StoreOp::Set { key, value, ttl } => {
                    pipe.cmd("SET")
                        .arg(key)
                        .arg(value.as_slice())
                        .arg("PX")
                        .arg(millis(*ttl))
                        .ignore();
                }
                StoreOp::Delete { key } => {
                    pipe.cmd("DEL").arg(key).ignore();
                }
                StoreOp::Expire { key, ttl } => {
                    pipe.cmd("PEXPIRE").arg(key).arg(millis(*ttl)).ignore();
                }
                StoreOp::SetAdd { key, member } => {
                    pipe.cmd("SADD").arg(key).arg(member).ignore();
                }
                StoreOp::SetRemove { key, member } => {
                    pipe.cmd("SREM").arg(key).arg(member).ignore();
                }
            }
        }
        self.run("MULTI/EXEC", |mut conn| async move {
            let _: () = pipe.query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.run("PING", |mut conn| async move {
            let _: String = ::redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_pattern_escapes_globs() {
        assert_eq!(match_pattern("session:a:"), "session:a:*");
        assert_eq!(match_pattern("a*b?[c]\\"), "a\\*b\\?\\[c\\]\\\\*");
    }

    #[test]
    fn test_millis_never_zero() {
        assert_eq!(millis(Duration::ZERO), 1);
        assert_eq!(millis(Duration::from_secs(2)), 2000);
    }

    #[test]
    fn test_invalid_url_is_unavailable() {
        let err = RedisStore::new(RedisConfig::new("not a url")).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_new_does_not_connect() {
        let store = RedisStore::new(RedisConfig::new("redis://127.0.0.1:1")).unwrap();
        assert!(!format!("{store:?}").contains("connected: true"));
    }
}

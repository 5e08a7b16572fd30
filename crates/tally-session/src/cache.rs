//! Session-scoped dataset cache.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tally_types::Table;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::codec::{decode, encode};
use crate::config::CacheConfig;
use crate::error::{DuplicateKind, Error, Result};
use crate::keys::{DatasetKeys, SessionKeys};
use crate::meta::{ArtifactKind, DatasetMeta, NewDataset};
use crate::store::{BackingStore, StoreOp};

/// Dataset cache over a [`BackingStore`].
///
/// Each session holds at most `max_datasets_per_session` datasets. Adding
/// beyond the cap evicts the oldest by insertion time, regardless of reads.
/// Every key carries the same TTL, which reads reset to the full horizon.
/// Nothing is retried: store failures surface as [`Error::Unavailable`] and
/// the caller decides whether to degrade.
#[derive(Clone)]
pub struct DatasetCache {
    store: Arc<dyn BackingStore>,
    config: CacheConfig,
}

impl DatasetCache {
    pub fn new(store: Arc<dyn BackingStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Probe the backing store.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Cache a table for a session and return its new id.
    ///
    /// Fails with [`Error::Duplicate`] when a live dataset has the same hash
    /// or title; nothing is written in that case. The duplicate check and the
    /// write are not atomic with respect to concurrent adds.
    pub async fn add_dataset(
        &self,
        session_id: &str,
        draft: NewDataset,
        table: &Table,
    ) -> Result<String> {
        let keys = SessionKeys::new(session_id)?;
        let hash = draft.hash.clone().unwrap_or_else(|| table.content_hash());

        let mut live = self.live_entries(&keys).await?;
        let title = draft.effective_title();
        for meta in &live {
            let kind = if meta.hash == hash {
                DuplicateKind::Hash
            } else if meta.title == title {
                DuplicateKind::Title
            } else {
                continue;
            };
            debug!(
                session_id = %session_id,
                existing_id = %meta.id,
                kind = %kind,
                "Rejecting duplicate dataset"
            );
            return Err(Error::Duplicate {
                kind,
                existing_id: meta.id.clone(),
            });
        }

        while live.len() >= self.config.max_datasets_per_session {
            let oldest = live.remove(0);
            debug!(
                session_id = %session_id,
                dataset_id = %oldest.id,
                "Evicting oldest dataset to make room"
            );
            self.remove_dataset(session_id, &oldest.id).await?;
        }

        let id = Uuid::now_v7().to_string();
        let dataset = keys.dataset(&id)?;
        let meta = DatasetMeta::build(
            id.clone(),
            Utc::now(),
            draft,
            hash,
            table,
            self.config.preview_rows,
        );
        let ttl = self.config.ttl;
        let ops = [
            StoreOp::Set {
                key: dataset.meta().to_string(),
                value: encode(&meta)?,
                ttl,
            },
            StoreOp::Set {
                key: dataset.data().to_string(),
                value: encode(table)?,
                ttl,
            },
            StoreOp::SetAdd {
                key: keys.index(),
                member: id.clone(),
            },
            StoreOp::Expire {
                key: keys.index(),
                ttl,
            },
        ];
        self.store.execute_atomically(&ops).await?;

        debug!(
            session_id = %session_id,
            dataset_id = %id,
            rows = meta.num_rows,
            "Dataset cached"
        );
        Ok(id)
    }

    /// Metadata and table of a dataset, refreshing their TTL.
    ///
    /// A half-present or undecodable entry is discarded and reported absent.
    pub async fn get_dataset(
        &self,
        session_id: &str,
        dataset_id: &str,
    ) -> Result<Option<(DatasetMeta, Table)>> {
        let keys = SessionKeys::new(session_id)?;
        let dataset = keys.dataset(dataset_id)?;

        let meta_bytes = self.store.get(dataset.meta()).await?;
        let data_bytes = self.store.get(dataset.data()).await?;

        let entry = match (meta_bytes, data_bytes) {
            (Some(meta), Some(data)) => decode::<DatasetMeta>(&meta)
                .and_then(|meta| decode::<Table>(&data).map(|table| (meta, table))),
            (None, None) => {
                trace!(session_id = %session_id, dataset_id = %dataset_id, "Dataset cache miss");
                self.store.set_remove(&keys.index(), dataset_id).await?;
                return Ok(None);
            }
            _ => Err(Error::NotFound("dataset is missing its meta or data".to_string())),
        };

        match entry {
            Ok(entry) => {
                let ttl = self.config.ttl;
                let ops = [
                    StoreOp::Expire {
                        key: dataset.meta().to_string(),
                        ttl,
                    },
                    StoreOp::Expire {
                        key: dataset.data().to_string(),
                        ttl,
                    },
                    StoreOp::Expire {
                        key: keys.index(),
                        ttl,
                    },
                ];
                self.store.execute_atomically(&ops).await?;
                trace!(session_id = %session_id, dataset_id = %dataset_id, "Dataset cache hit");
                Ok(Some(entry))
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    dataset_id = %dataset_id,
                    error = %e,
                    "Discarding corrupt dataset entry"
                );
                self.discard(session_id, dataset_id).await;
                Ok(None)
            }
        }
    }

    /// Metadata of a dataset, refreshing only the meta key's TTL.
    pub async fn get_meta(&self, session_id: &str, dataset_id: &str) -> Result<Option<DatasetMeta>> {
        let keys = SessionKeys::new(session_id)?;
        let dataset = keys.dataset(dataset_id)?;

        let Some(bytes) = self.store.get(dataset.meta()).await? else {
            return Ok(None);
        };
        match decode::<DatasetMeta>(&bytes) {
            Ok(meta) => {
                self.store.expire(dataset.meta(), self.config.ttl).await?;
                Ok(Some(meta))
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    dataset_id = %dataset_id,
                    error = %e,
                    "Discarding corrupt dataset meta"
                );
                self.discard(session_id, dataset_id).await;
                Ok(None)
            }
        }
    }

    /// Live datasets of a session in insertion order.
    pub async fn list_datasets(&self, session_id: &str) -> Result<Vec<DatasetMeta>> {
        let keys = SessionKeys::new(session_id)?;
        let live = self.live_entries(&keys).await?;
        if !live.is_empty() {
            self.store.expire(&keys.index(), self.config.ttl).await?;
        }
        Ok(live)
    }

    /// Ids in the session index, refreshing the index TTL.
    pub async fn list_dataset_ids(&self, session_id: &str) -> Result<BTreeSet<String>> {
        let keys = SessionKeys::new(session_id)?;
        let index = keys.index();
        let ids = self.store.set_members(&index).await?;
        if !ids.is_empty() {
            self.store.expire(&index, self.config.ttl).await?;
        }
        Ok(ids)
    }

    /// Remove a dataset and all of its artifacts.
    ///
    /// Returns whether any of its keys existed.
    pub async fn remove_dataset(&self, session_id: &str, dataset_id: &str) -> Result<bool> {
        let keys = SessionKeys::new(session_id)?;
        let dataset = keys.dataset(dataset_id)?;

        let mut doomed = vec![dataset.meta().to_string(), dataset.data().to_string()];
        doomed.extend(self.store.scan_prefix(dataset.analysis_prefix()).await?);
        let removed = self.store.delete(&doomed).await?;
        self.store.set_remove(&keys.index(), dataset_id).await?;

        debug!(
            session_id = %session_id,
            dataset_id = %dataset_id,
            keys = removed,
            "Dataset removed"
        );
        Ok(removed > 0)
    }

    /// Cached analysis result, refreshing only that artifact's TTL.
    pub async fn get_artifact(
        &self,
        session_id: &str,
        dataset_id: &str,
        kind: &ArtifactKind,
    ) -> Result<Option<Value>> {
        let key = artifact_key(session_id, dataset_id, kind)?;
        let Some(bytes) = self.store.get(&key).await? else {
            trace!(session_id = %session_id, dataset_id = %dataset_id, kind = %kind, "Artifact cache miss");
            return Ok(None);
        };
        match decode::<Value>(&bytes) {
            Ok(value) => {
                self.store.expire(&key, self.config.ttl).await?;
                trace!(session_id = %session_id, dataset_id = %dataset_id, kind = %kind, "Artifact cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    dataset_id = %dataset_id,
                    kind = %kind,
                    error = %e,
                    "Discarding corrupt artifact"
                );
                if let Err(e) = self.store.delete(&[key]).await {
                    warn!(error = %e, "Failed to delete corrupt artifact");
                }
                Ok(None)
            }
        }
    }

    /// Store an analysis result for a dataset.
    ///
    /// The parent dataset is not checked; an orphaned artifact simply expires.
    pub async fn set_artifact(
        &self,
        session_id: &str,
        dataset_id: &str,
        kind: &ArtifactKind,
        value: &Value,
    ) -> Result<()> {
        let key = artifact_key(session_id, dataset_id, kind)?;
        self.store.set(&key, &encode(value)?, self.config.ttl).await?;
        trace!(session_id = %session_id, dataset_id = %dataset_id, kind = %kind, "Artifact cached");
        Ok(())
    }

    /// Delete every key of a session. Returns the number of keys removed.
    pub async fn purge_session(&self, session_id: &str) -> Result<usize> {
        let keys = SessionKeys::new(session_id)?;
        let all = self.store.scan_prefix(keys.prefix()).await?;
        let removed = self.store.delete(&all).await?;
        debug!(session_id = %session_id, keys = removed, "Session purged");
        Ok(removed)
    }

    /// Remaining lifetime of a dataset's metadata.
    pub async fn dataset_ttl(&self, session_id: &str, dataset_id: &str) -> Result<Option<Duration>> {
        let dataset = SessionKeys::new(session_id)?.dataset(dataset_id)?;
        self.store.ttl(dataset.meta()).await
    }

    /// Counts for one session.
    pub async fn session_stats(&self, session_id: &str) -> Result<SessionStats> {
        let keys = SessionKeys::new(session_id)?;
        let datasets = self.store.set_members(&keys.index()).await?.len();
        let artifacts = self
            .store
            .scan_prefix(keys.prefix())
            .await?
            .iter()
            .filter(|key| key.contains(":analysis:"))
            .count();
        Ok(SessionStats {
            datasets,
            artifacts,
            capacity: self.config.max_datasets_per_session,
        })
    }

    /// Decodable entries of the session index, oldest first.
    ///
    /// Members whose meta expired are dropped from the index, undecodable
    /// ones are deleted.
    async fn live_entries(&self, keys: &SessionKeys) -> Result<Vec<DatasetMeta>> {
        let index = keys.index();
        let mut live = Vec::new();
        for id in self.store.set_members(&index).await? {
            let dataset = match keys.dataset(&id) {
                Ok(dataset) => dataset,
                Err(e) => {
                    warn!(dataset_id = %id, error = %e, "Dropping invalid index member");
                    self.store.set_remove(&index, &id).await?;
                    continue;
                }
            };
            match self.store.get(dataset.meta()).await? {
                Some(bytes) => match decode::<DatasetMeta>(&bytes) {
                    Ok(meta) => live.push(meta),
                    Err(e) => {
                        warn!(dataset_id = %id, error = %e, "Deleting corrupt dataset meta");
                        self.delete_entry(keys, &dataset).await?;
                    }
                },
                None => {
                    trace!(dataset_id = %id, "Pruning expired index member");
                    self.delete_entry(keys, &dataset).await?;
                }
            }
        }
        live.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(live)
    }

    /// Delete a dead entry's remaining keys, artifacts included, and its
    /// index member.
    async fn delete_entry(&self, keys: &SessionKeys, dataset: &DatasetKeys) -> Result<()> {
        let mut doomed = vec![dataset.meta().to_string(), dataset.data().to_string()];
        doomed.extend(self.store.scan_prefix(dataset.analysis_prefix()).await?);
        self.store.delete(&doomed).await?;
        self.store
            .set_remove(&keys.index(), dataset.dataset_id())
            .await
    }

    /// Best-effort removal of a broken or vanished entry.
    async fn discard(&self, session_id: &str, dataset_id: &str) {
        if let Err(e) = self.remove_dataset(session_id, dataset_id).await {
            warn!(
                session_id = %session_id,
                dataset_id = %dataset_id,
                error = %e,
                "Failed to discard dataset entry"
            );
        }
    }
}

fn artifact_key(session_id: &str, dataset_id: &str, kind: &ArtifactKind) -> Result<String> {
    SessionKeys::new(session_id)?
        .dataset(dataset_id)?
        .artifact(kind.tag())
}

/// Counts for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Ids currently in the session index.
    pub datasets: usize,

    /// Cached analysis artifacts across all datasets.
    pub artifacts: usize,

    /// Configured dataset cap.
    pub capacity: usize,
}

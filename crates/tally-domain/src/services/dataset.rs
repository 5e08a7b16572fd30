//! Dataset service for the domain layer.
//!
//! Wraps [`DatasetCache`] with the ingestion flow: basic statistics are
//! computed up front and handed to the summarizer so the cached metadata
//! carries a summary. Cache outages are hard failures here, since storing
//! the dataset is the whole point of the call.

use std::sync::Arc;
use std::time::Duration;

use tally_session::{DatasetCache, DatasetMeta, NewDataset};
use tally_types::Table;
use tracing::{debug, info};

use crate::error::{DomainError, Result};
use crate::summarizer::{Summarizer, fallback_summary, summarize_or_fallback};

/// Domain service for dataset lifecycle operations.
#[derive(Clone)]
pub struct DatasetService {
    cache: DatasetCache,
    summarizer: Arc<dyn Summarizer>,
}

impl DatasetService {
    pub fn new(cache: DatasetCache, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { cache, summarizer }
    }

    /// Cache a table for a session, attaching a generated summary.
    ///
    /// A summary already present on `draft` is kept as is.
    pub async fn ingest(
        &self,
        session_id: &str,
        mut draft: NewDataset,
        table: &Table,
    ) -> Result<DatasetMeta> {
        if draft.summary.is_none() {
            let summary = match tally_analysis::basic_statistics(table) {
                Ok(stats) => {
                    let stats = serde_json::to_value(&stats)?;
                    summarize_or_fallback(self.summarizer.as_ref(), &stats).await
                }
                Err(e) => fallback_summary(&e),
            };
            draft.summary = Some(summary);
        }

        let id = self.cache.add_dataset(session_id, draft, table).await?;
        let meta = self
            .cache
            .get_meta(session_id, &id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("dataset {id} vanished after insert")))?;

        info!(
            session_id = %session_id,
            dataset_id = %id,
            rows = meta.num_rows,
            "Dataset ingested"
        );
        Ok(meta)
    }

    /// Metadata and table of a cached dataset.
    pub async fn load(&self, session_id: &str, dataset_id: &str) -> Result<(DatasetMeta, Table)> {
        self.cache
            .get_dataset(session_id, dataset_id)
            .await?
            .ok_or_else(|| not_found(dataset_id))
    }

    /// Metadata of a cached dataset without loading the table.
    pub async fn meta(&self, session_id: &str, dataset_id: &str) -> Result<DatasetMeta> {
        self.cache
            .get_meta(session_id, dataset_id)
            .await?
            .ok_or_else(|| not_found(dataset_id))
    }

    /// Live datasets of a session, oldest first.
    pub async fn list(&self, session_id: &str) -> Result<Vec<DatasetMeta>> {
        Ok(self.cache.list_datasets(session_id).await?)
    }

    /// Remove a dataset and its cached analyses.
    pub async fn remove(&self, session_id: &str, dataset_id: &str) -> Result<()> {
        if self.cache.remove_dataset(session_id, dataset_id).await? {
            Ok(())
        } else {
            Err(not_found(dataset_id))
        }
    }

    /// Drop everything cached for a session. Returns the number of keys removed.
    pub async fn purge(&self, session_id: &str) -> Result<usize> {
        let removed = self.cache.purge_session(session_id).await?;
        debug!(session_id = %session_id, keys = removed, "Session purged");
        Ok(removed)
    }

    /// Time left before a dataset expires.
    pub async fn ttl(&self, session_id: &str, dataset_id: &str) -> Result<Option<Duration>> {
        Ok(self.cache.dataset_ttl(session_id, dataset_id).await?)
    }
}

fn not_found(dataset_id: &str) -> DomainError {
    DomainError::NotFound(format!("dataset {dataset_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticSummarizer;
    use crate::summarizer::testing::FailingSummarizer;
    use std::sync::atomic::Ordering;
    use tally_session::{CacheConfig, DuplicateKind, MemoryStore};
    use tally_types::Column;

    fn table(seed: f64) -> Table {
        Table::new(vec![
            Column::from_numbers("x", [seed, seed + 1.0, seed + 2.0]),
            Column::from_strings("label", ["a", "b", "c"]),
        ])
        .unwrap()
    }

    fn service(store: Arc<MemoryStore>, summarizer: Arc<dyn Summarizer>) -> DatasetService {
        DatasetService::new(DatasetCache::new(store, CacheConfig::default()), summarizer)
    }

    #[tokio::test]
    async fn test_ingest_attaches_summary() {
        let svc = service(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticSummarizer::new("three rows")),
        );
        let meta = svc
            .ingest("s1", NewDataset::new("a.csv"), &table(1.0))
            .await
            .unwrap();

        assert_eq!(meta.summary.as_deref(), Some("three rows"));
        assert_eq!(meta.num_rows, 3);

        let (loaded, t) = svc.load("s1", &meta.id).await.unwrap();
        assert_eq!(loaded, meta);
        assert_eq!(t, table(1.0));
    }

    #[tokio::test]
    async fn test_summary_failure_does_not_block_ingest() {
        let summarizer = Arc::new(FailingSummarizer::default());
        let svc = service(Arc::new(MemoryStore::new()), summarizer.clone());

        let meta = svc
            .ingest("s1", NewDataset::new("a.csv"), &table(1.0))
            .await
            .unwrap();

        assert_eq!(
            meta.summary.as_deref(),
            Some("Failed to generate summary: rate limited")
        );
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_given_summary_skips_summarizer() {
        let summarizer = Arc::new(FailingSummarizer::default());
        let svc = service(Arc::new(MemoryStore::new()), summarizer.clone());

        let draft = NewDataset::new("a.csv").with_summary("hand written");
        let meta = svc.ingest("s1", draft, &table(1.0)).await.unwrap();

        assert_eq!(meta.summary.as_deref(), Some("hand written"));
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_maps_to_domain_error() {
        let svc = service(Arc::new(MemoryStore::new()), Arc::new(StaticSummarizer::default()));
        let first = svc
            .ingest("s1", NewDataset::new("a.csv"), &table(1.0))
            .await
            .unwrap();

        let err = svc
            .ingest("s1", NewDataset::new("b.csv"), &table(1.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Duplicate { kind: DuplicateKind::Hash, ref existing_id } if *existing_id == first.id
        ));
        assert_eq!(svc.list("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_not_found() {
        let svc = service(Arc::new(MemoryStore::new()), Arc::new(StaticSummarizer::default()));
        assert!(matches!(
            svc.load("s1", "nope").await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            svc.remove("s1", "nope").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_and_purge() {
        let svc = service(Arc::new(MemoryStore::new()), Arc::new(StaticSummarizer::default()));
        let a = svc
            .ingest("s1", NewDataset::new("a.csv"), &table(1.0))
            .await
            .unwrap();
        svc.ingest("s1", NewDataset::new("b.csv"), &table(5.0))
            .await
            .unwrap();

        assert!(svc.ttl("s1", &a.id).await.unwrap().is_some());
        svc.remove("s1", &a.id).await.unwrap();
        assert_eq!(svc.list("s1").await.unwrap().len(), 1);

        assert!(svc.purge("s1").await.unwrap() > 0);
        assert!(svc.list("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outage_is_service_unavailable() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), Arc::new(StaticSummarizer::default()));
        store.set_available(false);

        let err = svc
            .ingest("s1", NewDataset::new("a.csv"), &table(1.0))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(svc.load("s1", "any").await.unwrap_err().is_unavailable());
    }
}

//! Cached analysis service.
//!
//! Every analysis is looked up in the artifact cache first and computed on a
//! miss. The cache is an accelerator here: when it is unreachable the result
//! is computed and returned without being stored.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tally_analysis::{
    AnalysisConfig, BasicStatistics, CorrelationReport, Overview, ShapeStatistics,
};
use tally_session::{ArtifactKind, DatasetCache};
use tally_types::Table;
use tracing::{debug, warn};

use crate::error::{DomainError, Result};
use crate::summarizer::{Summarizer, summarize_or_fallback};

/// An analysis result and whether it came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzed<T> {
    pub value: T,
    pub from_cache: bool,
}

/// Narrative summary of a dataset, cached under `gpt_insights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GptInsights {
    pub summary: String,
    pub highlights: Vec<String>,
}

/// Domain service for cached analyses.
#[derive(Clone)]
pub struct AnalysisService {
    cache: DatasetCache,
    config: AnalysisConfig,
    summarizer: Arc<dyn Summarizer>,
}

impl AnalysisService {
    pub fn new(cache: DatasetCache, config: AnalysisConfig, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            cache,
            config,
            summarizer,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Return the cached artifact of `kind`, or compute and cache it.
    ///
    /// A cached value that no longer decodes into `T` is recomputed and
    /// overwritten. Failing to persist a fresh result is logged, not returned.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        session_id: &str,
        dataset_id: &str,
        kind: ArtifactKind,
        compute: F,
    ) -> Result<Analyzed<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let persist = match self.cache.get_artifact(session_id, dataset_id, &kind).await {
            Ok(Some(cached)) => match serde_json::from_value::<T>(cached) {
                Ok(value) => {
                    debug!(session_id = %session_id, dataset_id = %dataset_id, kind = %kind, "Serving cached analysis");
                    return Ok(Analyzed {
                        value,
                        from_cache: true,
                    });
                }
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        dataset_id = %dataset_id,
                        kind = %kind,
                        error = %e,
                        "Cached analysis has an unexpected shape, recomputing"
                    );
                    true
                }
            },
            Ok(None) => true,
            Err(e) if e.is_unavailable() => {
                warn!(
                    session_id = %session_id,
                    dataset_id = %dataset_id,
                    kind = %kind,
                    error = %e,
                    "Analysis cache unavailable, computing without caching"
                );
                false
            }
            Err(e) => return Err(e.into()),
        };

        let value = compute().await?;

        if persist {
            let json = serde_json::to_value(&value)?;
            if let Err(e) = self
                .cache
                .set_artifact(session_id, dataset_id, &kind, &json)
                .await
            {
                warn!(
                    session_id = %session_id,
                    dataset_id = %dataset_id,
                    kind = %kind,
                    error = %e,
                    "Failed to cache analysis result"
                );
            }
        }

        Ok(Analyzed {
            value,
            from_cache: false,
        })
    }

    pub async fn basic_statistics(
        &self,
        session_id: &str,
        dataset_id: &str,
        table: &Table,
    ) -> Result<Analyzed<BasicStatistics>> {
        self.get_or_compute(session_id, dataset_id, ArtifactKind::BasicStats, move || async move {
            tally_analysis::basic_statistics(table).map_err(DomainError::from)
        })
        .await
    }

    pub async fn skewness_kurtosis(
        &self,
        session_id: &str,
        dataset_id: &str,
        table: &Table,
    ) -> Result<Analyzed<ShapeStatistics>> {
        self.get_or_compute(
            session_id,
            dataset_id,
            ArtifactKind::SkewnessKurtosis,
            move || async move { tally_analysis::skewness_kurtosis(table).map_err(DomainError::from) },
        )
        .await
    }

    pub async fn correlation(
        &self,
        session_id: &str,
        dataset_id: &str,
        table: &Table,
    ) -> Result<Analyzed<CorrelationReport>> {
        self.get_or_compute(session_id, dataset_id, ArtifactKind::Correlation, move || async move {
            tally_analysis::correlation(table).map_err(DomainError::from)
        })
        .await
    }

    pub async fn overview(
        &self,
        session_id: &str,
        dataset_id: &str,
        table: &Table,
    ) -> Result<Analyzed<Overview>> {
        let config = &self.config;
        self.get_or_compute(session_id, dataset_id, ArtifactKind::Overview, move || async move {
            tally_analysis::overview(table, config).map_err(DomainError::from)
        })
        .await
    }

    /// Summary and highlights built on the (cached) overview.
    pub async fn insights(
        &self,
        session_id: &str,
        dataset_id: &str,
        table: &Table,
    ) -> Result<Analyzed<GptInsights>> {
        self.get_or_compute(session_id, dataset_id, ArtifactKind::GptInsights, move || async move {
            let overview = self.overview(session_id, dataset_id, table).await?.value;
            let stats = serde_json::to_value(&overview)?;
            let summary = summarize_or_fallback(self.summarizer.as_ref(), &stats).await;
            Ok::<_, DomainError>(GptInsights {
                summary,
                highlights: overview.highlights,
            })
        })
        .await
    }
}

//! Domain services.
//!
//! This module contains the services that orchestrate Tally's dataset
//! cache, analysis engine and summarizer.

pub mod analysis;
pub mod dataset;

use std::sync::Arc;

use tally_analysis::AnalysisConfig;
use tally_config::{StoreBackend, TallyConfig};
use tally_session::{BackingStore, CacheConfig, DatasetCache, MemoryStore, RedisConfig, RedisStore};
use tracing::info;

use crate::error::Result;
use crate::summarizer::Summarizer;

/// Domain services facade.
///
/// Provides unified access to all domain services. This is the main entry
/// point for transport layers to interact with Tally's core functionality.
#[derive(Clone)]
pub struct DomainServices {
    cache: DatasetCache,
    /// Dataset ingestion and lifecycle.
    datasets: dataset::DatasetService,
    /// Cached analyses.
    analysis: analysis::AnalysisService,
}

impl DomainServices {
    /// Create new domain services over an existing cache.
    pub fn new(
        cache: DatasetCache,
        analysis_config: AnalysisConfig,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        info!(
            ttl_secs = cache.config().ttl.as_secs(),
            max_datasets = cache.config().max_datasets_per_session,
            "Initializing domain services"
        );

        let datasets = dataset::DatasetService::new(cache.clone(), summarizer.clone());
        let analysis = analysis::AnalysisService::new(cache.clone(), analysis_config, summarizer);

        Self {
            cache,
            datasets,
            analysis,
        }
    }

    /// Build the store, cache and services described by a config.
    ///
    /// No connection is made here; a Redis store connects on first use.
    pub fn from_config(config: &TallyConfig, summarizer: Arc<dyn Summarizer>) -> Result<Self> {
        config.validate()?;

        let store = config.store();
        let backing: Arc<dyn BackingStore> = match store.backend {
            StoreBackend::Redis => Arc::new(RedisStore::new(
                RedisConfig::new(store.url.clone())
                    .with_connect_timeout(store.connect_timeout())
                    .with_operation_timeout(store.operation_timeout()),
            )?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };

        let cache = config.cache();
        let cache_config = CacheConfig::new()
            .with_ttl(cache.ttl())
            .with_max_datasets(cache.max_datasets_per_session)
            .with_preview_rows(cache.preview_rows);

        Ok(Self::new(
            DatasetCache::new(backing, cache_config),
            analysis_config(config),
            summarizer,
        ))
    }

    /// Get the dataset service.
    pub fn datasets(&self) -> &dataset::DatasetService {
        &self.datasets
    }

    /// Get the analysis service.
    pub fn analysis(&self) -> &analysis::AnalysisService {
        &self.analysis
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }
}

fn analysis_config(config: &TallyConfig) -> AnalysisConfig {
    let section = config.analysis();
    AnalysisConfig {
        correlation_threshold: section.correlation_threshold,
        high_cardinality_threshold: section.high_cardinality_threshold,
        max_categories_for_chi2: section.max_categories_for_chi2,
        normality_min_samples: section.normality_min_samples,
        significance: section.significance,
        overview_top_values: section.overview_top_values,
    }
}

//! Domain facade for Tally.
//!
//! This crate sits between transport layers (CLI, HTTP handlers) and the
//! infrastructure crates, providing:
//!
//! - **Dataset ingestion**: caches a table with a generated summary
//! - **Cached analysis**: serves analysis artifacts from the cache, computing
//!   them on a miss and degrading to compute-only when the store is down
//! - **Insights**: a narrative summary over the dataset overview
//!
//! # Example
//!
//! ```ignore
//! use tally_domain::{DomainServices, StaticSummarizer};
//!
//! let services = DomainServices::from_config(&config, Arc::new(StaticSummarizer::default()))?;
//! let meta = services.datasets().ingest("sid", NewDataset::new("sales.csv"), &table).await?;
//! let stats = services.analysis().basic_statistics("sid", &meta.id, &table).await?;
//! ```

mod error;
pub mod services;
pub mod summarizer;

pub use error::{DomainError, Result};
pub use services::DomainServices;
pub use services::analysis::{AnalysisService, Analyzed, GptInsights};
pub use services::dataset::DatasetService;
pub use summarizer::{StaticSummarizer, SummarizeError, Summarizer};

// Re-export key types from infrastructure crates for convenience
pub use tally_session::{ArtifactKind, DatasetMeta, NewDataset};

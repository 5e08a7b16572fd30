//! Text summaries of dataset statistics.
//!
//! Summaries are enrichment: a failing [`Summarizer`] never fails the
//! operation that asked for it. [`summarize_or_fallback`] turns the error
//! into a placeholder string.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Error returned by a summarizer backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SummarizeError(pub String);

/// Produces a human-readable summary from computed statistics.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, stats: &Value) -> Result<String, SummarizeError>;
}

/// Summarizer that always returns the same text.
#[derive(Debug, Clone)]
pub struct StaticSummarizer {
    text: String,
}

impl StaticSummarizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for StaticSummarizer {
    fn default() -> Self {
        Self::new("Summary generation is not configured for this deployment.")
    }
}

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, _stats: &Value) -> Result<String, SummarizeError> {
        Ok(self.text.clone())
    }
}

/// Fallback text stored when summarization fails.
pub fn fallback_summary(error: &dyn std::fmt::Display) -> String {
    format!("Failed to generate summary: {error}")
}

/// Summarize, replacing any failure with [`fallback_summary`].
pub async fn summarize_or_fallback(summarizer: &dyn Summarizer, stats: &Value) -> String {
    match summarizer.summarize(stats).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "Summary generation failed, storing fallback");
            fallback_summary(&e)
        }
    }
}

//! Records stored alongside cached datasets.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_types::{Preview, Table};

/// Caller-supplied description of a dataset about to be cached.
///
/// The cache assigns the id and creation time; everything else is either
/// given here or derived from the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDataset {
    pub filename: String,
    pub title: Option<String>,
    pub size: Option<u64>,
    pub hash: Option<String>,
    pub summary: Option<String>,
}

impl NewDataset {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Original upload size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Precomputed content hash, e.g. of the uploaded file.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Title used for duplicate detection: explicit title or the filename.
    pub fn effective_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.filename)
    }
}

/// Metadata of a cached dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub id: String,
    pub filename: String,
    pub title: String,
    /// Insertion time; also the FIFO eviction key.
    pub created_at: DateTime<Utc>,
    pub size: u64,
    pub num_rows: usize,
    pub columns: Vec<String>,
    pub hash: String,
    pub preview: Preview,
    #[serde(default)]
    pub summary: Option<String>,
}

impl DatasetMeta {
    pub(crate) fn build(
        id: String,
        created_at: DateTime<Utc>,
        draft: NewDataset,
        hash: String,
        table: &Table,
        preview_rows: usize,
    ) -> Self {
        let size = draft
            .size
            .unwrap_or_else(|| table.canonical_csv().len() as u64);
        let title = draft.effective_title().to_string();
        Self {
            id,
            filename: draft.filename,
            title,
            created_at,
            size,
            num_rows: table.row_count(),
            columns: table.column_names(),
            hash,
            preview: table.preview(preview_rows),
            summary: draft.summary,
        }
    }
}

/// Kind of cached analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    BasicStats,
    SkewnessKurtosis,
    Correlation,
    Overview,
    GptInsights,
    /// Any other result, stored under its own tag.
    Custom(String),
}

impl ArtifactKind {
    /// Tag used as the last key component.
    pub fn tag(&self) -> &str {
        match self {
            ArtifactKind::BasicStats => "basic_stats",
            ArtifactKind::SkewnessKurtosis => "skewness_kurtosis",
            ArtifactKind::Correlation => "correlation",
            ArtifactKind::Overview => "overview",
            ArtifactKind::GptInsights => "gpt_insights",
            ArtifactKind::Custom(tag) => tag,
        }
    }

    /// Parse a tag, falling back to [`ArtifactKind::Custom`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "basic_stats" => ArtifactKind::BasicStats,
            "skewness_kurtosis" => ArtifactKind::SkewnessKurtosis,
            "correlation" => ArtifactKind::Correlation,
            "overview" => ArtifactKind::Overview,
            "gpt_insights" => ArtifactKind::GptInsights,
            other => ArtifactKind::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

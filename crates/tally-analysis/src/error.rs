//! Error types for analysis routines.

/// Error type for analysis routines.
///
/// Only conditions that leave nothing to compute are errors. Statistics that
/// are undefined for a particular column come back as `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The table has no columns or no rows.
    #[error("{computation}: dataset is empty")]
    EmptyTable { computation: &'static str },

    /// The computation needs at least one numeric column.
    #[error("{computation}: dataset has no numeric columns")]
    NoNumericColumns { computation: &'static str },

    /// A per-column computation was given a column of the wrong kind.
    #[error("{computation}: column '{column}' is not numeric")]
    ColumnNotNumeric {
        computation: &'static str,
        column: String,
    },

    /// Neither a numeric column nor two text columns to correlate.
    #[error("correlation: need a numeric column or two categorical columns")]
    NothingToCorrelate,
}

impl AnalysisError {
    /// Column the error refers to, if it is about a single column.
    pub fn column(&self) -> Option<&str> {
        match self {
            AnalysisError::ColumnNotNumeric { column, .. } => Some(column),
            _ => None,
        }
    }
}

/// Result type for analysis routines.
pub type Result<T> = std::result::Result<T, AnalysisError>;

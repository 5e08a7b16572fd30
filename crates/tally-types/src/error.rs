//! Error types for table construction.

/// Errors raised when assembling a [`Table`](crate::Table).
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A column's length differs from the first column's length.
    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Two columns share the same name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

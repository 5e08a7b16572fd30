//! Error types for dataset cache operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which field collided during duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    /// Same content hash as an existing dataset.
    Hash,
    /// Same title as an existing dataset.
    Title,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateKind::Hash => f.write_str("hash"),
            DuplicateKind::Title => f.write_str("title"),
        }
    }
}

/// Error type for dataset cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store is unreachable, timed out or rejected the command.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A dataset with the same hash or title already exists in the session.
    #[error("A dataset with the same {kind} already exists in this session: {existing_id}")]
    Duplicate {
        kind: DuplicateKind,
        existing_id: String,
    },

    /// Requested dataset or artifact does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A session id, dataset id or artifact tag cannot be used in a key.
    #[error("Invalid key component: {0}")]
    InvalidKey(String),
}

impl Error {
    /// Whether this error means the store itself is degraded.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Unavailable(e.to_string())
    }
}

/// Result type for dataset cache operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Domain error types.

use tally_analysis::AnalysisError;
use tally_session::DuplicateKind;
use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Dataset or session entry not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A dataset with the same content or title is already cached.
    #[error("Duplicate dataset ({kind}): already cached as {existing_id}")]
    Duplicate {
        kind: DuplicateKind,
        existing_id: String,
    },

    /// The backing store cannot be reached.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Caller-supplied identifiers or data were rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested analysis could not be computed.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DomainError::ServiceUnavailable(_))
    }
}

impl From<tally_session::Error> for DomainError {
    fn from(err: tally_session::Error) -> Self {
        use tally_session::Error;
        match err {
            Error::Unavailable(msg) => DomainError::ServiceUnavailable(msg),
            Error::Duplicate { kind, existing_id } => DomainError::Duplicate { kind, existing_id },
            Error::NotFound(msg) => DomainError::NotFound(msg),
            Error::InvalidKey(msg) => DomainError::InvalidInput(msg),
            Error::Serialization(msg) => DomainError::Internal(msg),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Internal(err.to_string())
    }
}

impl From<tally_config::ConfigError> for DomainError {
    fn from(err: tally_config::ConfigError) -> Self {
        DomainError::InvalidInput(err.to_string())
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_errors_map_to_domain_kinds() {
        let err: DomainError = tally_session::Error::Unavailable("timeout".into()).into();
        assert!(err.is_unavailable());

        let err: DomainError = tally_session::Error::Duplicate {
            kind: DuplicateKind::Title,
            existing_id: "abc".into(),
        }
        .into();
        assert!(matches!(
            err,
            DomainError::Duplicate { kind: DuplicateKind::Title, ref existing_id } if existing_id == "abc"
        ));

        let err: DomainError = tally_session::Error::InvalidKey("bad:id".into()).into();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}

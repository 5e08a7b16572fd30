//! Storage key construction.
//!
//! Every key of a session lives under `session:{sid}:` so a whole session can
//! be enumerated or purged with one prefix scan:
//!
//! ```text
//! session:{sid}:datasets                       set of dataset ids
//! session:{sid}:dataset:{did}:meta             encoded DatasetMeta
//! session:{sid}:dataset:{did}:data             encoded Table
//! session:{sid}:dataset:{did}:analysis:{kind}  encoded artifact
//! ```
//!
//! Components are validated before use: the delimiter, whitespace, control
//! characters and glob metacharacters are rejected, which keeps the mapping
//! injective and makes prefix scans exact.

use crate::error::{Error, Result};

const ROOT: &str = "session";
const MAX_COMPONENT_LEN: usize = 128;
const FORBIDDEN: &[char] = &[':', '*', '?', '[', ']', '\\'];

/// Check that `value` can be embedded in a key as a single component.
pub fn validate_component(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidKey(format!("{what} must not be empty")));
    }
    if value.len() > MAX_COMPONENT_LEN {
        return Err(Error::InvalidKey(format!(
            "{what} exceeds {MAX_COMPONENT_LEN} bytes"
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_whitespace() || c.is_control())
    {
        return Err(Error::InvalidKey(format!(
            "{what} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// Keys scoped to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    prefix: String,
}

impl SessionKeys {
    pub fn new(session_id: &str) -> Result<Self> {
        validate_component("session id", session_id)?;
        Ok(Self {
            prefix: format!("{ROOT}:{session_id}:"),
        })
    }

    /// Prefix shared by every key of the session.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Set of dataset ids held by the session.
    pub fn index(&self) -> String {
        format!("{}datasets", self.prefix)
    }

    /// Keys of one dataset in this session.
    pub fn dataset(&self, dataset_id: &str) -> Result<DatasetKeys> {
        validate_component("dataset id", dataset_id)?;
        let base = format!("{}dataset:{dataset_id}:", self.prefix);
        Ok(DatasetKeys {
            dataset_id: dataset_id.to_string(),
            meta: format!("{base}meta"),
            data: format!("{base}data"),
            analysis_prefix: format!("{base}analysis:"),
        })
    }
}

/// Keys of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetKeys {
    dataset_id: String,
    meta: String,
    data: String,
    analysis_prefix: String,
}

impl DatasetKeys {
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn meta(&self) -> &str {
        &self.meta
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Prefix of every analysis artifact of the dataset.
    pub fn analysis_prefix(&self) -> &str {
        &self.analysis_prefix
    }

    /// Key of one analysis artifact.
    pub fn artifact(&self, tag: &str) -> Result<String> {
        validate_component("artifact kind", tag)?;
        Ok(format!("{}{tag}", self.analysis_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let session = SessionKeys::new("abc").unwrap();
        let dataset = session.dataset("d1").unwrap();

        assert_eq!(session.prefix(), "session:abc:");
        assert_eq!(session.index(), "session:abc:datasets");
        assert_eq!(dataset.meta(), "session:abc:dataset:d1:meta");
        assert_eq!(dataset.data(), "session:abc:dataset:d1:data");
        assert_eq!(
            dataset.artifact("basic_stats").unwrap(),
            "session:abc:dataset:d1:analysis:basic_stats"
        );
        assert_eq!(
            dataset.analysis_prefix(),
            "session:abc:dataset:d1:analysis:"
        );
    }

    #[test]
    fn test_all_keys_share_session_prefix() {
        let session = SessionKeys::new("s-1").unwrap();
        let dataset = session.dataset("x").unwrap();
        for key in [
            session.index(),
            dataset.meta().to_string(),
            dataset.data().to_string(),
            dataset.artifact("overview").unwrap(),
        ] {
            assert!(key.starts_with(session.prefix()), "{key}");
        }
    }

    #[test]
    fn test_delimiter_rejected() {
        // "a:dataset:b" would otherwise alias another session's dataset keys
        assert!(matches!(
            SessionKeys::new("a:dataset:b"),
            Err(Error::InvalidKey(_))
        ));
        let session = SessionKeys::new("a").unwrap();
        assert!(session.dataset("x:meta").is_err());
        assert!(session.dataset("x").unwrap().artifact("a:b").is_err());
    }

    #[test]
    fn test_glob_whitespace_and_empty_rejected() {
        for bad in ["", "a*", "a?", "[a]", "a b", "a\\b", "a\nb"] {
            assert!(SessionKeys::new(bad).is_err(), "{bad:?} accepted");
        }
        assert!(SessionKeys::new(&"x".repeat(MAX_COMPONENT_LEN + 1)).is_err());
        assert!(SessionKeys::new(&"x".repeat(MAX_COMPONENT_LEN)).is_ok());
    }
}

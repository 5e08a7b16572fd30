//! Errors raised while loading, validating or saving configuration.

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the config schema.
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field parsed but holds an unusable value.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

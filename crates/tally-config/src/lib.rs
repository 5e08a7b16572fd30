//! Configuration system for Tally.
//!
//! Provides TOML-based configuration with:
//! - Cache TTL and per-session capacity (`[cache]`)
//! - Backing store selection and timeouts (`[store]`)
//! - Analysis thresholds (`[analysis]`)
//! - Config file layering (user config dir + project-local overrides)
//! - `TALLY_REDIS_URL` environment override for the store URL

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, config_dir, config_path, load_config, load_config_file,
    load_config_with_options, log_dir, save_config,
};
pub use error::{ConfigError, Result};
pub use types::*;

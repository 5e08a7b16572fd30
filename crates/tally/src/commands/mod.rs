//! CLI command handlers.

pub mod analyze;
pub mod datasets;
pub mod ingest;
pub mod purge;
pub mod remove;
pub mod show;
pub mod status;

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tally_config::TallyConfig;
use tally_domain::DomainServices;

/// Shared context for all commands.
pub struct Context {
    /// Services built from the effective config.
    pub services: DomainServices,
    /// Effective configuration.
    pub config: TallyConfig,
    /// Config files that contributed to `config`.
    pub config_sources: Vec<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Human-readable duration, e.g. `29m 59s`.
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

/// Shorten text to `max` characters, appending an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

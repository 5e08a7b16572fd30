//! Tally - session-scoped dataset cache and statistics engine
//!
//! Main entry point for the Tally operator CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tally_config::{LoadedConfig, TallyConfig};
use tally_domain::{DomainServices, StaticSummarizer};

mod commands;

use commands::{analyze, datasets, ingest, purge, remove, show, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Tally - session-scoped dataset cache and statistics engine
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of the discovered layers
    #[arg(long, global = true, env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the backing store and show the effective configuration
    Status(status::StatusArgs),

    /// List the datasets cached for a session
    Datasets(datasets::DatasetsArgs),

    /// Show a cached dataset's metadata and preview
    Show(show::ShowArgs),

    /// Cache a table from a JSON file
    Ingest(ingest::IngestArgs),

    /// Run a cached analysis on a dataset
    Analyze(analyze::AnalyzeArgs),

    /// Remove a dataset and its cached analyses
    Remove(remove::RemoveArgs),

    /// Remove everything cached for a session
    Purge(purge::PurgeArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "tally=debug,tally_domain=debug,tally_session=debug,tally_analysis=debug,tally_config=debug,info"
    } else {
        "tally=info,tally_domain=info,tally_session=warn,warn"
    };

    let log_dir = tally_config::log_dir().unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "tally.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "tally=trace,tally_domain=trace,tally_session=trace,tally_analysis=trace,tally_config=trace,info",
                )),
        )
        .init();

    let (config, sources) = load_config(cli.config.as_deref())?;
    let services = DomainServices::from_config(&config, Arc::new(StaticSummarizer::default()))
        .context("failed to initialize services")?;

    let ctx = commands::Context {
        services,
        config,
        config_sources: sources,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Datasets(args) => datasets::run(args, &ctx).await,
        Commands::Show(args) => show::run(args, &ctx).await,
        Commands::Ingest(args) => ingest::run(args, &ctx).await,
        Commands::Analyze(args) => analyze::run(args, &ctx).await,
        Commands::Remove(args) => remove::run(args, &ctx).await,
        Commands::Purge(args) => purge::run(args, &ctx).await,
    }
}

/// Explicit config file, or the discovered layers.
fn load_config(path: Option<&std::path::Path>) -> Result<(TallyConfig, Vec<PathBuf>)> {
    if let Some(path) = path {
        let config = tally_config::load_config_file(path)?;
        config.validate()?;
        return Ok((config, vec![path.to_path_buf()]));
    }

    let LoadedConfig {
        config,
        sources,
        warnings,
        ..
    } = tally_config::load_config(None)?;
    for warning in warnings {
        tracing::warn!("{warning}");
    }
    let loaded = sources
        .into_iter()
        .filter(|s| s.loaded)
        .map(|s| s.path)
        .collect();
    Ok((config, loaded))
}

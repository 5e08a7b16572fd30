//! Status command - checks the backing store and shows the effective config.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also show analysis thresholds
    #[arg(short, long)]
    pub detailed: bool,
}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    backend: String,
    url: Option<String>,
    reachable: bool,
    error: Option<String>,
    ttl_secs: u64,
    max_datasets_per_session: usize,
    config_sources: Vec<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let store = ctx.config.store();
    let cache = ctx.config.cache();
    let probe = ctx.services.cache().ping().await;
    let url = (store.backend == tally_config::StoreBackend::Redis).then(|| store.url.clone());

    if ctx.json_output {
        let output = StatusOutput {
            backend: store.backend.to_string(),
            url,
            reachable: probe.is_ok(),
            error: probe.as_ref().err().map(|e| e.to_string()),
            ttl_secs: cache.ttl_secs,
            max_datasets_per_session: cache.max_datasets_per_session,
            config_sources: ctx
                .config_sources
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        };
        return super::print_json(&output);
    }

    let dim = Style::new().dim();

    println!();
    println!("{}", style("Tally Cache Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    match &probe {
        Ok(()) => println!(
            "  {} {}",
            dim.apply_to("Store:"),
            Style::new().green().apply_to("● reachable")
        ),
        Err(_) => println!(
            "  {} {}",
            dim.apply_to("Store:"),
            Style::new().red().apply_to("● unreachable")
        ),
    }
    println!("  {} {}", dim.apply_to("Backend:"), store.backend);
    if let Some(url) = &url {
        println!("  {} {}", dim.apply_to("URL:"), url);
    }
    println!("  {} {}s", dim.apply_to("TTL:"), cache.ttl_secs);
    println!(
        "  {} {} datasets per session",
        dim.apply_to("Capacity:"),
        cache.max_datasets_per_session
    );

    if args.detailed {
        let analysis = ctx.config.analysis();
        println!();
        println!("{}", dim.apply_to("─".repeat(40)));
        println!();
        println!(
            "  {} {}",
            dim.apply_to("Correlation threshold:"),
            analysis.correlation_threshold
        );
        println!(
            "  {} {}",
            dim.apply_to("High cardinality above:"),
            analysis.high_cardinality_threshold
        );
        println!(
            "  {} {}",
            dim.apply_to("Uniformity test up to:"),
            analysis.max_categories_for_chi2
        );
    }

    if ctx.verbose {
        println!();
        if ctx.config_sources.is_empty() {
            println!("  {} defaults", dim.apply_to("Config:"));
        }
        for source in &ctx.config_sources {
            println!("  {} {}", dim.apply_to("Config:"), source.display());
        }
        if let Err(e) = &probe {
            println!("  {} {}", dim.apply_to("Error:"), e);
        }
    }

    println!();
    Ok(())
}

//! Datasets command - lists a session's cached datasets.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::{Context, truncate};

/// Arguments for the datasets command.
#[derive(Args, Debug)]
pub struct DatasetsArgs {
    /// Session id
    pub session: String,
}

/// Run the datasets command.
pub async fn run(args: DatasetsArgs, ctx: &Context) -> Result<()> {
    let datasets = ctx.services.datasets().list(&args.session).await?;

    if ctx.json_output {
        return super::print_json(&datasets);
    }

    let dim = Style::new().dim();
    println!("{}", style(format!("Datasets in {}", args.session)).bold());
    println!("{}", dim.apply_to("─".repeat(60)));
    println!();

    if datasets.is_empty() {
        println!("{}", dim.apply_to("No datasets cached"));
        return Ok(());
    }

    for meta in &datasets {
        println!(
            "{} {}  {}",
            dim.apply_to(format!("[{}]", meta.id)),
            style(truncate(&meta.title, 40)).bold(),
            dim.apply_to(format!(
                "{} rows x {} columns, added {}",
                meta.num_rows,
                meta.columns.len(),
                meta.created_at.format("%Y-%m-%d %H:%M:%S")
            ))
        );
    }
    println!();
    println!(
        "{}",
        dim.apply_to(format!(
            "{} of {} slots used",
            datasets.len(),
            ctx.services.cache().config().max_datasets_per_session
        ))
    );
    Ok(())
}

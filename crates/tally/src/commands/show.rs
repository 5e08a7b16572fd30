//! Show command - a dataset's metadata, preview and remaining lifetime.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use tally_domain::DatasetMeta;

use super::{Context, format_duration, truncate};

/// Arguments for the show command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Session id
    pub session: String,

    /// Dataset id
    pub dataset: String,
}

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    #[serde(flatten)]
    meta: &'a DatasetMeta,
    ttl_secs: Option<u64>,
}

/// Run the show command.
pub async fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    let datasets = ctx.services.datasets();
    let meta = datasets.meta(&args.session, &args.dataset).await?;
    let ttl = datasets.ttl(&args.session, &args.dataset).await?;

    if ctx.json_output {
        return super::print_json(&ShowOutput {
            meta: &meta,
            ttl_secs: ttl.map(|t| t.as_secs()),
        });
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style(&meta.title).bold());
    println!("{}", dim.apply_to("─".repeat(60)));
    println!("  {} {}", dim.apply_to("Id:"), meta.id);
    println!("  {} {}", dim.apply_to("File:"), meta.filename);
    println!("  {} {} bytes", dim.apply_to("Size:"), meta.size);
    println!(
        "  {} {} rows x {} columns",
        dim.apply_to("Shape:"),
        meta.num_rows,
        meta.columns.len()
    );
    println!("  {} {}", dim.apply_to("Added:"), meta.created_at.to_rfc3339());
    if let Some(ttl) = ttl {
        println!("  {} {}", dim.apply_to("Expires in:"), format_duration(ttl));
    }
    if ctx.verbose {
        println!("  {} {}", dim.apply_to("Hash:"), meta.hash);
    }
    if let Some(summary) = &meta.summary {
        println!();
        println!("  {}", summary);
    }

    println!();
    println!("  {}", style(meta.preview.columns.join(" | ")).bold());
    for row in &meta.preview.sample_rows {
        let cells: Vec<String> = row.iter().map(|c| truncate(&c.to_string(), 16)).collect();
        println!("  {}", cells.join(" | "));
    }
    println!();
    Ok(())
}

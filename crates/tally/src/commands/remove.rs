//! Remove command - drops a dataset and its cached analyses.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde_json::json;

use super::Context;

/// Arguments for the remove command.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Session id
    pub session: String,

    /// Dataset id
    pub dataset: String,
}

/// Run the remove command.
pub async fn run(args: RemoveArgs, ctx: &Context) -> Result<()> {
    ctx.services
        .datasets()
        .remove(&args.session, &args.dataset)
        .await?;

    if ctx.json_output {
        return super::print_json(&json!({ "removed": args.dataset }));
    }
    println!(
        "{} Removed dataset {}",
        Style::new().green().apply_to("✓"),
        args.dataset
    );
    Ok(())
}

//! Purge command - drops every key of a session.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde_json::json;

use super::Context;

/// Arguments for the purge command.
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Session id
    pub session: String,
}

/// Run the purge command.
pub async fn run(args: PurgeArgs, ctx: &Context) -> Result<()> {
    let removed = ctx.services.datasets().purge(&args.session).await?;

    if ctx.json_output {
        return super::print_json(&json!({ "session": args.session, "keys_removed": removed }));
    }
    println!(
        "{} Purged session {} ({} keys)",
        Style::new().green().apply_to("✓"),
        args.session,
        removed
    );
    Ok(())
}

//! Analyze command - runs a cached analysis on a dataset.

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::Style;
use serde::Serialize;
use serde_json::json;
use tally_domain::Analyzed;

use super::Context;

/// Which analysis to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisKind {
    /// Per-column descriptive statistics
    Basic,
    /// Skewness and kurtosis of numeric columns
    Shape,
    /// Pearson, Spearman and Cramér's V
    Correlation,
    /// Column profile with highlights
    Overview,
    /// Narrative summary over the overview
    Insights,
}

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Session id
    pub session: String,

    /// Dataset id
    pub dataset: String,

    /// Analysis to run
    #[arg(short, long, value_enum, default_value = "basic")]
    pub kind: AnalysisKind,
}

/// Run the analyze command.
pub async fn run(args: AnalyzeArgs, ctx: &Context) -> Result<()> {
    let (_, table) = ctx
        .services
        .datasets()
        .load(&args.session, &args.dataset)
        .await?;
    let analysis = ctx.services.analysis();
    let (sid, did) = (args.session.as_str(), args.dataset.as_str());

    match args.kind {
        AnalysisKind::Basic => report(ctx, args.kind, analysis.basic_statistics(sid, did, &table).await?),
        AnalysisKind::Shape => report(ctx, args.kind, analysis.skewness_kurtosis(sid, did, &table).await?),
        AnalysisKind::Correlation => report(ctx, args.kind, analysis.correlation(sid, did, &table).await?),
        AnalysisKind::Overview => report(ctx, args.kind, analysis.overview(sid, did, &table).await?),
        AnalysisKind::Insights => report(ctx, args.kind, analysis.insights(sid, did, &table).await?),
    }
}

fn report<T: Serialize>(ctx: &Context, kind: AnalysisKind, analyzed: Analyzed<T>) -> Result<()> {
    if ctx.json_output {
        return super::print_json(&json!({
            "kind": format!("{kind:?}").to_lowercase(),
            "from_cache": analyzed.from_cache,
            "result": analyzed.value,
        }));
    }

    let source = if analyzed.from_cache {
        "served from cache"
    } else {
        "computed"
    };
    eprintln!("{}", Style::new().dim().apply_to(format!("{kind:?} ({source})")));
    super::print_json(&analyzed.value)
}

//! `adaptest insights` - analyze run history.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, settle, CommandOutput};
use crate::cli::table::format_insights_table;
use crate::domain::models::{Diagnostic, InsightRecord};
use crate::services::{export_report, render_report, InsightAggregator, RunHistory};

#[derive(Args, Debug)]
pub struct InsightsArgs {
    /// Write a plain-text report to the data directory
    #[arg(long)]
    pub export: bool,

    /// Print the full report instead of a table
    #[arg(long)]
    pub report: bool,
}

#[derive(Debug, Serialize)]
pub struct InsightsOutput {
    pub runs_analyzed: usize,
    pub insights: Vec<InsightRecord>,
    pub report_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub full_report: bool,
}

impl CommandOutput for InsightsOutput {
    fn to_human(&self) -> String {
        let mut body = if self.insights.is_empty() {
            format!("No insights from {} run(s).", self.runs_analyzed)
        } else if self.full_report {
            render_report(&self.insights, Utc::now())
        } else {
            format!(
                "Insights from {} run(s):\n{}",
                self.runs_analyzed,
                format_insights_table(&self.insights)
            )
        };
        if let Some(path) = &self.report_path {
            body.push_str(&format!("\n\nReport written to {}", path.display()));
        }
        body.push_str(&format_diagnostics(&self.diagnostics));
        body
    }
}

/// Analyze the stored history, using the collaborator when one is configured.
pub async fn analyze(
    ctx: &AppContext,
) -> Result<(RunHistory, Vec<InsightRecord>, Vec<Diagnostic>)> {
    let (history, mut diagnostics) = ctx.run_history().await?;
    let mut aggregator = InsightAggregator::new();
    if let Some(synthesizer) = &ctx.synthesizer {
        aggregator = aggregator.with_synthesizer(Arc::clone(synthesizer));
    }
    let (insights, analyze_diagnostics) =
        settle(aggregator.analyze(history.runs()).await, "Analysis")?;
    diagnostics.extend(analyze_diagnostics);
    Ok((history, insights, diagnostics))
}

pub async fn execute(args: InsightsArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let (history, insights, mut diagnostics) = analyze(ctx).await?;

    let report_path = if args.export && !insights.is_empty() {
        let (path, export_diagnostics) = export_report(&insights, Path::new(&ctx.config.data_dir))
            .await
            .into_parts();
        diagnostics.extend(export_diagnostics);
        path
    } else {
        None
    };

    output(
        &InsightsOutput {
            runs_analyzed: history.len(),
            insights,
            report_path,
            diagnostics,
            full_report: args.report,
        },
        json_mode,
    );
    Ok(())
}

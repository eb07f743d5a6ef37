//! `adaptest dashboard` - latest run and trend overview.

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use crate::cli::commands::insights::analyze;
use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, truncate, CommandOutput};
use crate::domain::models::Diagnostic;
use crate::services::{dashboard, Dashboard};

#[derive(Args, Debug)]
pub struct DashboardArgs {}

#[derive(Debug, Serialize)]
pub struct DashboardOutput {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub diagnostics: Vec<Diagnostic>,
}

fn series(values: &[f64], unit: &str) -> String {
    values
        .iter()
        .map(|v| format!("{v:.1}{unit}"))
        .collect::<Vec<_>>()
        .join(" → ")
}

impl CommandOutput for DashboardOutput {
    fn to_human(&self) -> String {
        let d = &self.dashboard;
        let Some(last_run) = d.last_run else {
            return format!(
                "No runs recorded yet.{}",
                format_diagnostics(&self.diagnostics)
            );
        };

        let mut lines = vec![
            style("Test Dashboard").bold().to_string(),
            "─────────────────────────────────────────".to_string(),
            format!("Runs recorded:   {}", d.total_runs),
            format!(
                "Last run:        {}",
                last_run.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            format!(
                "Latest:          {} total, {} passed, {} failed, {} skipped",
                d.latest_total, d.latest_passed, d.latest_failed, d.latest_skipped
            ),
            format!("Pass rate:       {:.1}%", d.latest_pass_rate),
            format!("Avg pass rate:   {:.1}%", d.avg_pass_rate),
            format!("Avg duration:    {:.2}s", d.avg_duration),
        ];
        if d.pass_rates.len() > 1 {
            lines.push(format!("Pass rate trend: {}", series(&d.pass_rates, "%")));
            lines.push(format!("Duration trend:  {}", series(&d.mean_durations, "s")));
        }
        if !d.top_insights.is_empty() {
            lines.push(String::new());
            lines.push(style("Top insights").bold().to_string());
            for insight in &d.top_insights {
                lines.push(format!(
                    "  [{}] {}: {}",
                    insight.severity,
                    insight.title,
                    truncate(&insight.description, 60)
                ));
            }
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

pub async fn execute(_args: DashboardArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let (history, insights, diagnostics) = analyze(ctx).await?;

    output(
        &DashboardOutput {
            dashboard: dashboard(history.runs(), &insights),
            diagnostics,
        },
        json_mode,
    );
    Ok(())
}

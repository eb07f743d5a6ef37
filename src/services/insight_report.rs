//! Plain-text insight reports and the run-history dashboard view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::models::{Diagnostic, InsightCategory, InsightRecord, Outcome, TestRunRecord};
use crate::services::trend;

const COMPONENT: &str = "insight_report";

/// Render insights grouped by category, in first-appearance order.
pub fn render_report(insights: &[InsightRecord], generated_at: DateTime<Utc>) -> String {
    if insights.is_empty() {
        return "No insights available".to_string();
    }

    let mut lines = vec![
        "Adaptive Testing Analytics Report".to_string(),
        "=".repeat(40),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Total Insights: {}", insights.len()),
        String::new(),
    ];

    let mut categories: Vec<InsightCategory> = Vec::new();
    for insight in insights {
        if !categories.contains(&insight.category) {
            categories.push(insight.category);
        }
    }

    for category in categories {
        lines.push(format!("{} INSIGHTS", category.as_str().to_uppercase()));
        lines.push("-".repeat(20));
        for insight in insights.iter().filter(|i| i.category == category) {
            lines.push(format!(
                "* {} ({})",
                insight.title,
                insight.severity.as_str().to_uppercase()
            ));
            lines.push(format!("  {}", insight.description));
            lines.push(format!("  Confidence: {:.2}", insight.confidence));
            lines.push("  Recommendations:".to_string());
            lines.extend(insight.recommendations.iter().map(|r| format!("    - {r}")));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Write the rendered report to `<dir>/insights_report_<timestamp>.txt`.
pub async fn export_report(insights: &[InsightRecord], dir: &Path) -> Outcome<PathBuf> {
    let now = Utc::now();
    let path = dir.join(format!("insights_report_{}.txt", now.format("%Y%m%d_%H%M%S")));
    let report = render_report(insights, now);

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(path = %dir.display(), error = %e, "Cannot create report directory");
        return Outcome::failed(Diagnostic::new(COMPONENT, e.to_string()));
    }
    match tokio::fs::write(&path, report).await {
        Ok(()) => {
            info!(path = %path.display(), "Exported insights report");
            Outcome::Complete(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot write insights report");
            Outcome::failed(Diagnostic::new(COMPONENT, e.to_string()))
        }
    }
}

/// Latest-run metrics plus recent trend series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_runs: usize,
    pub last_run: Option<DateTime<Utc>>,
    pub latest_total: u32,
    pub latest_passed: u32,
    pub latest_failed: u32,
    pub latest_skipped: u32,
    /// Percent, `0..=100`.
    pub latest_pass_rate: f64,
    /// Percent per run over the last 10 runs.
    pub pass_rates: Vec<f64>,
    pub mean_durations: Vec<f64>,
    pub avg_pass_rate: f64,
    pub avg_duration: f64,
    pub top_insights: Vec<InsightRecord>,
}

/// Build a dashboard view. `insights` must already be ranked.
pub fn dashboard(runs: &[TestRunRecord], insights: &[InsightRecord]) -> Dashboard {
    let recent = &runs[runs.len().saturating_sub(10)..];
    let pass_rates: Vec<f64> = trend::pass_rates(recent)
        .into_iter()
        .map(|r| r * 100.0)
        .collect();
    let mean_durations = trend::mean_durations(recent);
    let latest = runs.last();

    Dashboard {
        total_runs: runs.len(),
        last_run: latest.map(|r| r.timestamp),
        latest_total: latest.map_or(0, |r| r.total_tests),
        latest_passed: latest.map_or(0, |r| r.passed),
        latest_failed: latest.map_or(0, |r| r.failed),
        latest_skipped: latest.map_or(0, |r| r.skipped),
        latest_pass_rate: latest.map_or(0.0, |r| r.pass_rate() * 100.0),
        avg_pass_rate: trend::mean(&pass_rates),
        avg_duration: trend::mean(&mean_durations),
        pass_rates,
        mean_durations,
        top_insights: insights.iter().take(5).cloned().collect(),
    }
}

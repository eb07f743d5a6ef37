//! Table output formatting for CLI commands
//!
//! Renders patterns, rules, runs, and insights with comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::cli::output::truncate;
use crate::domain::models::{AdaptiveRule, FailurePattern, InsightRecord, Severity, TestRunRecord};

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !supports_color() {
        table.force_no_tty();
    }
    table
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical | Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Green,
    }
}

pub fn format_patterns_table(patterns: &[&FailurePattern]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Test", "Kind", "Locator", "Freq", "Last Seen", "Error"]));

    for pattern in patterns {
        table.add_row(vec![
            Cell::new(truncate(&pattern.test_name, 40)),
            Cell::new(pattern.failure_kind.as_str()),
            Cell::new(pattern.element_locator.as_deref().unwrap_or("-")),
            Cell::new(pattern.frequency),
            Cell::new(pattern.last_seen.format("%Y-%m-%d %H:%M")),
            Cell::new(truncate(&pattern.error_message, 50)),
        ]);
    }
    table.to_string()
}

pub fn format_rules_table(rules: &[AdaptiveRule]) -> String {
    let mut table = base_table();
    table.set_header(header(&["ID", "Kind", "Confidence", "Success", "Applied", "Fix"]));

    for rule in rules {
        let success = if rule.feedback_count() == 0 {
            "-".to_string()
        } else {
            format!(
                "{:.0}% ({})",
                rule.success_rate * 100.0,
                rule.feedback_count()
            )
        };
        let applied = match rule.last_applied {
            Some(at) => at.format("%Y-%m-%d").to_string(),
            None => "never".to_string(),
        };
        table.add_row(vec![
            Cell::new(&rule.rule_id),
            Cell::new(rule.failure_kind.as_str()),
            Cell::new(format!("{:.2}", rule.confidence)),
            Cell::new(success),
            Cell::new(applied),
            Cell::new(truncate(&rule.suggested_fix, 60)),
        ]);
    }
    table.to_string()
}

pub fn format_runs_table(runs: &[TestRunRecord]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Run", "When", "Total", "Passed", "Failed", "Skip", "Pass%"]));

    for run in runs {
        table.add_row(vec![
            Cell::new(truncate(&run.run_id, 28)),
            Cell::new(run.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(run.total_tests),
            Cell::new(run.passed).fg(Color::Green),
            Cell::new(run.failed).fg(if run.failed > 0 { Color::Red } else { Color::Reset }),
            Cell::new(run.skipped),
            Cell::new(format!("{:.1}", run.pass_rate() * 100.0)),
        ]);
    }
    table.to_string()
}

pub fn format_insights_table(insights: &[InsightRecord]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Severity", "Category", "Title", "Confidence"]));

    for insight in insights {
        let severity = insight.severity.as_str().to_uppercase();
        table.add_row(vec![
            Cell::new(severity).fg(severity_color(insight.severity)),
            Cell::new(insight.category.as_str()),
            Cell::new(truncate(&insight.title, 50)),
            Cell::new(format!("{:.2}", insight.confidence)),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FailureKind, InsightCategory};
    use chrono::Utc;

    #[test]
    fn test_rules_table_shows_feedback_state() {
        let rule = AdaptiveRule::new(
            FailureKind::TimingIssue,
            "Add explicit wait",
            0.8,
            Utc::now(),
        );
        let rendered = format_rules_table(&[rule]);
        assert!(rendered.contains("timing_issue"));
        assert!(rendered.contains("never"));
        assert!(rendered.contains("0.80"));
    }

    #[test]
    fn test_insights_table_uppercases_severity() {
        let insight = InsightRecord::new(
            InsightCategory::Quality,
            "Low Pass Rate Detected",
            "",
            Severity::High,
            0.9,
        );
        let rendered = format_insights_table(&[insight]);
        assert!(rendered.contains("HIGH"));
        assert!(rendered.contains("Low Pass Rate Detected"));
    }
}

//! `adaptest patterns` - record, inspect, and compact failure patterns.

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, settle, CommandOutput};
use crate::cli::table::format_patterns_table;
use crate::domain::models::{Diagnostic, FailureKind, FailurePattern, FailureRecord};
use crate::services::{summarize_adaptation, AdaptationSummary, RecordResult};

#[derive(Args, Debug)]
pub struct PatternsArgs {
    #[command(subcommand)]
    pub command: PatternsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PatternsCommand {
    /// Record one test failure
    Record {
        /// Test name
        #[arg(long)]
        test: String,

        /// Error message reported by the test
        #[arg(long)]
        error: String,

        /// Browser the test ran in
        #[arg(long)]
        browser: Option<String>,

        /// Test duration in seconds
        #[arg(long, default_value = "0")]
        duration: f64,
    },

    /// List learned patterns, most frequent first
    List {
        /// Only patterns seen within this many days
        #[arg(long)]
        recent_days: Option<u32>,

        /// Maximum number of patterns to display
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Summarize learning progress
    Summary {
        /// Learning window in days (defaults to config)
        #[arg(long)]
        window_days: Option<u32>,
    },

    /// Remove patterns not seen within the retention period
    Compact {
        /// Retention in days (defaults to config)
        #[arg(long)]
        retention_days: Option<u32>,
    },
}

#[derive(Debug, Serialize)]
pub struct RecordOutput {
    pub result: &'static str,
    pub frequency: Option<u32>,
    pub pattern: Option<FailurePattern>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for RecordOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![match (&self.pattern, self.result) {
            (Some(p), "created") => format!(
                "New {} pattern learned for {}",
                p.failure_kind, p.test_name
            ),
            (Some(p), _) => format!(
                "Known {} pattern for {} (frequency {})",
                p.failure_kind, p.test_name, p.frequency
            ),
            (None, _) => "Record ignored: not a failure".to_string(),
        }];
        if let Some(locator) = self.pattern.as_ref().and_then(|p| p.element_locator.as_ref()) {
            lines.push(format!("  Locator: {locator}"));
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct PatternListOutput {
    pub total: usize,
    pub patterns: Vec<FailurePattern>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for PatternListOutput {
    fn to_human(&self) -> String {
        if self.patterns.is_empty() {
            return "No failure patterns found.".to_string();
        }
        let rows: Vec<&FailurePattern> = self.patterns.iter().collect();
        format!(
            "Failure patterns:\n{}\n\nShowing {} of {} pattern(s){}",
            format_patterns_table(&rows),
            self.patterns.len(),
            self.total,
            format_diagnostics(&self.diagnostics)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: AdaptationSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for SummaryOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            "Adaptation Summary".to_string(),
            "─────────────────────────────────────────".to_string(),
            format!("Patterns learned:     {}", s.total_patterns_learned),
            format!(
                "Recent patterns:      {} (last {} days)",
                s.recent_patterns, s.learning_window_days
            ),
            format!("Active rules:         {}", s.active_rules),
            format!("Effective rules:      {}", s.effective_rules),
            format!("Avg rule confidence:  {:.2}", s.avg_rule_confidence),
        ];
        if !s.top_failure_kinds.is_empty() {
            lines.push("\nTop failure kinds:".to_string());
            lines.extend(
                s.top_failure_kinds
                    .iter()
                    .map(|(kind, n)| format!("  {kind:<20} {n}")),
            );
        }
        if !s.daily_failure_trend.is_empty() {
            lines.push("\nDaily failures:".to_string());
            lines.extend(
                s.daily_failure_trend
                    .iter()
                    .map(|(day, n): (&NaiveDate, &u64)| format!("  {day}  {n}")),
            );
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct CompactOutput {
    pub removed: usize,
    pub remaining: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for CompactOutput {
    fn to_human(&self) -> String {
        format!(
            "Removed {} item(s), {} remaining{}",
            self.removed,
            self.remaining,
            format_diagnostics(&self.diagnostics)
        )
    }
}

pub async fn execute(args: PatternsArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        PatternsCommand::Record {
            test,
            error,
            browser,
            duration,
        } => {
            let mut record = FailureRecord::failed(test, error).with_duration(duration);
            if let Some(browser) = browser {
                record = record.with_browser(browser);
            }
            output(&record_failure(ctx, &record).await?, json_mode);
        }
        PatternsCommand::List { recent_days, limit } => {
            let (store, diagnostics) = ctx.pattern_store().await?;
            let mut patterns: Vec<FailurePattern> = match recent_days {
                Some(days) => store
                    .recent(Duration::days(i64::from(days)))
                    .into_iter()
                    .cloned()
                    .collect(),
                None => store.patterns().to_vec(),
            };
            let total = patterns.len();
            patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
            patterns.truncate(limit);
            output(
                &PatternListOutput {
                    total,
                    patterns,
                    diagnostics,
                },
                json_mode,
            );
        }
        PatternsCommand::Summary { window_days } => {
            let (store, mut diagnostics) = ctx.pattern_store().await?;
            let (rules, rule_diagnostics) = ctx.rule_book().await?;
            diagnostics.extend(rule_diagnostics);
            let window = window_days.unwrap_or(ctx.config.learning.learning_window_days);
            let summary = summarize_adaptation(store.patterns(), rules.rules(), window, Utc::now());
            output(
                &SummaryOutput {
                    summary,
                    diagnostics,
                },
                json_mode,
            );
        }
        PatternsCommand::Compact { retention_days } => {
            let (mut store, mut diagnostics) = ctx.pattern_store().await?;
            let days = retention_days.unwrap_or(ctx.config.learning.pattern_retention_days);
            let compacted = store.compact(Duration::days(i64::from(days))).await;
            let (removed, compact_diagnostics) = settle(compacted, "Compaction")?;
            diagnostics.extend(compact_diagnostics);
            output(
                &CompactOutput {
                    removed,
                    remaining: store.len(),
                    diagnostics,
                },
                json_mode,
            );
        }
    }
    Ok(())
}

async fn record_failure(ctx: &AppContext, record: &FailureRecord) -> Result<RecordOutput> {
    let (mut store, mut diagnostics) = ctx.pattern_store().await?;
    let (result, record_diagnostics) =
        settle(store.record_failure(record).await, "Recording failure")?;
    diagnostics.extend(record_diagnostics);

    let key = store.extractor().extract_pattern(record).map(|p| p.key());
    let pattern = key.and_then(|key| store.patterns().iter().find(|p| p.key() == key).cloned());

    let (label, frequency) = match result {
        RecordResult::Ignored => ("ignored", None),
        RecordResult::Created => ("created", Some(1)),
        RecordResult::Incremented { frequency } => ("incremented", Some(frequency)),
    };

    Ok(RecordOutput {
        result: label,
        frequency,
        pattern,
        diagnostics,
    })
}

/// Parse a failure kind argument such as `timing_issue`.
pub fn parse_failure_kind(s: &str) -> Result<FailureKind, String> {
    FailureKind::from_str(s).ok_or_else(|| {
        let known: Vec<&str> = FailureKind::ALL.iter().map(FailureKind::as_str).collect();
        format!(
            "unknown failure kind '{s}', expected one of: {}",
            known.join(", ")
        )
    })
}

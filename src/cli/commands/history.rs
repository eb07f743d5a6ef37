//! `adaptest history` - record and maintain test run history.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::commands::patterns::CompactOutput;
use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, settle, CommandOutput};
use crate::cli::table::format_runs_table;
use crate::domain::models::{Diagnostic, TestRunRecord, TestRunReport};
use crate::services::{PatternStore, RecordResult, RunHistory};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Record a run from a JSON test report
    Record {
        /// Path to the report file
        report: PathBuf,

        /// Also learn failure patterns from the report's failed tests
        #[arg(long)]
        learn: bool,
    },

    /// List recorded runs, newest last
    List {
        /// Maximum number of runs to display
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Keep only the newest runs
    Compact {
        /// Runs to keep (defaults to config)
        #[arg(long)]
        max_runs: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
pub struct RunRecordedOutput {
    pub run: TestRunRecord,
    pub patterns_recorded: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for RunRecordedOutput {
    fn to_human(&self) -> String {
        let run = &self.run;
        let mut lines = vec![
            format!("Recorded run {}", run.run_id),
            format!(
                "  {} total, {} passed, {} failed, {} skipped ({:.1}% pass rate)",
                run.total_tests,
                run.passed,
                run.failed,
                run.skipped,
                run.pass_rate() * 100.0
            ),
        ];
        if self.patterns_recorded > 0 {
            lines.push(format!("  Learned from {} failure(s)", self.patterns_recorded));
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct RunListOutput {
    pub total: usize,
    pub runs: Vec<TestRunRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for RunListOutput {
    fn to_human(&self) -> String {
        if self.runs.is_empty() {
            return "No runs recorded.".to_string();
        }
        format!(
            "Run history:\n{}\n\nShowing {} of {} run(s){}",
            format_runs_table(&self.runs),
            self.runs.len(),
            self.total,
            format_diagnostics(&self.diagnostics)
        )
    }
}

pub async fn execute(args: HistoryArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        HistoryCommand::Record { report, learn } => {
            let bytes = tokio::fs::read(&report)
                .await
                .with_context(|| format!("Failed to read report {}", report.display()))?;
            let report: TestRunReport =
                serde_json::from_slice(&bytes).context("Failed to parse test run report")?;

            let (mut history, mut diagnostics) = ctx.run_history().await?;
            let store = if learn {
                let (store, store_diagnostics) = ctx.pattern_store().await?;
                diagnostics.extend(store_diagnostics);
                Some(store)
            } else {
                None
            };

            let result = record_report(&mut history, store, report).await?;
            diagnostics.extend(result.diagnostics);
            output(
                &RunRecordedOutput {
                    diagnostics,
                    ..result
                },
                json_mode,
            );
        }
        HistoryCommand::List { limit } => {
            let (history, diagnostics) = ctx.run_history().await?;
            output(
                &RunListOutput {
                    total: history.len(),
                    runs: history.recent(limit).to_vec(),
                    diagnostics,
                },
                json_mode,
            );
        }
        HistoryCommand::Compact { max_runs } => {
            let (mut history, mut diagnostics) = ctx.run_history().await?;
            let keep = max_runs.unwrap_or(ctx.config.analytics.max_history_runs);
            let (removed, compact_diagnostics) =
                settle(history.compact(keep).await, "Compaction")?;
            diagnostics.extend(compact_diagnostics);
            output(
                &CompactOutput {
                    removed,
                    remaining: history.len(),
                    diagnostics,
                },
                json_mode,
            );
        }
    }
    Ok(())
}

/// Record `report` in `history`, feeding its failures to `store` when given.
pub async fn record_report(
    history: &mut RunHistory,
    store: Option<PatternStore>,
    report: TestRunReport,
) -> Result<RunRecordedOutput> {
    let failures: Vec<_> = report
        .failures()
        .map(|outcome| {
            let mut record = outcome.to_failure_record();
            record.browser.clone_from(&report.browser);
            record
        })
        .collect();

    let (run, mut diagnostics) = settle(history.record_run(report).await, "Recording run")?;

    let mut patterns_recorded = 0;
    if let Some(mut store) = store {
        for record in &failures {
            let (result, record_diagnostics) = store.record_failure(record).await.into_parts();
            diagnostics.extend(record_diagnostics);
            if result.is_some_and(|r| r != RecordResult::Ignored) {
                patterns_recorded += 1;
            }
        }
    }

    Ok(RunRecordedOutput {
        run,
        patterns_recorded,
        diagnostics,
    })
}

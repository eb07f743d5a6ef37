//! `adaptest cycle` - one full generate, run, learn, adapt, analyze pass.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::parse_test_type;
use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, settle, CommandOutput};
use crate::cli::table::format_insights_table;
use crate::domain::models::{Diagnostic, TestType};
use crate::services::{CycleOptions, CycleSummary};

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// User story to generate a test for (repeatable)
    #[arg(long = "story")]
    pub stories: Vec<String>,

    /// Kind of test to generate
    #[arg(long, default_value = "e2e", value_parser = parse_test_type)]
    pub test_type: TestType,
}

#[derive(Debug, Serialize)]
pub struct CycleOutput {
    #[serde(flatten)]
    pub summary: CycleSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for CycleOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            "Adaptive Testing Cycle".to_string(),
            "─────────────────────────────────────────".to_string(),
            format!("Tests generated:      {}", s.tests_generated),
            format!("Test files run:       {}", s.test_files.len()),
            format!(
                "Tests executed:       {} ({} passed, {} failed)",
                s.tests_executed, s.passed, s.failed
            ),
            format!("Pass rate:            {:.1}%", s.pass_rate),
            format!("Failures learned:     {}", s.patterns_recorded),
            format!("Rules created:        {}", s.rules_created),
            format!("Adaptations applied:  {}", s.adaptations_applied),
            format!(
                "Patterns learned:     {} ({} in the last {} days)",
                s.adaptation.total_patterns_learned,
                s.adaptation.recent_patterns,
                s.adaptation.learning_window_days
            ),
            format!("Duration:             {:.1}s", s.duration_secs),
        ];
        if s.predictive_tests > 0 {
            lines.push(format!("Predictive tests:     {}", s.predictive_tests));
        }
        if let Some(run_id) = &s.run_id {
            lines.push(format!("Run ID:               {run_id}"));
        }
        if !s.insights.is_empty() {
            lines.push(format!("\nInsights:\n{}", format_insights_table(&s.insights)));
        }
        if let Some(path) = &s.report_path {
            lines.push(format!("Report written to {}", path.display()));
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

pub async fn execute(args: CycleArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let options = CycleOptions {
        stories: args.stories,
        test_type: args.test_type,
    };
    let (summary, diagnostics) = settle(ctx.orchestrator().run_cycle(&options).await, "Cycle")?;
    output(
        &CycleOutput {
            summary,
            diagnostics,
        },
        json_mode,
    );
    Ok(())
}

//! `adaptest apply` - apply eligible rules to test files.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, CommandOutput};
use crate::domain::models::Diagnostic;
use crate::services::{FileImprovement, ImprovementService, RuleApplicator};

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Test files to improve
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Minimum rule confidence (defaults to config)
    #[arg(long)]
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ApplyOutput {
    pub dry_run: bool,
    pub files: Vec<FileImprovement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for ApplyOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for file in &self.files {
            if file.improvements_applied.is_empty() {
                lines.push(format!("{}: no applicable rules", file.file_path.display()));
                continue;
            }
            let verb = if self.dry_run { "would apply" } else { "applied" };
            lines.push(format!(
                "{}: {verb} {} rule(s)",
                file.file_path.display(),
                file.improvements_applied.len()
            ));
            for rule in &file.improvements_applied {
                lines.push(format!("  - [{}] {}", rule.failure_kind, rule.suggested_fix));
            }
            if let Some(backup) = &file.backup_created {
                lines.push(format!("  backup: {}", backup.display()));
            }
        }
        if lines.is_empty() {
            lines.push("No files processed.".to_string());
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

pub async fn execute(args: ApplyArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let (mut rules, mut diagnostics) = ctx.rule_book().await?;
    let threshold = args
        .min_confidence
        .unwrap_or(ctx.config.learning.confidence_threshold);
    let service = ImprovementService::new(RuleApplicator::new(threshold)).dry_run(args.dry_run);

    // A file that cannot be processed is reported and skipped.
    let mut files = Vec::new();
    for path in &args.files {
        let (value, file_diagnostics) = service.apply_to_file(path, &mut rules).await.into_parts();
        files.extend(value);
        diagnostics.extend(file_diagnostics);
    }

    output(
        &ApplyOutput {
            dry_run: args.dry_run,
            files,
            diagnostics,
        },
        json_mode,
    );
    Ok(())
}

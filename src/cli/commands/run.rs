//! `adaptest run` - execute tests through the runner and learn from the result.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::commands::history::record_report;
use crate::cli::context::AppContext;
use crate::cli::output::output;
use crate::services::test_generator::discover_test_files;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Test files to run (defaults to every test file under the configured test dirs)
    pub files: Vec<PathBuf>,

    /// Record the run without learning failure patterns
    #[arg(long)]
    pub no_learn: bool,
}

pub async fn execute(args: RunArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let files = if args.files.is_empty() {
        discover_test_files(&ctx.test_dirs()).await
    } else {
        args.files
    };
    if files.is_empty() {
        bail!(
            "No test files found under {}",
            ctx.config.runner.test_dirs.join(", ")
        );
    }

    let report = ctx
        .runner()
        .run(&files)
        .await
        .context("Test runner failed")?;

    let (mut history, mut diagnostics) = ctx.run_history().await?;
    let store = if args.no_learn {
        None
    } else {
        let (store, store_diagnostics) = ctx.pattern_store().await?;
        diagnostics.extend(store_diagnostics);
        Some(store)
    };

    let mut result = record_report(&mut history, store, report).await?;
    diagnostics.append(&mut result.diagnostics);
    result.diagnostics = diagnostics;
    output(&result, json_mode);
    Ok(())
}

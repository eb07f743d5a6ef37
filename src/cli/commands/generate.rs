//! `adaptest generate` - turn user stories into test files.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::parse_test_type;
use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, settle, CommandOutput};
use crate::domain::models::{Diagnostic, TestType};
use crate::services::{
    save_generation_metadata, summarize_generation, GeneratedTest, GenerationSummary,
    TestGenerator,
};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// User stories, one test file each
    #[arg(required_unless_present = "predictive")]
    pub stories: Vec<String>,

    /// Kind of test to generate
    #[arg(long, default_value = "e2e", value_parser = parse_test_type)]
    pub test_type: TestType,

    /// Output directory (defaults to config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Generate preventive tests for a component from learned patterns
    #[arg(long, value_name = "COMPONENT", conflicts_with = "stories")]
    pub predictive: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateOutput {
    pub generated: Vec<GeneratedTest>,
    pub summary: GenerationSummary,
    pub metadata_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for GenerateOutput {
    fn to_human(&self) -> String {
        if self.generated.is_empty() {
            return format!(
                "No tests generated.{}",
                format_diagnostics(&self.diagnostics)
            );
        }
        let mut lines = vec![format!("Generated {} test file(s):", self.generated.len())];
        for test in &self.generated {
            let source = if test.fallback { " (template)" } else { "" };
            lines.push(format!(
                "  {} [{}, confidence {:.2}]{source}",
                test.file_path.display(),
                test.test_type,
                test.confidence_score
            ));
        }
        lines.push(format!("Average confidence: {:.2}", self.summary.avg_confidence));
        if let Some(path) = &self.metadata_path {
            lines.push(format!("Metadata written to {}", path.display()));
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

pub async fn execute(args: GenerateArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let mut diagnostics = Vec::new();
    let output_dir = args.output_dir.unwrap_or_else(|| {
        let dir = if args.predictive.is_some() {
            &ctx.config.predictive_tests_dir
        } else {
            &ctx.config.generated_tests_dir
        };
        PathBuf::from(dir)
    });

    let mut generator = TestGenerator::new(output_dir).with_existing_test_dirs(ctx.test_dirs());
    if let Some(synthesizer) = &ctx.synthesizer {
        generator = generator.with_synthesizer(Arc::clone(synthesizer));
    }

    let outcome = if let Some(component) = &args.predictive {
        let (store, store_diagnostics) = ctx.pattern_store().await?;
        diagnostics.extend(store_diagnostics);
        if store.is_empty() {
            bail!("No failure patterns learned yet; record failures before predictive generation");
        }
        generator
            .generate_predictive(component, store.patterns())
            .await
    } else {
        generator.generate_all(&args.stories, args.test_type).await
    };

    let (generated, generate_diagnostics) = settle(outcome, "Test generation")?;
    diagnostics.extend(generate_diagnostics);

    let metadata_path = if generated.is_empty() {
        None
    } else {
        let (path, metadata_diagnostics) =
            save_generation_metadata(&generated, generator.output_dir())
                .await
                .into_parts();
        diagnostics.extend(metadata_diagnostics);
        path
    };

    output(
        &GenerateOutput {
            summary: summarize_generation(&generated),
            generated,
            metadata_path,
            diagnostics,
        },
        json_mode,
    );
    Ok(())
}

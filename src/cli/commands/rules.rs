//! `adaptest rules` - synthesize, inspect, and rate adaptive rules.

use anyhow::Result;
use chrono::Duration;
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::commands::patterns::{parse_failure_kind, CompactOutput};
use crate::cli::context::AppContext;
use crate::cli::output::{format_diagnostics, output, settle, CommandOutput};
use crate::cli::table::format_rules_table;
use crate::domain::models::{AdaptiveRule, Diagnostic, FailureKind, RuleFeedback};
use crate::services::RuleSynthesizer;

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// Synthesize rules from recurring failure patterns
    Synthesize,

    /// List adaptive rules
    List {
        /// Only rules for this failure kind
        #[arg(long, value_parser = parse_failure_kind)]
        kind: Option<FailureKind>,

        /// Only rules at or above this confidence
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Report whether a rule prevented its failure
    Feedback {
        /// Rule ID
        rule_id: String,

        /// Observed outcome
        #[arg(value_enum)]
        outcome: FeedbackArg,
    },

    /// Drop old rules that were never applied
    Compact {
        /// Retention in days (defaults to the pattern retention)
        #[arg(long)]
        retention_days: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FeedbackArg {
    Prevented,
    Recurred,
}

impl From<FeedbackArg> for RuleFeedback {
    fn from(arg: FeedbackArg) -> Self {
        match arg {
            FeedbackArg::Prevented => Self::Prevented,
            FeedbackArg::Recurred => Self::Recurred,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RuleListOutput {
    pub rules: Vec<AdaptiveRule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for RuleListOutput {
    fn to_human(&self) -> String {
        if self.rules.is_empty() {
            return format!("No rules found.{}", format_diagnostics(&self.diagnostics));
        }
        format!(
            "Adaptive rules:\n{}\n\nShowing {} rule(s){}",
            format_rules_table(&self.rules),
            self.rules.len(),
            format_diagnostics(&self.diagnostics)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct SynthesizeOutput {
    pub created: Vec<AdaptiveRule>,
    pub total_rules: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for SynthesizeOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Synthesized {} rule(s), {} total",
            self.created.len(),
            self.total_rules
        )];
        for rule in &self.created {
            lines.push(format!(
                "  {} [{} {:.2}] {}",
                rule.rule_id, rule.failure_kind, rule.confidence, rule.suggested_fix
            ));
        }
        lines.push(format_diagnostics(&self.diagnostics));
        lines.join("\n").trim_end().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackOutput {
    pub rule: AdaptiveRule,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutput for FeedbackOutput {
    fn to_human(&self) -> String {
        format!(
            "Rule {}: success rate {:.0}% over {} observation(s){}",
            self.rule.rule_id,
            self.rule.success_rate * 100.0,
            self.rule.feedback_count(),
            format_diagnostics(&self.diagnostics)
        )
    }
}

pub async fn execute(args: RulesArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        RulesCommand::Synthesize => {
            let (store, mut diagnostics) = ctx.pattern_store().await?;
            let (mut rules, rule_diagnostics) = ctx.rule_book().await?;
            diagnostics.extend(rule_diagnostics);

            let mut synthesizer = RuleSynthesizer::from_config(&ctx.config.learning);
            if let Some(collaborator) = &ctx.synthesizer {
                synthesizer = synthesizer.with_synthesizer(Arc::clone(collaborator));
            }
            let (created, synth_diagnostics) = settle(
                synthesizer.synthesize(store.patterns(), &mut rules).await,
                "Rule synthesis",
            )?;
            diagnostics.extend(synth_diagnostics);

            output(
                &SynthesizeOutput {
                    created,
                    total_rules: rules.len(),
                    diagnostics,
                },
                json_mode,
            );
        }
        RulesCommand::List {
            kind,
            min_confidence,
        } => {
            let (rules, diagnostics) = ctx.rule_book().await?;
            let rules = rules
                .rules()
                .iter()
                .filter(|r| kind.is_none_or(|k| r.failure_kind == k))
                .filter(|r| min_confidence.is_none_or(|c| r.confidence >= c))
                .cloned()
                .collect();
            output(&RuleListOutput { rules, diagnostics }, json_mode);
        }
        RulesCommand::Feedback { rule_id, outcome } => {
            let (mut rules, mut diagnostics) = ctx.rule_book().await?;
            let (rule, feedback_diagnostics) = settle(
                rules.record_feedback(&rule_id, outcome.into()).await,
                "Recording feedback",
            )?;
            diagnostics.extend(feedback_diagnostics);
            output(&FeedbackOutput { rule, diagnostics }, json_mode);
        }
        RulesCommand::Compact { retention_days } => {
            let (mut rules, mut diagnostics) = ctx.rule_book().await?;
            let days = retention_days.unwrap_or(ctx.config.learning.pattern_retention_days);
            let compacted = rules.compact(Duration::days(i64::from(days))).await;
            let (removed, compact_diagnostics) = settle(compacted, "Compaction")?;
            diagnostics.extend(compact_diagnostics);
            output(
                &CompactOutput {
                    removed,
                    remaining: rules.len(),
                    diagnostics,
                },
                json_mode,
            );
        }
    }
    Ok(())
}

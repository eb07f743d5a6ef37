//! End-to-end adaptive testing cycle.
//!
//! One cycle runs these phases in order:
//! generate (optional), discover and run, record the run, learn failure
//! patterns, synthesize rules, auto-apply improvements, analyze insights,
//! and generate predictive tests.
//!
//! Every phase is best effort. A phase that cannot run records a diagnostic
//! and the cycle carries on with whatever state the earlier phases produced.

use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::models::{Config, Diagnostic, InsightRecord, Outcome, TestType};
use crate::domain::ports::{
    PatternRepository, RuleRepository, RunHistoryRepository, TestRunner, TestSynthesizer,
};
use crate::services::adaptation_summary::{summarize_adaptation, AdaptationSummary};
use crate::services::improvement_service::ImprovementService;
use crate::services::insight_aggregator::InsightAggregator;
use crate::services::insight_report::{dashboard, export_report, Dashboard};
use crate::services::pattern_store::{PatternStore, RecordResult};
use crate::services::rule_applicator::RuleApplicator;
use crate::services::rule_book::RuleBook;
use crate::services::rule_synthesizer::RuleSynthesizer;
use crate::services::run_history::RunHistory;
use crate::services::test_generator::{discover_test_files, save_generation_metadata, TestGenerator};

const COMPONENT: &str = "cycle";

/// Inputs for one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleOptions {
    /// User stories to turn into tests before running. Empty skips generation.
    pub stories: Vec<String>,
    pub test_type: TestType,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub duration_secs: f64,
    pub tests_generated: usize,
    pub generation_metadata: Option<PathBuf>,
    pub test_files: Vec<PathBuf>,
    pub tests_executed: u32,
    pub passed: u32,
    pub failed: u32,
    /// Percent of executed tests that passed, `0..=100`.
    pub pass_rate: f64,
    pub run_id: Option<String>,
    pub patterns_recorded: usize,
    pub rules_created: usize,
    pub adaptations_applied: usize,
    pub insights: Vec<InsightRecord>,
    pub report_path: Option<PathBuf>,
    pub predictive_tests: usize,
    pub adaptation: AdaptationSummary,
    pub dashboard: Dashboard,
}

pub struct CycleOrchestrator {
    config: Config,
    patterns: Arc<dyn PatternRepository>,
    rules: Arc<dyn RuleRepository>,
    history: Arc<dyn RunHistoryRepository>,
    runner: Arc<dyn TestRunner>,
    synthesizer: Option<Arc<dyn TestSynthesizer>>,
}

/// Keep the value of a sub-outcome and collect its diagnostics.
fn absorb<T>(outcome: Outcome<T>, diagnostics: &mut Vec<Diagnostic>) -> Option<T> {
    let (value, diags) = outcome.into_parts();
    diagnostics.extend(diags);
    value
}

impl CycleOrchestrator {
    pub fn new(
        config: Config,
        patterns: Arc<dyn PatternRepository>,
        rules: Arc<dyn RuleRepository>,
        history: Arc<dyn RunHistoryRepository>,
        runner: Arc<dyn TestRunner>,
    ) -> Self {
        Self {
            config,
            patterns,
            rules,
            history,
            runner,
            synthesizer: None,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn TestSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    fn test_dirs(&self) -> Vec<PathBuf> {
        let dirs = &self.config.runner.test_dirs;
        dirs.iter().map(PathBuf::from).collect()
    }

    fn generator(&self, output_dir: &str) -> TestGenerator {
        let generator = TestGenerator::new(output_dir).with_existing_test_dirs(self.test_dirs());
        match &self.synthesizer {
            Some(synthesizer) => generator.with_synthesizer(Arc::clone(synthesizer)),
            None => generator,
        }
    }

    /// Run one full cycle.
    ///
    /// Only yields `Failed` when none of the stores could be opened; every
    /// other problem degrades the summary.
    pub async fn run_cycle(&self, options: &CycleOptions) -> Outcome<CycleSummary> {
        let started = Instant::now();
        let mut diagnostics = Vec::new();
        let mut summary = CycleSummary::default();

        info!(
            stories = options.stories.len(),
            "Starting adaptive testing cycle"
        );

        let opened = PatternStore::open(Arc::clone(&self.patterns)).await;
        let Some(mut store) = absorb(opened, &mut diagnostics) else {
            return Outcome::Failed { diagnostics };
        };
        let opened = RuleBook::open(Arc::clone(&self.rules)).await;
        let Some(mut rules) = absorb(opened, &mut diagnostics) else {
            return Outcome::Failed { diagnostics };
        };
        let opened = RunHistory::open(Arc::clone(&self.history)).await;
        let Some(mut history) = absorb(opened, &mut diagnostics) else {
            return Outcome::Failed { diagnostics };
        };

        // Phase 1: generation
        if !options.stories.is_empty() {
            let generator = self.generator(&self.config.generated_tests_dir);
            let generated = generator
                .generate_all(&options.stories, options.test_type)
                .await;
            if let Some(generated) = absorb(generated, &mut diagnostics) {
                summary.tests_generated = generated.len();
                if !generated.is_empty() {
                    summary.generation_metadata = absorb(
                        save_generation_metadata(&generated, generator.output_dir()).await,
                        &mut diagnostics,
                    );
                }
            }
        }

        // Phase 2: discovery and execution
        summary.test_files = discover_test_files(&self.test_dirs()).await;
        let report = if summary.test_files.is_empty() {
            warn!("No test files discovered, skipping execution");
            None
        } else {
            match self.runner.run(&summary.test_files).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "Test execution failed");
                    diagnostics.push(Diagnostic::new(COMPONENT, e.to_string()));
                    None
                }
            }
        };

        if let Some(report) = report {
            summary.tests_executed = report.total;
            summary.passed = report.passed;
            summary.failed = report.failed;
            summary.pass_rate = f64::from(report.passed) / f64::from(report.total.max(1)) * 100.0;

            // Phase 3: learn from failures
            let failures: Vec<_> = report
                .failures()
                .map(|outcome| {
                    let mut record = outcome.to_failure_record();
                    record.browser.clone_from(&report.browser);
                    record
                })
                .collect();

            if let Some(record) = absorb(history.record_run(report).await, &mut diagnostics) {
                summary.run_id = Some(record.run_id);
            }

            for record in &failures {
                let recorded = store.record_failure(record).await;
                if let Some(result) = absorb(recorded, &mut diagnostics) {
                    if result != RecordResult::Ignored {
                        summary.patterns_recorded += 1;
                    }
                }
            }
        }

        // Phase 4: synthesize
        let mut synthesizer = RuleSynthesizer::from_config(&self.config.learning);
        if let Some(collaborator) = &self.synthesizer {
            synthesizer = synthesizer.with_synthesizer(Arc::clone(collaborator));
        }
        if let Some(created) = absorb(
            synthesizer.synthesize(store.patterns(), &mut rules).await,
            &mut diagnostics,
        ) {
            summary.rules_created = created.len();
        }

        // Phase 5: auto-apply
        if self.config.learning.auto_apply_fixes && !rules.is_empty() {
            let applicator = RuleApplicator::new(self.config.learning.confidence_threshold);
            let service = ImprovementService::new(applicator);
            for file in &summary.test_files {
                let applied = service.apply_to_file(file, &mut rules).await;
                if let Some(improvement) = absorb(applied, &mut diagnostics) {
                    summary.adaptations_applied += improvement.improvements_applied.len();
                }
            }
        }

        // Phase 6: analyze
        let mut aggregator = InsightAggregator::new();
        if let Some(collaborator) = &self.synthesizer {
            aggregator = aggregator.with_synthesizer(Arc::clone(collaborator));
        }
        let analyzed = aggregator.analyze(history.runs()).await;
        if let Some(insights) = absorb(analyzed, &mut diagnostics) {
            summary.insights = insights;
        }
        if self.config.analytics.export_reports && !summary.insights.is_empty() {
            let dir = PathBuf::from(&self.config.data_dir);
            let exported = export_report(&summary.insights, &dir).await;
            summary.report_path = absorb(exported, &mut diagnostics);
        }

        // Phase 7: predictive tests
        if self.config.analytics.include_predictive && !store.is_empty() {
            let generator = self.generator(&self.config.predictive_tests_dir);
            for component in &self.config.analytics.predictive_components {
                let generated = generator
                    .generate_predictive(component, store.patterns())
                    .await;
                if let Some(generated) = absorb(generated, &mut diagnostics) {
                    summary.predictive_tests += generated.len();
                }
            }
        }

        summary.adaptation = summarize_adaptation(
            store.patterns(),
            rules.rules(),
            self.config.learning.learning_window_days,
            Utc::now(),
        );
        summary.dashboard = dashboard(history.runs(), &summary.insights);
        summary.duration_secs = started.elapsed().as_secs_f64();

        info!(
            duration_secs = summary.duration_secs,
            executed = summary.tests_executed,
            failed = summary.failed,
            patterns = summary.patterns_recorded,
            rules = summary.rules_created,
            adaptations = summary.adaptations_applied,
            insights = summary.insights.len(),
            diagnostics = diagnostics.len(),
            "Adaptive testing cycle complete"
        );

        Outcome::from_parts(summary, diagnostics)
    }
}

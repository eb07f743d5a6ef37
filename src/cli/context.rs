//! Wiring of stores and collaborators for CLI commands.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::json::{JsonPatternRepository, JsonRuleRepository, JsonRunHistoryRepository};
use crate::adapters::pytest::PytestRunner;
use crate::cli::output::settle;
use crate::domain::models::{Config, Diagnostic};
use crate::domain::ports::{
    PatternRepository, RuleRepository, RunHistoryRepository, TestRunner, TestSynthesizer,
};
use crate::infrastructure::synthesizer::HttpTestSynthesizer;
use crate::services::{CycleOrchestrator, PatternStore, RuleBook, RunHistory};

/// Everything a command needs, built once from the loaded [`Config`].
pub struct AppContext {
    pub config: Config,
    pub patterns: Arc<dyn PatternRepository>,
    pub rules: Arc<dyn RuleRepository>,
    pub history: Arc<dyn RunHistoryRepository>,
    /// `None` in offline mode.
    pub synthesizer: Option<Arc<dyn TestSynthesizer>>,
}

impl AppContext {
    pub fn from_config(config: Config, offline: bool) -> Result<Self> {
        let synthesizer: Option<Arc<dyn TestSynthesizer>> = if offline {
            None
        } else {
            Some(Arc::new(
                HttpTestSynthesizer::new(&config.synthesizer)
                    .context("Failed to create synthesizer client")?,
            ))
        };

        Ok(Self {
            patterns: Arc::new(JsonPatternRepository::new(config.patterns_path())),
            rules: Arc::new(JsonRuleRepository::new(config.rules_path())),
            history: Arc::new(JsonRunHistoryRepository::new(config.history_path())),
            synthesizer,
            config,
        })
    }

    pub fn runner(&self) -> Arc<dyn TestRunner> {
        Arc::new(PytestRunner::from_config(&self.config.runner))
    }

    pub fn test_dirs(&self) -> Vec<PathBuf> {
        let dirs = &self.config.runner.test_dirs;
        dirs.iter().map(PathBuf::from).collect()
    }

    pub async fn pattern_store(&self) -> Result<(PatternStore, Vec<Diagnostic>)> {
        settle(
            PatternStore::open(Arc::clone(&self.patterns)).await,
            "Opening pattern store",
        )
    }

    pub async fn rule_book(&self) -> Result<(RuleBook, Vec<Diagnostic>)> {
        settle(
            RuleBook::open(Arc::clone(&self.rules)).await,
            "Opening rule store",
        )
    }

    pub async fn run_history(&self) -> Result<(RunHistory, Vec<Diagnostic>)> {
        settle(
            RunHistory::open(Arc::clone(&self.history)).await,
            "Opening run history",
        )
    }

    pub fn orchestrator(&self) -> CycleOrchestrator {
        let orchestrator = CycleOrchestrator::new(
            self.config.clone(),
            Arc::clone(&self.patterns),
            Arc::clone(&self.rules),
            Arc::clone(&self.history),
            self.runner(),
        );
        match &self.synthesizer {
            Some(synthesizer) => orchestrator.with_synthesizer(Arc::clone(synthesizer)),
            None => orchestrator,
        }
    }
}

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use adaptest::adapters::json::{
    JsonPatternRepository, JsonRuleRepository, JsonRunHistoryRepository,
};
use adaptest::domain::models::{TestOutcome, TestRunReport, TestStatus};
use adaptest::services::{PatternStore, RuleBook, RunHistory};

/// Open the three JSON-backed stores under `dir`.
pub async fn open_stores(dir: &Path) -> (PatternStore, RuleBook, RunHistory) {
    let patterns = PatternStore::open(Arc::new(JsonPatternRepository::new(
        dir.join("failure_patterns.json"),
    )))
    .await
    .into_value()
    .expect("pattern store opens");
    let rules = RuleBook::open(Arc::new(JsonRuleRepository::new(dir.join("adaptive_rules.json"))))
        .await
        .into_value()
        .expect("rule book opens");
    let history = RunHistory::open(Arc::new(JsonRunHistoryRepository::new(
        dir.join("test_history.json"),
    )))
    .await
    .into_value()
    .expect("run history opens");
    (patterns, rules, history)
}

/// A run of `total` tests of which `passed` passed, with no per-test detail.
pub fn counts_report(total: u32, passed: u32, duration: f64) -> TestRunReport {
    TestRunReport {
        total,
        passed,
        failed: total - passed,
        duration,
        ..TestRunReport::default()
    }
}

/// A run where each named test has the given status.
pub fn detailed_report(tests: &[(&str, TestStatus)]) -> TestRunReport {
    let outcomes: Vec<TestOutcome> = tests
        .iter()
        .map(|(name, status)| TestOutcome::new(*name, *status).with_duration(1.0))
        .collect();
    let count = |status: TestStatus| outcomes.iter().filter(|t| t.status == status).count();
    let passed = count(TestStatus::Passed) as u32;
    let failed = count(TestStatus::Failed) as u32;
    TestRunReport {
        total: outcomes.len() as u32,
        passed,
        failed,
        duration: outcomes.len() as f64,
        tests: outcomes,
        ..TestRunReport::default()
    }
}

//! Test run history model.
//!
//! A [`TestRunReport`] is what a runner hands back; [`TestRunRecord`] is the
//! standardized, persisted form appended to the run history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::failure::{FailureRecord, TestStatus};

/// Per-test outcome inside a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestOutcome {
    #[serde(default = "unknown_name", alias = "test_name")]
    pub name: String,

    #[serde(default)]
    pub status: TestStatus,

    #[serde(default)]
    pub duration: f64,

    #[serde(default, alias = "error_message")]
    pub error: Option<String>,
}

fn unknown_name() -> String {
    "unknown".to_string()
}

impl TestOutcome {
    pub fn new(name: impl Into<String>, status: TestStatus) -> Self {
        Self {
            name: name.into(),
            status,
            duration: 0.0,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// View this outcome as a failure record for pattern learning.
    pub fn to_failure_record(&self) -> FailureRecord {
        FailureRecord {
            test_name: self.name.clone(),
            status: self.status,
            error_message: self.error.clone().unwrap_or_default(),
            duration: self.duration,
            ..Default::default()
        }
    }
}

/// Raw result of one test run as produced by a runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestRunReport {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub environment: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub tests: Vec<TestOutcome>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl TestRunReport {
    /// Outcomes whose status is `failed`.
    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.tests
            .iter()
            .filter(|t| t.status == TestStatus::Failed)
    }
}

/// Persisted, append-only record of a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub total_tests: u32,
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub environment: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub test_details: Vec<TestOutcome>,
    #[serde(default = "unknown_name")]
    pub browser: String,
    #[serde(default = "unknown_name")]
    pub platform: String,
}

impl TestRunRecord {
    /// Standardize a runner report observed at `now`.
    pub fn from_report(report: TestRunReport, now: DateTime<Utc>) -> Self {
        Self {
            run_id: report
                .run_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("run_{}", now.format("%Y%m%d_%H%M%S"))),
            timestamp: now,
            total_tests: report.total,
            passed: report.passed,
            failed: report.failed,
            skipped: report.skipped,
            duration: report.duration,
            environment: report.environment,
            test_details: report.tests,
            browser: report.browser.unwrap_or_else(unknown_name),
            platform: report.platform.unwrap_or_else(unknown_name),
        }
    }

    /// Passed / total as a fraction; an empty run counts as zero.
    pub fn pass_rate(&self) -> f64 {
        f64::from(self.passed) / f64::from(self.total_tests.max(1))
    }

    /// Run duration divided by the number of tests.
    pub fn mean_test_duration(&self) -> f64 {
        self.duration / f64::from(self.total_tests.max(1))
    }
}

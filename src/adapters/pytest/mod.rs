//! Pytest test runner adapter.
//!
//! Runs pytest with the `pytest-json-report` plugin and converts its report
//! into a [`TestRunReport`]. When no structured report appears, falls back
//! to counting `PASSED`/`FAILED`/`SKIPPED` in the text output.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::domain::errors::RunnerError;
use crate::domain::models::{RunnerConfig, TestOutcome, TestRunReport, TestStatus};
use crate::domain::ports::TestRunner;

/// Runs pytest as a child process.
#[derive(Debug, Clone)]
pub struct PytestRunner {
    program: String,
    args: Vec<String>,
    report_file: PathBuf,
    working_dir: PathBuf,
    timeout: Duration,
}

impl PytestRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            report_file: PathBuf::from("test_results.json"),
            working_dir: PathBuf::from("."),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
            .with_report_file(&config.report_file)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_report_file(mut self, report_file: impl Into<PathBuf>) -> Self {
        self.report_file = report_file.into();
        self
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn report_path(&self) -> PathBuf {
        self.working_dir.join(&self.report_file)
    }

    fn command_args(&self, files: &[PathBuf]) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--json-report".to_string());
        args.push(format!("--json-report-file={}", self.report_file.display()));
        args.extend(files.iter().map(|f| f.display().to_string()));
        args
    }

    /// Convert a `pytest-json-report` document.
    fn convert_report(report: JsonReport) -> TestRunReport {
        let now = Utc::now();
        let tests = report
            .tests
            .into_iter()
            .map(|test| {
                let status = match test.outcome.as_str() {
                    "passed" => TestStatus::Passed,
                    "skipped" => TestStatus::Skipped,
                    _ => TestStatus::Failed,
                };
                let error = (status == TestStatus::Failed)
                    .then(|| test.call.longrepr.map(longrepr_text).unwrap_or_default());
                TestOutcome {
                    name: test.nodeid,
                    status,
                    duration: test.call.duration,
                    error,
                }
            })
            .collect();

        let mut environment = BTreeMap::new();
        environment.insert("executor".to_string(), serde_json::json!("pytest"));
        environment.insert("timestamp".to_string(), serde_json::json!(now.to_rfc3339()));

        TestRunReport {
            run_id: Some(format!("pytest_{}", now.format("%Y%m%d_%H%M%S"))),
            total: report.summary.total,
            passed: report.summary.passed,
            failed: report.summary.failed,
            skipped: report.summary.skipped,
            duration: report.duration,
            environment,
            tests,
            ..Default::default()
        }
    }

    /// Coarse counts from the verbose text output; no per-test detail.
    fn parse_text_output(stdout: &str, exit_code: Option<i32>) -> TestRunReport {
        let count =
            |needle: &str| u32::try_from(stdout.matches(needle).count()).unwrap_or(u32::MAX);
        let passed = count("PASSED");
        let failed = count("FAILED");
        let skipped = count("SKIPPED");

        let mut environment = BTreeMap::new();
        environment.insert("executor".to_string(), serde_json::json!("pytest_text"));
        environment.insert("returncode".to_string(), serde_json::json!(exit_code));

        TestRunReport {
            run_id: Some(format!("pytest_text_{}", Utc::now().format("%Y%m%d_%H%M%S"))),
            total: passed.saturating_add(failed).saturating_add(skipped),
            passed,
            failed,
            skipped,
            environment,
            ..Default::default()
        }
    }

    async fn read_report(path: &Path) -> Option<JsonReport> {
        let bytes = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not parse pytest JSON report"
                );
                None
            }
        }
    }
}

fn longrepr_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct JsonReport {
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    summary: JsonSummary,
    #[serde(default)]
    tests: Vec<JsonTest>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonSummary {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    passed: u32,
    #[serde(default)]
    failed: u32,
    #[serde(default)]
    skipped: u32,
}

#[derive(Debug, Default, Deserialize)]
struct JsonTest {
    #[serde(default)]
    nodeid: String,
    #[serde(default)]
    outcome: String,
    #[serde(default)]
    call: JsonCall,
}

#[derive(Debug, Default, Deserialize)]
struct JsonCall {
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    longrepr: Option<serde_json::Value>,
}

#[async_trait]
impl TestRunner for PytestRunner {
    async fn run(&self, files: &[PathBuf]) -> Result<TestRunReport, RunnerError> {
        if files.is_empty() {
            tracing::warn!("No test files to run");
            return Ok(TestRunReport::default());
        }

        let report_path = self.report_path();
        // A report left over from an earlier run must not be mistaken for this one.
        let _ = tokio::fs::remove_file(&report_path).await;

        tracing::info!(
            program = %self.program,
            files = files.len(),
            "Running test suite"
        );

        let child = Command::new(&self.program)
            .args(self.command_args(files))
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                tracing::error!(
                    program = %self.program,
                    error = %source,
                    "Failed to spawn test command"
                );
                return Err(RunnerError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.timeout.as_secs(),
                    "Test command timed out"
                );
                return Err(RunnerError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let report = match Self::read_report(&report_path).await {
            Some(json) => Self::convert_report(json),
            None => {
                tracing::warn!("No structured pytest report, falling back to text output");
                let stdout = String::from_utf8_lossy(&output.stdout);
                Self::parse_text_output(&stdout, output.status.code())
            }
        };

        tracing::info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "Test suite complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args_order() {
        let runner = PytestRunner::new("python", vec!["-m".into(), "pytest".into(), "-v".into()]);
        let args = runner.command_args(&[PathBuf::from("tests/test_a.py")]);
        assert_eq!(
            args,
            [
                "-m",
                "pytest",
                "-v",
                "--json-report",
                "--json-report-file=test_results.json",
                "tests/test_a.py"
            ]
        );
    }

    #[test]
    fn test_convert_json_report() {
        let json: JsonReport = serde_json::from_str(
            r#"{
                "duration": 12.5,
                "summary": {"total": 3, "passed": 1, "failed": 1, "skipped": 1},
                "tests": [
                    {"nodeid": "tests/test_a.py::test_ok", "outcome": "passed",
                     "call": {"duration": 0.5}},
                    {"nodeid": "tests/test_a.py::test_bad", "outcome": "failed",
                     "call": {"duration": 1.5, "longrepr": "AssertionError: expected 3"}},
                    {"nodeid": "tests/test_a.py::test_skip", "outcome": "skipped"}
                ]
            }"#,
        )
        .unwrap();

        let report = PytestRunner::convert_report(json);

        assert_eq!(report.total, 3);
        assert!((report.duration - 12.5).abs() < f64::EPSILON);
        assert_eq!(report.tests[1].status, TestStatus::Failed);
        assert_eq!(
            report.tests[1].error.as_deref(),
            Some("AssertionError: expected 3")
        );
        assert!(report.tests[0].error.is_none());
        assert_eq!(report.tests[2].status, TestStatus::Skipped);
        assert_eq!(report.environment["executor"], "pytest");
        assert!(report.run_id.unwrap().starts_with("pytest_"));
    }

    #[test]
    fn test_parse_text_fallback() {
        let stdout = "tests/test_a.py::test_one PASSED\n\
                      tests/test_a.py::test_two FAILED\n\
                      tests/test_a.py::test_three PASSED\n\
                      tests/test_a.py::test_four SKIPPED\n";

        let report = PytestRunner::parse_text_output(stdout, Some(1));

        assert_eq!(report.total, 4);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.tests.is_empty());
        assert_eq!(report.environment["returncode"], 1);
    }

    #[tokio::test]
    async fn test_no_files_skips_spawn() {
        let runner = PytestRunner::new("definitely-not-a-real-binary", vec![]);
        let report = runner.run(&[]).await.unwrap();
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner =
            PytestRunner::new("definitely-not-a-real-binary", vec![]).with_working_dir(dir.path());
        let files = [PathBuf::from("test_x.py")];
        let err = runner.run(&files).await.unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }
}

use crate::domain::errors::RunnerError;
use crate::domain::models::TestRunReport;
use async_trait::async_trait;
use std::path::PathBuf;

/// Port for the external test harness
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run the given test files and report the results
    ///
    /// When the harness produces no structured report, implementations
    /// degrade to coarse counts with empty per-test detail instead of failing.
    async fn run(&self, files: &[PathBuf]) -> Result<TestRunReport, RunnerError>;
}

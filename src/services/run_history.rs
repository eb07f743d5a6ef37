//! Append-only store of standardized test-run records.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{Diagnostic, Outcome, TestRunRecord, TestRunReport};
use crate::domain::ports::RunHistoryRepository;

const COMPONENT: &str = "run_history";

/// Explicit handle over the run-history collection, oldest run first.
pub struct RunHistory {
    repository: Arc<dyn RunHistoryRepository>,
    runs: Vec<TestRunRecord>,
}

impl RunHistory {
    /// Load history. A read failure yields an empty, degraded history.
    pub async fn open(repository: Arc<dyn RunHistoryRepository>) -> Outcome<Self> {
        let (runs, diagnostics) = match repository.load_all().await {
            Ok(runs) => {
                debug!(count = runs.len(), "Loaded run history");
                (runs, Vec::new())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load run history, starting empty");
                (Vec::new(), vec![Diagnostic::new(COMPONENT, e.to_string())])
            }
        };

        Outcome::from_parts(Self { repository, runs }, diagnostics)
    }

    pub fn runs(&self) -> &[TestRunRecord] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The newest `n` runs, oldest first.
    pub fn recent(&self, n: usize) -> &[TestRunRecord] {
        let start = self.runs.len().saturating_sub(n);
        &self.runs[start..]
    }

    /// Standardize a runner report, append it, and persist.
    pub async fn record_run(&mut self, report: TestRunReport) -> Outcome<TestRunRecord> {
        self.record_run_at(report, Utc::now()).await
    }

    pub async fn record_run_at(
        &mut self,
        report: TestRunReport,
        now: DateTime<Utc>,
    ) -> Outcome<TestRunRecord> {
        let record = TestRunRecord::from_report(report, now);
        info!(
            run_id = %record.run_id,
            total = record.total_tests,
            passed = record.passed,
            failed = record.failed,
            "Recorded test run"
        );
        self.runs.push(record.clone());

        self.persist().await.map(|()| record)
    }

    /// Keep only the newest `max_runs` runs; returns how many were dropped.
    pub async fn compact(&mut self, max_runs: usize) -> Outcome<usize> {
        let removed = self.runs.len().saturating_sub(max_runs);
        if removed == 0 {
            return Outcome::Complete(0);
        }

        self.runs.drain(..removed);
        info!(
            removed,
            remaining = self.runs.len(),
            "Compacted run history"
        );
        self.persist().await.map(|()| removed)
    }

    async fn persist(&self) -> Outcome<()> {
        match self.repository.save_all(&self.runs).await {
            Ok(()) => Outcome::Complete(()),
            Err(e) => {
                warn!(error = %e, "Failed to persist run history");
                Outcome::Degraded {
                    value: (),
                    diagnostics: vec![Diagnostic::new(COMPONENT, e.to_string())],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRunHistoryRepository;

    fn report(id: &str) -> TestRunReport {
        TestRunReport {
            run_id: Some(id.to_string()),
            total: 10,
            passed: 9,
            failed: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_record_run_appends_and_persists() {
        let repo = Arc::new(InMemoryRunHistoryRepository::new());
        let mut history = RunHistory::open(repo.clone()).await.into_value().unwrap();

        let record = history
            .record_run(TestRunReport::default())
            .await
            .into_value()
            .unwrap();

        assert!(record.run_id.starts_with("run_"));
        assert_eq!(history.len(), 1);
        assert_eq!(repo.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_and_compact_keep_newest() {
        let repo = Arc::new(InMemoryRunHistoryRepository::new());
        let mut history = RunHistory::open(repo.clone()).await.into_value().unwrap();
        for i in 0..5 {
            history.record_run(report(&format!("r{i}"))).await;
        }

        let recent = history.recent(2);
        let ids: Vec<_> = recent.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, ["r3", "r4"]);
        assert_eq!(history.recent(50).len(), 5);

        assert_eq!(history.compact(3).await, Outcome::Complete(2));
        assert_eq!(history.runs()[0].run_id, "r2");
        assert_eq!(repo.snapshot().len(), 3);
        assert_eq!(history.compact(3).await, Outcome::Complete(0));
    }

    #[tokio::test]
    async fn test_persist_failure_degrades() {
        let repo = Arc::new(InMemoryRunHistoryRepository::failing());
        let mut history = RunHistory::open(repo).await.into_value().unwrap();

        let outcome = history.record_run(report("r0")).await;

        assert!(outcome.is_degraded());
        assert_eq!(history.len(), 1);
    }
}

//! Deduplicated, frequency-counted store of observed failure patterns.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{Diagnostic, FailurePattern, FailureRecord, Outcome};
use crate::domain::ports::PatternRepository;
use crate::services::classifier::PatternExtractor;

const COMPONENT: &str = "pattern_store";

/// What `record_failure` did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordResult {
    /// The record was not a failure.
    Ignored,
    /// A new pattern was appended with frequency 1.
    Created,
    /// An existing pattern was bumped to this frequency.
    Incremented { frequency: u32 },
}

/// Explicit handle over the pattern collection.
///
/// Loaded once via [`PatternStore::open`] and written through on every
/// mutation. At most one pattern exists per identity key.
pub struct PatternStore {
    repository: Arc<dyn PatternRepository>,
    extractor: PatternExtractor,
    patterns: Vec<FailurePattern>,
}

impl PatternStore {
    /// Load the store. A read failure yields an empty, degraded store.
    pub async fn open(repository: Arc<dyn PatternRepository>) -> Outcome<Self> {
        Self::open_with(repository, PatternExtractor::default()).await
    }

    pub async fn open_with(
        repository: Arc<dyn PatternRepository>,
        extractor: PatternExtractor,
    ) -> Outcome<Self> {
        let (patterns, diagnostics) = match repository.load_all().await {
            Ok(patterns) => {
                debug!(count = patterns.len(), "Loaded failure patterns");
                (patterns, Vec::new())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load failure patterns, starting empty");
                (Vec::new(), vec![Diagnostic::new(COMPONENT, e.to_string())])
            }
        };

        Outcome::from_parts(
            Self {
                repository,
                extractor,
                patterns,
            },
            diagnostics,
        )
    }

    pub fn patterns(&self) -> &[FailurePattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn extractor(&self) -> &PatternExtractor {
        &self.extractor
    }

    /// Classify a record and fold it into the store, then persist.
    ///
    /// Non-failures are ignored without touching storage. A persistence
    /// failure leaves the in-memory state updated and degrades the outcome.
    pub async fn record_failure(&mut self, record: &FailureRecord) -> Outcome<RecordResult> {
        self.record_failure_at(record, Utc::now()).await
    }

    pub async fn record_failure_at(
        &mut self,
        record: &FailureRecord,
        now: DateTime<Utc>,
    ) -> Outcome<RecordResult> {
        let Some(occurrence) = self.extractor.extract_pattern_at(record, now) else {
            return Outcome::Complete(RecordResult::Ignored);
        };

        let key = occurrence.key();
        let result = match self.patterns.iter_mut().find(|p| p.key() == key) {
            Some(existing) => {
                existing.observe_repeat(&occurrence);
                debug!(
                    test_name = %existing.test_name,
                    pattern_kind = %existing.failure_kind,
                    frequency = existing.frequency,
                    "Failure pattern repeated"
                );
                RecordResult::Incremented {
                    frequency: existing.frequency,
                }
            }
            None => {
                info!(
                    test_name = %occurrence.test_name,
                    pattern_kind = %occurrence.failure_kind,
                    locator = occurrence.element_locator.as_deref().unwrap_or(""),
                    "New failure pattern"
                );
                self.patterns.push(occurrence);
                RecordResult::Created
            }
        };

        self.persist().await.map(|()| result)
    }

    /// Patterns last seen within `window` of now.
    pub fn recent(&self, window: Duration) -> Vec<&FailurePattern> {
        self.recent_at(window, Utc::now())
    }

    pub fn recent_at(&self, window: Duration, now: DateTime<Utc>) -> Vec<&FailurePattern> {
        let cutoff = now - window;
        self.patterns
            .iter()
            .filter(|p| p.seen_since(cutoff))
            .collect()
    }

    /// Drop patterns not seen within `retention`; returns how many went.
    pub async fn compact(&mut self, retention: Duration) -> Outcome<usize> {
        self.compact_at(retention, Utc::now()).await
    }

    pub async fn compact_at(&mut self, retention: Duration, now: DateTime<Utc>) -> Outcome<usize> {
        let cutoff = now - retention;
        let before = self.patterns.len();
        self.patterns.retain(|p| p.seen_since(cutoff));
        let removed = before - self.patterns.len();

        if removed == 0 {
            return Outcome::Complete(0);
        }

        info!(
            removed,
            remaining = self.patterns.len(),
            "Compacted failure patterns"
        );
        self.persist().await.map(|()| removed)
    }

    async fn persist(&self) -> Outcome<()> {
        match self.repository.save_all(&self.patterns).await {
            Ok(()) => Outcome::Complete(()),
            Err(e) => {
                warn!(error = %e, "Failed to persist failure patterns");
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
    use crate::adapters::memory::InMemoryPatternRepository;
    use crate::domain::models::{FailureKind, TestStatus};

    async fn store(repo: &Arc<InMemoryPatternRepository>) -> PatternStore {
        let opened = PatternStore::open(repo.clone()).await;
        opened.into_value().unwrap()
    }

    #[tokio::test]
    async fn test_repeat_increments_single_pattern() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let mut store = store(&repo).await;
        let record = FailureRecord::failed("test_cart", "Element not found: '.add-btn'");

        let first = store.record_failure(&record).await;
        let second = store.record_failure(&record).await;

        assert_eq!(first, Outcome::Complete(RecordResult::Created));
        assert_eq!(
            second,
            Outcome::Complete(RecordResult::Incremented { frequency: 2 })
        );
        assert_eq!(store.len(), 1);
        assert_eq!(repo.snapshot()[0].frequency, 2);
        assert_eq!(repo.save_count(), 2);
    }

    #[tokio::test]
    async fn test_different_locators_are_distinct() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let mut store = store(&repo).await;

        store
            .record_failure(&FailureRecord::failed("t", "Timeout waiting for selector '#a'"))
            .await;
        store
            .record_failure(&FailureRecord::failed("t", "Timeout waiting for selector '#b'"))
            .await;

        assert_eq!(store.len(), 2);
        let kinds: Vec<_> = store.patterns().iter().map(|p| p.failure_kind).collect();
        assert_eq!(kinds, [FailureKind::TimingIssue; 2]);
    }

    #[tokio::test]
    async fn test_non_failure_is_ignored_without_write() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let mut store = store(&repo).await;
        let mut record = FailureRecord::failed("t", "timeout");
        record.status = TestStatus::Skipped;

        let outcome = store.record_failure(&record).await;

        assert_eq!(outcome, Outcome::Complete(RecordResult::Ignored));
        assert!(store.is_empty());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_degrades_but_keeps_state() {
        let repo = Arc::new(InMemoryPatternRepository::failing());
        let mut store = store(&repo).await;

        let outcome = store
            .record_failure(&FailureRecord::failed("t", "connection reset"))
            .await;

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value(), Some(&RecordResult::Created));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_store_opens_empty_and_degraded() {
        let repo = Arc::new(InMemoryPatternRepository::unreadable());
        let outcome = PatternStore::open(repo).await;

        assert!(outcome.is_degraded());
        assert!(outcome.value().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_and_compact() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let mut store = store(&repo).await;
        let now = Utc::now();

        let old = FailureRecord::failed("old", "timeout");
        let new = FailureRecord::failed("new", "timeout");
        store
            .record_failure_at(&old, now - Duration::days(100))
            .await;
        store.record_failure_at(&new, now - Duration::days(1)).await;

        assert_eq!(store.recent_at(Duration::days(7), now).len(), 1);

        let removed = store.compact_at(Duration::days(90), now).await;
        assert_eq!(removed, Outcome::Complete(1));
        assert_eq!(store.patterns()[0].test_name, "new");
        assert_eq!(repo.snapshot().len(), 1);
    }
}

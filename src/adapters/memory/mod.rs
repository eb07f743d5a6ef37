//! In-memory collection repositories.
//!
//! Used by tests and by callers that want learning without persistence.
//! `failing()` builds a repository whose writes always error, for exercising
//! degraded paths.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{AdaptiveRule, FailurePattern, TestRunRecord};
use crate::domain::ports::{PatternRepository, RuleRepository, RunHistoryRepository};

/// Generic in-memory collection with an optional injected write failure.
#[derive(Debug, Default)]
pub struct InMemoryRepository<T> {
    items: Mutex<Vec<T>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    saves: AtomicUsize,
}

impl<T: Clone> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        let repo = Self::new();
        *repo.lock() = items;
        repo
    }

    /// A repository whose every save fails.
    pub fn failing() -> Self {
        let repo = Self::new();
        repo.fail_writes.store(true, Ordering::SeqCst);
        repo
    }

    /// A repository whose every load fails.
    pub fn unreadable() -> Self {
        let repo = Self::new();
        repo.fail_reads.store(true, Ordering::SeqCst);
        repo
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn load(&self) -> StoreResult<Vec<T>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        Ok(self.lock().clone())
    }

    fn save(&self, items: &[T]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("write"));
        }
        *self.lock() = items.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Io {
        path: "<memory>".to_string(),
        source: std::io::Error::other(format!("injected {op} failure")),
    }
}

pub type InMemoryPatternRepository = InMemoryRepository<FailurePattern>;
pub type InMemoryRuleRepository = InMemoryRepository<AdaptiveRule>;
pub type InMemoryRunHistoryRepository = InMemoryRepository<TestRunRecord>;

#[async_trait]
impl PatternRepository for InMemoryRepository<FailurePattern> {
    async fn load_all(&self) -> StoreResult<Vec<FailurePattern>> {
        self.load()
    }

    async fn save_all(&self, patterns: &[FailurePattern]) -> StoreResult<()> {
        self.save(patterns)
    }
}

#[async_trait]
impl RuleRepository for InMemoryRepository<AdaptiveRule> {
    async fn load_all(&self) -> StoreResult<Vec<AdaptiveRule>> {
        self.load()
    }

    async fn save_all(&self, rules: &[AdaptiveRule]) -> StoreResult<()> {
        self.save(rules)
    }
}

#[async_trait]
impl RunHistoryRepository for InMemoryRepository<TestRunRecord> {
    async fn load_all(&self) -> StoreResult<Vec<TestRunRecord>> {
        self.load()
    }

    async fn save_all(&self, runs: &[TestRunRecord]) -> StoreResult<()> {
        self.save(runs)
    }
}

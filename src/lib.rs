//! Adaptest - adaptive test failure learning
//!
//! Adaptest classifies test failures, remembers recurring failure patterns,
//! synthesizes adaptive rules from them, rewrites test files with those
//! rules, and turns the run history into ranked insights.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and error types
//! - **Service Layer** (`services`): Classification, learning, adaptation, and analytics
//! - **Adapter Layer** (`adapters`): JSON and in-memory stores, the pytest runner
//! - **Infrastructure Layer** (`infrastructure`): Configuration, logging, the HTTP synthesizer client
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use adaptest::adapters::memory::InMemoryPatternRepository;
//! use adaptest::domain::models::FailureRecord;
//! use adaptest::services::PatternStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut store = PatternStore::open(Arc::new(InMemoryPatternRepository::new()))
//!         .await
//!         .into_value()
//!         .unwrap();
//!     let record = FailureRecord::failed("test_search", "Timeout waiting for selector '#results'");
//!     store.record_failure(&record).await;
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AdaptiveRule, Config, Diagnostic, FailureKind, FailurePattern, FailureRecord, InsightRecord,
    Outcome, Severity, TestRunRecord, TestRunReport,
};
pub use domain::ports::{
    PatternRepository, RuleRepository, RunHistoryRepository, TestRunner, TestSynthesizer,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CycleOrchestrator, InsightAggregator, PatternStore, RuleApplicator, RuleBook,
    RuleSynthesizer, RunHistory,
};

//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - PatternRepository / RuleRepository / RunHistoryRepository: persisted collections
//! - TestSynthesizer: AI test generation and analysis collaborator
//! - TestRunner: external test harness
//!
//! Services receive these as injected handles so each store can be swapped
//! for an in-memory implementation in tests.

pub mod pattern_repository;
pub mod rule_repository;
pub mod run_history_repository;
pub mod test_runner;
pub mod test_synthesizer;

pub use pattern_repository::PatternRepository;
pub use rule_repository::RuleRepository;
pub use run_history_repository::RunHistoryRepository;
pub use test_runner::TestRunner;
pub use test_synthesizer::TestSynthesizer;

//! JSON file adapters for the persisted collections.
//!
//! Each collection lives in one pretty-printed JSON array. Writes are
//! whole-file overwrites with no atomic rename; a crash mid-write can leave a
//! truncated file, which the next load reports as malformed.

pub mod collection_file;
pub mod history_repository;
pub mod pattern_repository;
pub mod rule_repository;

pub use collection_file::JsonCollectionFile;
pub use history_repository::JsonRunHistoryRepository;
pub use pattern_repository::JsonPatternRepository;
pub use rule_repository::JsonRuleRepository;

pub mod adaptation_summary;
pub mod classifier;
pub mod cycle;
pub mod improvement_service;
pub mod insight_aggregator;
pub mod insight_report;
pub mod pattern_store;
pub mod rule_applicator;
pub mod rule_book;
pub mod rule_synthesizer;
pub mod run_history;
pub mod test_generator;
pub mod trend;

#[cfg(test)]
mod test_support;

pub use adaptation_summary::{summarize_adaptation, AdaptationSummary};
pub use classifier::{
    FailureClassifier, KeywordClassifier, LocatorExtractor, PatternExtractor,
    RegexLocatorExtractor,
};
pub use cycle::{CycleOptions, CycleOrchestrator, CycleSummary};
pub use improvement_service::{FileImprovement, ImprovementService};
pub use insight_aggregator::{FlakyTest, InsightAggregator};
pub use insight_report::{dashboard, export_report, render_report, Dashboard};
pub use pattern_store::{PatternStore, RecordResult};
pub use rule_applicator::{Application, RuleApplicator, RuleTransform};
pub use rule_book::RuleBook;
pub use rule_synthesizer::RuleSynthesizer;
pub use run_history::RunHistory;
pub use test_generator::{
    save_generation_metadata, summarize_generation, GeneratedTest, GenerationSummary,
    TestGenerator,
};

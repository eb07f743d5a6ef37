pub mod config;
pub mod failure;
pub mod insight;
pub mod outcome;
pub mod rule;
pub mod synthesis;
pub mod test_run;

pub use config::{
    AnalyticsConfig, Config, LearningConfig, LogFormat, LoggingConfig, RotationPolicy,
    RunnerConfig, SynthesizerConfig,
};
pub use failure::{FailureKind, FailurePattern, FailureRecord, PatternKey, TestStatus};
pub use insight::{rank_insights, InsightCategory, InsightRecord, Severity};
pub use outcome::{Diagnostic, Outcome};
pub use rule::{AdaptiveRule, AppliedRule, RuleFeedback};
pub use synthesis::{
    CollaboratorInsight, FailureAnalysis, FailureAnalysisRequest, InsightRequest,
    InsightResponse, TestGenerationRequest, TestGenerationResult, TestType, TrendSnapshot,
};
pub use test_run::{TestOutcome, TestRunRecord, TestRunReport};

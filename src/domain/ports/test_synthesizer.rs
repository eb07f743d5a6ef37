use crate::domain::errors::SynthesizerError;
use crate::domain::models::{
    FailureAnalysis, FailureAnalysisRequest, InsightRequest, InsightResponse,
    TestGenerationRequest, TestGenerationResult,
};
use async_trait::async_trait;

/// Port for the AI test-synthesis collaborator
///
/// Implementations carry their own timeout and never retry. Callers are
/// expected to fall back to local logic on any error.
#[async_trait]
pub trait TestSynthesizer: Send + Sync {
    /// Turn a user story into test source
    async fn generate_tests(
        &self,
        request: &TestGenerationRequest,
    ) -> Result<TestGenerationResult, SynthesizerError>;

    /// Ask for a data-informed fix for a group of failure patterns
    async fn analyze_failures(
        &self,
        request: &FailureAnalysisRequest,
    ) -> Result<FailureAnalysis, SynthesizerError>;

    /// Ask for additional insights over recent run history
    async fn get_insights(
        &self,
        request: &InsightRequest,
    ) -> Result<InsightResponse, SynthesizerError>;
}

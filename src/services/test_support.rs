//! Collaborator doubles shared by service unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::errors::SynthesizerError;
use crate::domain::models::{
    FailureAnalysis, FailureAnalysisRequest, InsightRequest, InsightResponse,
    TestGenerationRequest, TestGenerationResult,
};
use crate::domain::ports::TestSynthesizer;

/// Synthesizer that returns canned responses, or `Unavailable` when unset.
#[derive(Default)]
pub struct StubSynthesizer {
    pub generation: Option<TestGenerationResult>,
    pub analysis: Option<FailureAnalysis>,
    pub insights: Option<InsightResponse>,
    pub calls: AtomicUsize,
    pub last_generation: Mutex<Option<TestGenerationRequest>>,
    pub last_analysis_sample: AtomicUsize,
}

impl StubSynthesizer {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn down() -> SynthesizerError {
        SynthesizerError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl TestSynthesizer for StubSynthesizer {
    async fn generate_tests(
        &self,
        request: &TestGenerationRequest,
    ) -> Result<TestGenerationResult, SynthesizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_generation
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(request.clone());
        self.generation.clone().ok_or_else(Self::down)
    }

    async fn analyze_failures(
        &self,
        request: &FailureAnalysisRequest,
    ) -> Result<FailureAnalysis, SynthesizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_analysis_sample
            .store(request.failure_patterns.len(), Ordering::SeqCst);
        self.analysis.clone().ok_or_else(Self::down)
    }

    async fn get_insights(
        &self,
        _request: &InsightRequest,
    ) -> Result<InsightResponse, SynthesizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.insights.clone().ok_or_else(Self::down)
    }
}

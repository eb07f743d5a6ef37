//! HTTP client for the test synthesizer service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::rate_limiter::TokenBucketRateLimiter;
use crate::domain::errors::SynthesizerError;
use crate::domain::models::{
    FailureAnalysis, FailureAnalysisRequest, InsightRequest, InsightResponse, SynthesizerConfig,
    TestGenerationRequest, TestGenerationResult,
};
use crate::domain::ports::TestSynthesizer;

const GENERATE_PATH: &str = "/api/tests/generate";
const ANALYZE_PATH: &str = "/api/tests/analyze-failures";
const INSIGHTS_PATH: &str = "/api/analytics/insights";

/// `TestSynthesizer` over JSON/HTTP.
///
/// Each request waits for a rate-limit token and is bounded by the client
/// timeout. Failures are mapped to [`SynthesizerError`] and never retried.
pub struct HttpTestSynthesizer {
    http_client: ReqwestClient,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: TokenBucketRateLimiter,
}

impl HttpTestSynthesizer {
    pub fn new(config: &SynthesizerConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            rate_limiter: TokenBucketRateLimiter::new(config.requests_per_second),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    #[instrument(skip(self, body))]
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, SynthesizerError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.rate_limiter.acquire().await;

        let response = self
            .authorize(self.http_client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            warn!(
                path,
                status = status.as_u16(),
                "Synthesizer returned error status"
            );
            return Err(SynthesizerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(path, bytes = text.len(), "Synthesizer response received");
        serde_json::from_str(&text).map_err(|e| SynthesizerError::MalformedResponse(e.to_string()))
    }
}

fn map_transport_error(error: reqwest::Error) -> SynthesizerError {
    if error.is_timeout() {
        SynthesizerError::Timeout
    } else {
        SynthesizerError::Unavailable(error.to_string())
    }
}

#[async_trait]
impl TestSynthesizer for HttpTestSynthesizer {
    async fn generate_tests(
        &self,
        request: &TestGenerationRequest,
    ) -> Result<TestGenerationResult, SynthesizerError> {
        self.post_json(GENERATE_PATH, request).await
    }

    async fn analyze_failures(
        &self,
        request: &FailureAnalysisRequest,
    ) -> Result<FailureAnalysis, SynthesizerError> {
        self.post_json(ANALYZE_PATH, request).await
    }

    async fn get_insights(
        &self,
        request: &InsightRequest,
    ) -> Result<InsightResponse, SynthesizerError> {
        self.post_json(INSIGHTS_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FailureKind, TestType, TrendSnapshot};

    fn client(base_url: &str, api_key: Option<&str>) -> HttpTestSynthesizer {
        HttpTestSynthesizer::new(&SynthesizerConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(ToString::to_string),
            timeout_secs: 5,
            requests_per_second: 100.0,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_bearer_and_parses_body() {
        let body = serde_json::json!({
            "testCode": "def test_x(): pass",
            "testName": "test_x",
            "confidenceScore": 0.9
        })
        .to_string();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "userStory": "As a shopper, I want to search",
                "testType": "e2e"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let synthesizer = client(&server.url(), Some("secret"));
        let request =
            TestGenerationRequest::new("As a shopper, I want to search", TestType::E2e, "search");
        let result = synthesizer.generate_tests(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.test_name, "test_x");
        assert!((result.confidence_score - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_error_status_is_mapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", ANALYZE_PATH)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let synthesizer = client(&server.url(), None);
        let request = FailureAnalysisRequest {
            failure_kind: FailureKind::AssertionFailure,
            failure_patterns: vec![],
        };
        let err = synthesizer.analyze_failures(&request).await.unwrap_err();

        match &err {
            SynthesizerError::Status { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_mapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", INSIGHTS_PATH)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let synthesizer = client(&format!("{}/", server.url()), None);
        let request = InsightRequest {
            request_type: "trend_analysis".to_string(),
            test_history: vec![],
            performance_trends: TrendSnapshot::default(),
        };
        let err = synthesizer.get_insights(&request).await.unwrap_err();
        assert!(matches!(err, SynthesizerError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let synthesizer = client("http://127.0.0.1:1", None);
        let request = TestGenerationRequest::new("story", TestType::Unit, "general_ecommerce");
        let err = synthesizer.generate_tests(&request).await.unwrap_err();
        assert!(matches!(err, SynthesizerError::Unavailable(_)));
    }
}

//! Request and response types exchanged with the test synthesizer collaborator.
//!
//! Wire field names are camelCase to match the synthesizer service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::failure::{FailureKind, FailurePattern};
use super::insight::{InsightCategory, InsightRecord, Severity};
use super::test_run::TestRunRecord;

/// Kind of test to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    #[default]
    E2e,
    Unit,
    Integration,
    Performance,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E2e => "e2e",
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::Performance => "performance",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "e2e" => Some(Self::E2e),
            "unit" => Some(Self::Unit),
            "integration" => Some(Self::Integration),
            "performance" => Some(Self::Performance),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGenerationRequest {
    pub user_story: String,
    pub test_type: TestType,
    pub component_context: String,
    #[serde(default)]
    pub existing_tests: Vec<String>,
    #[serde(default)]
    pub business_rules: Vec<String>,
}

impl TestGenerationRequest {
    pub fn new(
        user_story: impl Into<String>,
        test_type: TestType,
        component_context: impl Into<String>,
    ) -> Self {
        Self {
            user_story: user_story.into(),
            test_type,
            component_context: component_context.into(),
            existing_tests: Vec::new(),
            business_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGenerationResult {
    #[serde(default)]
    pub test_code: String,
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub suggested_improvements: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Sample of patterns sent for a data-informed fix suggestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureAnalysisRequest {
    pub failure_kind: FailureKind,
    pub failure_patterns: Vec<FailurePattern>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureAnalysis {
    #[serde(default, alias = "suggested_fix")]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Per-run trend series handed to the collaborator alongside raw history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSnapshot {
    pub pass_rates: Vec<f64>,
    pub mean_durations: Vec<f64>,
    pub pass_rate_slope: f64,
    pub duration_slope: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub request_type: String,
    pub test_history: Vec<TestRunRecord>,
    pub performance_trends: TrendSnapshot,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightResponse {
    #[serde(default)]
    pub insights: Vec<CollaboratorInsight>,
}

/// Insight as returned by the collaborator; every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaboratorInsight {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl From<CollaboratorInsight> for InsightRecord {
    fn from(insight: CollaboratorInsight) -> Self {
        Self {
            category: InsightCategory::AiAnalysis,
            title: insight
                .title
                .unwrap_or_else(|| "AI-Generated Insight".to_string()),
            description: insight.description.unwrap_or_default(),
            severity: insight
                .severity
                .as_deref()
                .map_or(Severity::Medium, Severity::parse_lenient),
            recommendations: insight.recommendations,
            confidence: insight.confidence.unwrap_or(0.7).clamp(0.0, 1.0),
            data: insight.data,
        }
    }
}

//! Story-driven test generation with a deterministic local fallback.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::domain::models::{
    Diagnostic, FailureKind, FailurePattern, Outcome, TestGenerationRequest, TestGenerationResult,
    TestType,
};
use crate::domain::ports::TestSynthesizer;

const COMPONENT: &str = "test_generator";

/// Generated tests scoring below this are logged as low confidence.
const LOW_CONFIDENCE: f64 = 0.3;

const CONTEXT_KEYWORDS: [(&str, &str); 12] = [
    ("login", "authentication"),
    ("register", "authentication"),
    ("sign", "authentication"),
    ("cart", "shopping_cart"),
    ("checkout", "checkout_flow"),
    ("payment", "payment_processing"),
    ("product", "product_catalog"),
    ("search", "product_search"),
    ("review", "user_reviews"),
    ("wishlist", "wishlist_management"),
    ("order", "order_management"),
    ("profile", "user_profile"),
];

const STOP_WORDS: [&str; 20] = [
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "as",
    "i", "want", "can", "so", "that",
];

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));
static NON_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w]").expect("valid identifier regex"));
static UNSAFE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-.]").expect("valid filename regex"));
static TEST_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"def (test_\w+)").expect("valid test fn regex"));

/// Every component context the story mentions, or `general_ecommerce`.
pub fn extract_component_context(story: &str) -> String {
    let lowered = story.to_lowercase();
    let mut contexts: Vec<&str> = Vec::new();
    for (keyword, context) in CONTEXT_KEYWORDS {
        if lowered.contains(keyword) && !contexts.contains(&context) {
            contexts.push(context);
        }
    }
    if contexts.is_empty() {
        "general_ecommerce".to_string()
    } else {
        contexts.join(", ")
    }
}

pub fn default_business_rules() -> Vec<String> {
    [
        "Users must be authenticated for checkout",
        "Cart total must be positive",
        "Product quantities must be valid integers",
        "Email addresses must be valid format",
        "Passwords must meet security requirements",
        "Payment methods must be supported",
        "Shipping addresses must be complete",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// PascalCase from the first four meaningful words of the story.
pub fn story_to_class_name(story: &str) -> String {
    let lowered = story.to_lowercase();
    let name: String = WORD
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| !STOP_WORDS.contains(w))
        .take(4)
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if name.is_empty() {
        "GeneratedTest".to_string()
    } else {
        name
    }
}

fn story_identifier(story: &str) -> String {
    NON_IDENT
        .replace_all(&story.to_lowercase().replace(' ', "_"), "_")
        .into_owned()
}

/// Local template used when the synthesizer cannot be reached.
pub fn fallback_generation(request: &TestGenerationRequest) -> TestGenerationResult {
    let ident = story_identifier(&request.user_story);
    let story = &request.user_story;
    let component = &request.component_context;

    let test_code = match request.test_type {
        TestType::E2e => format!(
            "\ndef test_{ident}_e2e(automation):\n    \"\"\"Test: {story}\"\"\"\n    # Generated test based on user story\n    # Component: {component}\n\n    # Implement test steps here\n    pass\n"
        ),
        TestType::Unit => format!(
            "\ndef test_{ident}_unit():\n    \"\"\"Test: {story}\"\"\"\n    # Component: {component}\n\n    # Implement unit test here\n    pass\n"
        ),
        other => format!(
            "\ndef test_{ident}():\n    \"\"\"Test: {story}\"\"\"\n    # Type: {other}\n    # Component: {component}\n\n    # Implement test here\n    pass\n"
        ),
    };

    TestGenerationResult {
        test_code,
        test_name: format!("test_{ident}"),
        description: format!("Auto-generated test for: {story}"),
        confidence_score: 0.5,
        suggested_improvements: vec![
            "Add proper assertions".to_string(),
            "Include error handling".to_string(),
            "Add test data validation".to_string(),
        ],
        dependencies: Vec::new(),
    }
}

const E2E_TEMPLATE: &str = r#""""
Generated E2E Test: {test_name}
Generated on: {timestamp}
User Story: {user_story}
"""

import pytest


@pytest.mark.e2e
class Test{class_name}:
    """Generated E2E test class for {user_story}"""

    {test_methods}
"#;

const UNIT_TEMPLATE: &str = r#""""
Generated Unit Test: {test_name}
Generated on: {timestamp}
User Story: {user_story}
"""

import pytest
import unittest.mock as mock


@pytest.mark.unit
class Test{class_name}:
    """Generated unit test class for {user_story}"""

    {test_methods}
"#;

const INTEGRATION_TEMPLATE: &str = r#""""
Generated Integration Test: {test_name}
Generated on: {timestamp}
User Story: {user_story}
"""

import pytest
import requests


@pytest.mark.integration
class Test{class_name}:
    """Generated integration test class for {user_story}"""

    def setup_method(self):
        self.base_url = "http://localhost:3002"
        self.api_url = "http://localhost:3001"

    {test_methods}
"#;

const GENERIC_TEMPLATE: &str = r#""""
Generated {test_type} Test: {test_name}
"""

import pytest

class Test{class_name}:
    {test_methods}
"#;

/// Fill the per-type file template. Unknown labels get the generic one.
pub fn render_test_file(
    result: &TestGenerationResult,
    story: &str,
    label: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let template = match label {
        "e2e" => E2E_TEMPLATE,
        "unit" => UNIT_TEMPLATE,
        "integration" => INTEGRATION_TEMPLATE,
        _ => GENERIC_TEMPLATE,
    };

    template
        .replace("{test_name}", &result.test_name)
        .replace("{class_name}", &story_to_class_name(story))
        .replace("{user_story}", story)
        .replace("{timestamp}", &timestamp.to_rfc3339())
        .replace("{test_type}", label)
        .replace("{test_methods}", &result.test_code)
}

/// Names of `test_*` functions in `test_*.py` files under `dirs`.
pub async fn discover_existing_tests(dirs: &[PathBuf]) -> Vec<String> {
    let mut names = Vec::new();
    for file in discover_test_files(dirs).await {
        match tokio::fs::read_to_string(&file).await {
            Ok(content) => {
                for caps in TEST_FN.captures_iter(&content) {
                    names.push(caps[1].to_string());
                }
            }
            Err(e) => warn!(path = %file.display(), error = %e, "Could not read test file"),
        }
    }
    names
}

fn is_test_file_name(name: &str) -> bool {
    name.ends_with(".py") && (name.starts_with("test_") || name.ends_with("_test.py"))
}

/// `test_*.py` and `*_test.py` files directly inside each of `dirs`,
/// sorted per directory.
pub async fn discover_test_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            debug!(path = %dir.display(), "Test directory not present");
            continue;
        };
        let mut found = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_test_file_name);
            if is_test {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }
    files
}

/// Metadata for a written test file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTest {
    pub file_path: PathBuf,
    pub test_name: String,
    pub user_story: String,
    pub test_type: String,
    pub confidence_score: f64,
    pub suggestions: Vec<String>,
    pub dependencies: Vec<String>,
    pub generated_at: DateTime<Utc>,
    /// Produced by the local template rather than the synthesizer.
    pub fallback: bool,
}

/// Aggregate view over a batch of generated tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub total_tests: usize,
    pub test_types: BTreeMap<String, usize>,
    pub avg_confidence: f64,
    pub files_generated: Vec<PathBuf>,
    /// Distinct suggestions in first-seen order, at most ten.
    pub suggestions: Vec<String>,
}

impl GenerationSummary {
    pub fn render(&self) -> String {
        if self.total_tests == 0 {
            return "No tests generated.".to_string();
        }

        let mut lines = vec![
            "AI Test Generation Summary".to_string(),
            "=".repeat(25),
            format!("Generated: {} tests", self.total_tests),
            format!("Average Confidence: {:.2}", self.avg_confidence),
            String::new(),
            "Test Types:".to_string(),
        ];
        for (test_type, count) in &self.test_types {
            lines.push(format!("  - {test_type}: {count}"));
        }
        lines.push(String::new());
        lines.push("Files Generated:".to_string());
        for file in &self.files_generated {
            lines.push(format!("  - {}", file.display()));
        }
        if !self.suggestions.is_empty() {
            lines.push(String::new());
            lines.push("Common Suggestions:".to_string());
            lines.extend(self.suggestions.iter().map(|s| format!("  - {s}")));
        }
        lines.join("\n")
    }
}

pub fn summarize_generation(tests: &[GeneratedTest]) -> GenerationSummary {
    if tests.is_empty() {
        return GenerationSummary::default();
    }

    let total_confidence: f64 = tests.iter().map(|t| t.confidence_score).sum();
    let mut test_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut suggestions: Vec<String> = Vec::new();
    for test in tests {
        *test_types.entry(test.test_type.clone()).or_default() += 1;
        for suggestion in &test.suggestions {
            if suggestions.len() < 10 && !suggestions.contains(suggestion) {
                suggestions.push(suggestion.clone());
            }
        }
    }

    GenerationSummary {
        total_tests: tests.len(),
        test_types,
        avg_confidence: total_confidence / tests.len() as f64,
        files_generated: tests.iter().map(|t| t.file_path.clone()).collect(),
        suggestions,
    }
}

/// Write `tests` as pretty JSON to `<dir>/generation_metadata_<timestamp>.json`.
pub async fn save_generation_metadata(tests: &[GeneratedTest], dir: &Path) -> Outcome<PathBuf> {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("generation_metadata_{stamp}.json"));
    let json = match serde_json::to_string_pretty(tests) {
        Ok(json) => json,
        Err(e) => return Outcome::failed(Diagnostic::new(COMPONENT, e.to_string())),
    };

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(path = %dir.display(), error = %e, "Cannot create metadata directory");
        return Outcome::failed(Diagnostic::new(COMPONENT, e.to_string()));
    }
    match tokio::fs::write(&path, json).await {
        Ok(()) => {
            info!(path = %path.display(), tests = tests.len(), "Saved generation metadata");
            Outcome::Complete(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot write generation metadata");
            Outcome::failed(Diagnostic::new(COMPONENT, e.to_string()))
        }
    }
}

pub struct TestGenerator {
    synthesizer: Option<Arc<dyn TestSynthesizer>>,
    output_dir: PathBuf,
    existing_test_dirs: Vec<PathBuf>,
}

impl TestGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            synthesizer: None,
            output_dir: output_dir.into(),
            existing_test_dirs: vec![PathBuf::from("tests")],
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn TestSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Directories scanned for existing test names sent with each request.
    pub fn with_existing_test_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.existing_test_dirs = dirs;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate and write one test file for `story`.
    ///
    /// Falls back to the local template (degraded) when the synthesizer is
    /// missing or fails. Only a write failure yields `Failed`.
    pub async fn generate(&self, story: &str, test_type: TestType) -> Outcome<GeneratedTest> {
        let mut request =
            TestGenerationRequest::new(story, test_type, extract_component_context(story));
        request.existing_tests = discover_existing_tests(&self.existing_test_dirs).await;
        request.business_rules = default_business_rules();

        let label = test_type.as_str();
        self.generate_from_request(&request, label).await
    }

    /// Generate a test file per story. Failures are skipped, not fatal.
    pub async fn generate_all(
        &self,
        stories: &[String],
        test_type: TestType,
    ) -> Outcome<Vec<GeneratedTest>> {
        let mut generated = Vec::new();
        let mut diagnostics = Vec::new();
        for story in stories {
            let (value, diags) = self.generate(story, test_type).await.into_parts();
            generated.extend(value);
            diagnostics.extend(diags);
        }
        Outcome::from_parts(generated, diagnostics)
    }

    /// One preventive test per failure kind seen for `component`.
    ///
    /// A pattern belongs to the component when its test name or context
    /// mentions it, case-insensitively.
    pub async fn generate_predictive(
        &self,
        component: &str,
        patterns: &[FailurePattern],
    ) -> Outcome<Vec<GeneratedTest>> {
        let needle = component.to_lowercase();
        let mut kinds: Vec<FailureKind> = Vec::new();
        for pattern in patterns {
            let context = serde_json::to_string(&pattern.context).unwrap_or_default();
            let relevant = pattern.test_name.to_lowercase().contains(&needle)
                || context.to_lowercase().contains(&needle);
            if relevant && !kinds.contains(&pattern.failure_kind) {
                kinds.push(pattern.failure_kind);
            }
        }

        let mut generated = Vec::new();
        let mut diagnostics = Vec::new();
        for kind in kinds {
            let story = format!("As a tester, I want to prevent {kind} issues in {component}");
            let mut request = TestGenerationRequest::new(&story, TestType::E2e, component);
            request.business_rules =
                vec![format!("Prevent {kind} failures based on historical data")];

            let (value, diags) = self
                .generate_from_request(&request, "predictive")
                .await
                .into_parts();
            generated.extend(value);
            diagnostics.extend(diags);
        }

        info!(
            component,
            generated = generated.len(),
            "Generated predictive tests"
        );
        Outcome::from_parts(generated, diagnostics)
    }

    async fn generate_from_request(
        &self,
        request: &TestGenerationRequest,
        label: &str,
    ) -> Outcome<GeneratedTest> {
        let mut diagnostics = Vec::new();
        let (result, fallback) = match &self.synthesizer {
            Some(synthesizer) => match synthesizer.generate_tests(request).await {
                Ok(result) => (result, false),
                Err(e) => {
                    warn!(error = %e, "Test generation failed, using fallback template");
                    diagnostics.push(Diagnostic::new(COMPONENT, e.to_string()));
                    (fallback_generation(request), true)
                }
            },
            None => (fallback_generation(request), true),
        };

        if result.confidence_score < LOW_CONFIDENCE {
            warn!(
                confidence = result.confidence_score,
                story = %request.user_story,
                "Low confidence generated test"
            );
        }

        let now = Utc::now();
        let content = render_test_file(&result, &request.user_story, label, now);
        let base = if result.test_name.trim().is_empty() {
            "generated_test".to_string()
        } else {
            UNSAFE_FILENAME
                .replace_all(&result.test_name, "_")
                .into_owned()
        };
        let file_path = self.output_dir.join(format!("{base}_{label}.py"));

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            warn!(path = %self.output_dir.display(), error = %e, "Cannot create output directory");
            diagnostics.push(Diagnostic::new(COMPONENT, e.to_string()));
            return Outcome::Failed { diagnostics };
        }
        if let Err(e) = tokio::fs::write(&file_path, content).await {
            warn!(path = %file_path.display(), error = %e, "Cannot write generated test");
            diagnostics.push(Diagnostic::new(COMPONENT, e.to_string()));
            return Outcome::Failed { diagnostics };
        }

        info!(path = %file_path.display(), fallback, "Generated test");
        Outcome::from_parts(
            GeneratedTest {
                file_path,
                test_name: result.test_name,
                user_story: request.user_story.clone(),
                test_type: label.to_string(),
                confidence_score: result.confidence_score,
                suggestions: result.suggested_improvements,
                dependencies: result.dependencies,
                generated_at: now,
                fallback,
            },
            diagnostics,
        )
    }
}

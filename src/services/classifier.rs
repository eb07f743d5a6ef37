//! Failure classification strategies.
//!
//! Classification and locator extraction are pure functions behind small
//! traits so new kinds or extraction patterns can be added without touching
//! the aggregation services.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::domain::models::{FailureKind, FailurePattern, FailureRecord, TestStatus};

/// Maps an error message to a [`FailureKind`]. Must be total and deterministic.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, message: &str) -> FailureKind;
}

/// Pulls an element locator out of an error message, if one is present.
pub trait LocatorExtractor: Send + Sync {
    fn extract_locator(&self, message: &str) -> Option<String>;
}

/// Ordered keyword table. First rule with any matching keyword wins.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Vec<String>, FailureKind)>,
}

impl KeywordClassifier {
    /// Build a classifier from an ordered `(keywords, kind)` table.
    pub fn new<I, K, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, FailureKind)>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(keywords, kind)| {
                    let keywords = keywords
                        .into_iter()
                        .map(|k| k.into().to_lowercase())
                        .collect();
                    (keywords, kind)
                })
                .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    /// Timing before selector before network before assertion before
    /// permission before data.
    fn default() -> Self {
        Self::new([
            (
                vec!["timeout", "wait", "element not found"],
                FailureKind::TimingIssue,
            ),
            (
                vec!["selector", "locator", "element"],
                FailureKind::ElementSelector,
            ),
            (
                vec!["network", "connection", "request"],
                FailureKind::NetworkIssue,
            ),
            (
                vec!["assertion", "expected", "actual"],
                FailureKind::AssertionFailure,
            ),
            (
                vec!["permission", "access", "forbidden"],
                FailureKind::PermissionIssue,
            ),
            (vec!["data", "invalid", "null"], FailureKind::DataIssue),
        ])
    }
}

impl FailureClassifier for KeywordClassifier {
    fn classify(&self, message: &str) -> FailureKind {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map_or(FailureKind::Unknown, |(_, kind)| *kind)
    }
}

static DEFAULT_LOCATOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)locator\s+['"]([^'"]+)['"]"#,
        r#"(?i)element\s+['"]([^'"]+)['"]"#,
        r#"(?i)selector\s+['"]([^'"]+)['"]"#,
        r#"['"]([#.\[\]@\w\-:]+)['"]"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid locator regex"))
    .collect()
});

/// Tries each regex in order and returns the first capture group that matches.
#[derive(Debug, Clone)]
pub struct RegexLocatorExtractor {
    patterns: Vec<Regex>,
}

impl RegexLocatorExtractor {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }
}

impl Default for RegexLocatorExtractor {
    /// `locator '...'`, then `element '...'`, then `selector '...'`, then any
    /// quoted token shaped like a CSS selector.
    fn default() -> Self {
        Self::new(DEFAULT_LOCATOR_PATTERNS.clone())
    }
}

impl LocatorExtractor for RegexLocatorExtractor {
    fn extract_locator(&self, message: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            re.captures(message)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

/// Classifier plus extractor: turns raw failure records into patterns.
pub struct PatternExtractor {
    classifier: Box<dyn FailureClassifier>,
    locators: Box<dyn LocatorExtractor>,
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(
            Box::new(KeywordClassifier::default()),
            Box::new(RegexLocatorExtractor::default()),
        )
    }
}

impl PatternExtractor {
    pub fn new(
        classifier: Box<dyn FailureClassifier>,
        locators: Box<dyn LocatorExtractor>,
    ) -> Self {
        Self {
            classifier,
            locators,
        }
    }

    pub fn classify(&self, message: &str) -> FailureKind {
        self.classifier.classify(message)
    }

    pub fn extract_locator(&self, message: &str) -> Option<String> {
        self.locators.extract_locator(message)
    }

    /// Build a pattern from a failed record, stamped with the current time.
    ///
    /// Returns `None` for anything whose status is not `failed`.
    pub fn extract_pattern(&self, record: &FailureRecord) -> Option<FailurePattern> {
        self.extract_pattern_at(record, Utc::now())
    }

    pub fn extract_pattern_at(
        &self,
        record: &FailureRecord,
        now: DateTime<Utc>,
    ) -> Option<FailurePattern> {
        if record.status != TestStatus::Failed {
            return None;
        }

        let mut pattern = FailurePattern::new(
            record.test_name.clone(),
            self.classify(&record.error_message),
            self.extract_locator(&record.error_message),
            record.error_message.clone(),
            now,
        );
        pattern.context = context_snapshot(record);
        Some(pattern)
    }
}

fn context_snapshot(record: &FailureRecord) -> BTreeMap<String, serde_json::Value> {
    let mut context = BTreeMap::new();
    context.insert(
        "browser".to_string(),
        serde_json::Value::from(record.browser.clone().unwrap_or_else(|| "unknown".into())),
    );
    context.insert(
        "viewport".to_string(),
        record
            .viewport
            .clone()
            .unwrap_or_else(|| serde_json::json!({})),
    );
    context.insert("duration".to_string(), serde_json::json!(record.duration));
    context.insert(
        "url".to_string(),
        serde_json::Value::from(record.url.clone().unwrap_or_default()),
    );
    context.insert(
        "screenshot".to_string(),
        serde_json::Value::from(record.screenshot.clone().unwrap_or_default()),
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table_order() {
        let c = KeywordClassifier::default();
        assert_eq!(
            c.classify("Timeout 30000ms exceeded"),
            FailureKind::TimingIssue
        );
        // "element not found" is a timing keyword and wins over "element"
        assert_eq!(
            c.classify("Element not found: '.btn'"),
            FailureKind::TimingIssue
        );
        assert_eq!(
            c.classify("bad locator strategy"),
            FailureKind::ElementSelector
        );
        assert_eq!(c.classify("Connection refused"), FailureKind::NetworkIssue);
        assert_eq!(
            c.classify("AssertionError: expected 3"),
            FailureKind::AssertionFailure
        );
        assert_eq!(c.classify("403 Forbidden"), FailureKind::PermissionIssue);
        assert_eq!(c.classify("value was NULL"), FailureKind::DataIssue);
        assert_eq!(c.classify("segfault"), FailureKind::Unknown);
        assert_eq!(c.classify(""), FailureKind::Unknown);
    }

    #[test]
    fn test_classify_first_match_wins() {
        let c = KeywordClassifier::default();
        // Mentions both a network and a timing keyword
        assert_eq!(
            c.classify("network request timeout"),
            FailureKind::TimingIssue
        );
    }

    #[test]
    fn test_custom_table() {
        let c = KeywordClassifier::new([(vec!["flaky"], FailureKind::DataIssue)]);
        assert_eq!(c.classify("FLAKY thing"), FailureKind::DataIssue);
        assert_eq!(c.classify("timeout"), FailureKind::Unknown);
    }

    #[test]
    fn test_extract_locator_phrases() {
        let x = RegexLocatorExtractor::default();
        assert_eq!(
            x.extract_locator("waiting for locator 'button.submit'"),
            Some("button.submit".to_string())
        );
        assert_eq!(
            x.extract_locator("ELEMENT \"#nav a\" detached"),
            Some("#nav a".to_string())
        );
        assert_eq!(
            x.extract_locator("Timeout waiting for selector '#search-results'"),
            Some("#search-results".to_string())
        );
        assert_eq!(
            x.extract_locator("Element not found: '.add-to-cart-btn'"),
            Some(".add-to-cart-btn".to_string())
        );
        assert_eq!(x.extract_locator("no quotes here"), None);
    }

    #[test]
    fn test_generic_token_rejects_spaces() {
        let x = RegexLocatorExtractor::default();
        assert_eq!(x.extract_locator("got 'hello world'"), None);
    }

    #[test]
    fn test_extract_pattern_ignores_non_failures() {
        let extractor = PatternExtractor::default();
        let mut record = FailureRecord::failed("t", "timeout");
        record.status = TestStatus::Passed;
        assert!(extractor.extract_pattern(&record).is_none());
    }

    #[test]
    fn test_extract_pattern_builds_context() {
        let extractor = PatternExtractor::default();
        let record = FailureRecord::failed("test_search", "Timeout waiting for selector '#q'")
            .with_browser("chromium")
            .with_duration(30000.0);

        let pattern = extractor.extract_pattern(&record).unwrap();
        assert_eq!(pattern.failure_kind, FailureKind::TimingIssue);
        assert_eq!(pattern.element_locator.as_deref(), Some("#q"));
        assert_eq!(pattern.frequency, 1);
        assert_eq!(pattern.context["browser"], "chromium");
        assert_eq!(pattern.context["url"], "");
        assert_eq!(pattern.context["viewport"], serde_json::json!({}));
    }
}

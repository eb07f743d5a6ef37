//! Failure domain model.
//!
//! A [`FailureRecord`] is one raw failed (or passed) test outcome reported by a
//! runner. Classified failures are folded into [`FailurePattern`]s, which are
//! deduplicated by [`PatternKey`] and counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome status of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    /// Anything the runner reported that we do not recognize.
    #[default]
    #[serde(other)]
    Unknown,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure input as produced by a test runner.
///
/// Every field is defaulted so that partially populated records are accepted
/// rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(default, alias = "name")]
    pub test_name: String,

    #[serde(default)]
    pub status: TestStatus,

    #[serde(default, alias = "error")]
    pub error_message: String,

    #[serde(default)]
    pub browser: Option<String>,

    #[serde(default)]
    pub viewport: Option<serde_json::Value>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub screenshot: Option<String>,

    /// Duration in the runner's own time unit.
    #[serde(default)]
    pub duration: f64,
}

impl FailureRecord {
    /// Convenience constructor for a failed test.
    pub fn failed(test_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            status: TestStatus::Failed,
            error_message: error_message.into(),
            ..Default::default()
        }
    }

    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }
}

/// Closed set of failure kinds derived from error-message keywords.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TimingIssue,
    ElementSelector,
    NetworkIssue,
    AssertionFailure,
    PermissionIssue,
    DataIssue,
    #[default]
    Unknown,
}

impl FailureKind {
    /// All kinds, in classification order.
    pub const ALL: [Self; 7] = [
        Self::TimingIssue,
        Self::ElementSelector,
        Self::NetworkIssue,
        Self::AssertionFailure,
        Self::PermissionIssue,
        Self::DataIssue,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimingIssue => "timing_issue",
            Self::ElementSelector => "element_selector",
            Self::NetworkIssue => "network_issue",
            Self::AssertionFailure => "assertion_failure",
            Self::PermissionIssue => "permission_issue",
            Self::DataIssue => "data_issue",
            Self::Unknown => "unknown",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a failure pattern: at most one live pattern exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub test_name: String,
    pub failure_kind: FailureKind,
    pub element_locator: Option<String>,
}

/// A deduplicated, frequency-counted observation of a recurring failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub test_name: String,
    pub failure_kind: FailureKind,
    #[serde(default)]
    pub element_locator: Option<String>,

    /// Error message of the most recent occurrence.
    #[serde(default)]
    pub error_message: String,

    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    /// Occurrence count. Incremented on every repeat, never reset.
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

const fn default_frequency() -> u32 {
    1
}

impl FailurePattern {
    /// Create a first-occurrence pattern observed at `now`.
    pub fn new(
        test_name: impl Into<String>,
        failure_kind: FailureKind,
        element_locator: Option<String>,
        error_message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            failure_kind,
            element_locator,
            error_message: error_message.into(),
            first_seen: now,
            last_seen: now,
            frequency: 1,
            context: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> PatternKey {
        PatternKey {
            test_name: self.test_name.clone(),
            failure_kind: self.failure_kind,
            element_locator: self.element_locator.clone(),
        }
    }

    /// Whether the pattern was last seen at or after `cutoff`.
    pub fn seen_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_seen >= cutoff
    }

    /// Fold a repeat occurrence into this pattern.
    pub fn observe_repeat(&mut self, occurrence: &Self) {
        self.frequency = self.frequency.saturating_add(1);
        self.last_seen = occurrence.last_seen;
        self.error_message.clone_from(&occurrence.error_message);
        self.context.clone_from(&occurrence.context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_record_permissive_deserialize() {
        let record: FailureRecord = serde_json::from_str(r#"{"name": "test_login"}"#).unwrap();
        assert_eq!(record.test_name, "test_login");
        assert_eq!(record.status, TestStatus::Unknown);
        assert!(record.error_message.is_empty());
        assert!((record.duration - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unrecognized_status_is_unknown() {
        let record: FailureRecord =
            serde_json::from_str(r#"{"test_name": "t", "status": "xpassed"}"#).unwrap();
        assert_eq!(record.status, TestStatus::Unknown);
    }

    #[test]
    fn test_failure_kind_round_trip_str() {
        for kind in FailureKind::ALL {
            assert_eq!(FailureKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(FailureKind::from_str("bogus"), None);
    }

    #[test]
    fn test_observe_repeat_increments_and_refreshes() {
        let t0 = Utc::now() - chrono::Duration::hours(1);
        let mut pattern = FailurePattern::new("t", FailureKind::TimingIssue, None, "old", t0);
        let repeat = FailurePattern::new("t", FailureKind::TimingIssue, None, "new", Utc::now());

        pattern.observe_repeat(&repeat);

        assert_eq!(pattern.frequency, 2);
        assert_eq!(pattern.first_seen, t0);
        assert_eq!(pattern.last_seen, repeat.last_seen);
        assert_eq!(pattern.error_message, "new");
    }
}

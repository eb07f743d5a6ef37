//! Adaptive rule domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::failure::FailureKind;

/// A synthesized, confidence-scored remediation tied to one failure kind.
///
/// Everything except `last_applied` and the feedback counters is fixed at
/// creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveRule {
    pub rule_id: String,
    pub failure_kind: FailureKind,
    pub suggested_fix: String,

    /// Confidence in [0, 1].
    pub confidence: f64,

    /// Share of feedback reports where the rule prevented a recurrence, in [0, 1].
    #[serde(default)]
    pub success_rate: f64,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_applied: Option<DateTime<Utc>>,

    #[serde(default)]
    pub prevented_count: u32,

    #[serde(default)]
    pub recurred_count: u32,
}

impl AdaptiveRule {
    /// Create a rule with an id derived from its kind and creation time.
    pub fn new(
        failure_kind: FailureKind,
        suggested_fix: impl Into<String>,
        confidence: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            rule_id: format!(
                "{}_{}",
                failure_kind.as_str(),
                created_at.format("%Y%m%d_%H%M%S_%3f")
            ),
            failure_kind,
            suggested_fix: suggested_fix.into(),
            confidence: confidence.clamp(0.0, 1.0),
            success_rate: 0.0,
            created_at,
            last_applied: None,
            prevented_count: 0,
            recurred_count: 0,
        }
    }

    /// Record one feedback observation and recompute `success_rate`.
    pub fn record_feedback(&mut self, feedback: RuleFeedback) {
        match feedback {
            RuleFeedback::Prevented => {
                self.prevented_count = self.prevented_count.saturating_add(1);
            }
            RuleFeedback::Recurred => {
                self.recurred_count = self.recurred_count.saturating_add(1);
            }
        }
        let total = f64::from(self.prevented_count) + f64::from(self.recurred_count);
        self.success_rate = if total > 0.0 {
            f64::from(self.prevented_count) / total
        } else {
            0.0
        };
    }

    pub fn feedback_count(&self) -> u32 {
        self.prevented_count.saturating_add(self.recurred_count)
    }
}

/// Observation of whether a rule worked after it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFeedback {
    /// The failure the rule targets did not come back.
    Prevented,
    /// The failure recurred despite the rule.
    Recurred,
}

/// Descriptor of a rule that modified a piece of test source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule_id: String,
    pub failure_kind: FailureKind,
    pub suggested_fix: String,
}

impl From<&AdaptiveRule> for AppliedRule {
    fn from(rule: &AdaptiveRule) -> Self {
        Self {
            rule_id: rule.rule_id.clone(),
            failure_kind: rule.failure_kind,
            suggested_fix: rule.suggested_fix.clone(),
        }
    }
}

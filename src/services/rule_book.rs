//! Persisted list of synthesized adaptive rules.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{AdaptiveRule, Diagnostic, Outcome, RuleFeedback};
use crate::domain::ports::RuleRepository;

const COMPONENT: &str = "rule_book";

/// Explicit handle over the rule list.
pub struct RuleBook {
    repository: Arc<dyn RuleRepository>,
    rules: Vec<AdaptiveRule>,
}

impl RuleBook {
    /// Load the rule list. A read failure yields an empty, degraded book.
    pub async fn open(repository: Arc<dyn RuleRepository>) -> Outcome<Self> {
        let (rules, diagnostics) = match repository.load_all().await {
            Ok(rules) => {
                debug!(count = rules.len(), "Loaded adaptive rules");
                (rules, Vec::new())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load adaptive rules, starting empty");
                (Vec::new(), vec![Diagnostic::new(COMPONENT, e.to_string())])
            }
        };

        Outcome::from_parts(Self { repository, rules }, diagnostics)
    }

    pub fn rules(&self) -> &[AdaptiveRule] {
        &self.rules
    }

    pub(crate) fn rules_mut(&mut self) -> &mut [AdaptiveRule] {
        &mut self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, rule_id: &str) -> Option<&AdaptiveRule> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    /// Append rules in memory. Call [`RuleBook::save`] to persist.
    pub fn extend(&mut self, rules: impl IntoIterator<Item = AdaptiveRule>) {
        self.rules.extend(rules);
    }

    /// Record whether a rule prevented a recurrence, then persist.
    ///
    /// An unknown rule id yields `Failed`.
    pub async fn record_feedback(
        &mut self,
        rule_id: &str,
        feedback: RuleFeedback,
    ) -> Outcome<AdaptiveRule> {
        let Some(rule) = self.rules.iter_mut().find(|r| r.rule_id == rule_id) else {
            warn!(rule_id, "Feedback for unknown rule");
            let message = format!("No rule with id {rule_id}");
            return Outcome::failed(Diagnostic::new(COMPONENT, message));
        };

        rule.record_feedback(feedback);
        info!(
            rule_id,
            ?feedback,
            success_rate = rule.success_rate,
            "Recorded rule feedback"
        );
        let updated = rule.clone();

        self.save().await.map(|()| updated)
    }

    /// Drop rules created before `retention` ago that were never applied.
    pub async fn compact(&mut self, retention: Duration) -> Outcome<usize> {
        self.compact_at(retention, Utc::now()).await
    }

    pub async fn compact_at(&mut self, retention: Duration, now: DateTime<Utc>) -> Outcome<usize> {
        let cutoff = now - retention;
        let before = self.rules.len();
        let keep = |r: &AdaptiveRule| r.last_applied.is_some() || r.created_at >= cutoff;
        self.rules.retain(keep);
        let removed = before - self.rules.len();

        if removed == 0 {
            return Outcome::Complete(0);
        }

        info!(
            removed,
            remaining = self.rules.len(),
            "Compacted adaptive rules"
        );
        self.save().await.map(|()| removed)
    }

    /// Persist the whole list. Failure degrades, never errors.
    pub async fn save(&self) -> Outcome<()> {
        match self.repository.save_all(&self.rules).await {
            Ok(()) => Outcome::Complete(()),
            Err(e) => {
                warn!(error = %e, "Failed to persist adaptive rules");
                Outcome::Degraded {
                    value: (),
                    diagnostics: vec![Diagnostic::new(COMPONENT, e.to_string())],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRuleRepository;
    use crate::domain::models::FailureKind;

    fn rule(kind: FailureKind, created_at: DateTime<Utc>) -> AdaptiveRule {
        AdaptiveRule::new(kind, "fix", 0.9, created_at)
    }

    #[tokio::test]
    async fn test_feedback_persists_success_rate() {
        let existing = rule(FailureKind::TimingIssue, Utc::now());
        let id = existing.rule_id.clone();
        let repo = Arc::new(InMemoryRuleRepository::with_items(vec![existing]));
        let mut book = RuleBook::open(repo.clone()).await.into_value().unwrap();

        book.record_feedback(&id, RuleFeedback::Prevented).await;
        let outcome = book.record_feedback(&id, RuleFeedback::Recurred).await;

        assert!(outcome.is_complete());
        assert!((outcome.value().unwrap().success_rate - 0.5).abs() < 1e-9);
        assert!((repo.snapshot()[0].success_rate - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_feedback_unknown_rule_fails() {
        let repo = Arc::new(InMemoryRuleRepository::new());
        let mut book = RuleBook::open(repo.clone()).await.into_value().unwrap();

        let outcome = book.record_feedback("nope", RuleFeedback::Prevented).await;

        assert!(outcome.is_failed());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_compact_keeps_applied_and_recent() {
        let now = Utc::now();
        let stale = rule(FailureKind::DataIssue, now - Duration::days(200));
        let mut applied = rule(FailureKind::NetworkIssue, now - Duration::days(300));
        applied.last_applied = Some(now - Duration::days(1));
        let fresh = rule(FailureKind::TimingIssue, now);

        let repo = Arc::new(InMemoryRuleRepository::with_items(vec![stale, applied, fresh]));
        let mut book = RuleBook::open(repo.clone()).await.into_value().unwrap();

        let removed = book.compact_at(Duration::days(90), now).await;

        assert_eq!(removed, Outcome::Complete(1));
        assert_eq!(book.len(), 2);
        let kinds: Vec<_> = book.rules().iter().map(|r| r.failure_kind).collect();
        assert!(!kinds.contains(&FailureKind::DataIssue));
    }
}

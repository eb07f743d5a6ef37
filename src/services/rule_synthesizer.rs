//! Turns recurring failure patterns into confidence-scored adaptive rules.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{
    AdaptiveRule, Diagnostic, FailureAnalysisRequest, FailureKind, FailurePattern, LearningConfig,
    Outcome,
};
use crate::domain::ports::TestSynthesizer;
use crate::services::rule_book::RuleBook;

const COMPONENT: &str = "rule_synthesizer";

/// Patterns handed to the collaborator for an assertion-fix suggestion.
const ANALYSIS_SAMPLE_SIZE: usize = 5;

/// Distinct locators named in a selector fix.
const MAX_NAMED_SELECTORS: usize = 3;

const ASSERTION_FALLBACK_FIX: &str = "Review assertion logic, expected values, and test data";

/// Saturating confidence: average group frequency over 10, capped at 1.
pub fn group_confidence(patterns: &[&FailurePattern]) -> f64 {
    if patterns.is_empty() {
        return 0.0;
    }
    let total: f64 = patterns.iter().map(|p| f64::from(p.frequency)).sum();
    let average = total / patterns.len() as f64;
    (average / 10.0).min(1.0)
}

pub struct RuleSynthesizer {
    synthesizer: Option<Arc<dyn TestSynthesizer>>,
    min_pattern_frequency: u32,
    confidence_threshold: f64,
}

impl RuleSynthesizer {
    pub fn new(min_pattern_frequency: u32, confidence_threshold: f64) -> Self {
        Self {
            synthesizer: None,
            min_pattern_frequency,
            confidence_threshold,
        }
    }

    pub fn from_config(config: &LearningConfig) -> Self {
        Self::new(config.min_pattern_frequency, config.confidence_threshold)
    }

    /// Collaborator consulted for assertion-failure fixes.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn TestSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Synthesize rules from `patterns`, append qualifying ones to `rules`,
    /// and persist the rule list.
    ///
    /// Returns only the rules created by this call. A collaborator failure
    /// for one group falls back locally and degrades the outcome without
    /// affecting the other groups.
    pub async fn synthesize(
        &self,
        patterns: &[FailurePattern],
        rules: &mut RuleBook,
    ) -> Outcome<Vec<AdaptiveRule>> {
        self.synthesize_at(patterns, rules, Utc::now()).await
    }

    pub async fn synthesize_at(
        &self,
        patterns: &[FailurePattern],
        rules: &mut RuleBook,
        now: DateTime<Utc>,
    ) -> Outcome<Vec<AdaptiveRule>> {
        let mut groups: BTreeMap<FailureKind, Vec<&FailurePattern>> = BTreeMap::new();
        for pattern in patterns
            .iter()
            .filter(|p| p.frequency >= self.min_pattern_frequency)
        {
            groups
                .entry(pattern.failure_kind)
                .or_default()
                .push(pattern);
        }

        let mut diagnostics = Vec::new();
        let mut created = Vec::new();

        for (kind, group) in groups {
            let confidence = group_confidence(&group);
            if confidence < self.confidence_threshold {
                debug!(
                    pattern_kind = %kind,
                    confidence,
                    threshold = self.confidence_threshold,
                    "Group below confidence threshold"
                );
                continue;
            }

            let fix = self.suggest_fix(kind, &group, &mut diagnostics).await;
            let rule = AdaptiveRule::new(kind, fix, confidence, now);
            info!(
                rule_id = %rule.rule_id,
                pattern_kind = %kind,
                confidence,
                patterns = group.len(),
                "Synthesized adaptive rule"
            );
            created.push(rule);
        }

        rules.extend(created.iter().cloned());
        let (_, save_diagnostics) = rules.save().await.into_parts();
        diagnostics.extend(save_diagnostics);

        info!(created = created.len(), "Rule synthesis finished");
        Outcome::from_parts(created, diagnostics)
    }

    async fn suggest_fix(
        &self,
        kind: FailureKind,
        group: &[&FailurePattern],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        match kind {
            FailureKind::TimingIssue => timing_fix(group),
            FailureKind::ElementSelector => selector_fix(group),
            FailureKind::NetworkIssue => {
                "Add network retry logic and longer timeouts for network requests".to_string()
            }
            FailureKind::AssertionFailure => self.assertion_fix(group, diagnostics).await,
            other => {
                format!("Generic fix for {other}: Review test logic and add error handling")
            }
        }
    }

    async fn assertion_fix(
        &self,
        group: &[&FailurePattern],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let Some(synthesizer) = &self.synthesizer else {
            return ASSERTION_FALLBACK_FIX.to_string();
        };

        let request = FailureAnalysisRequest {
            failure_kind: FailureKind::AssertionFailure,
            failure_patterns: group
                .iter()
                .take(ANALYSIS_SAMPLE_SIZE)
                .map(|p| (*p).clone())
                .collect(),
        };

        match synthesizer.analyze_failures(&request).await {
            Ok(analysis) => match analysis.suggested_fix.filter(|f| !f.trim().is_empty()) {
                Some(fix) => fix,
                None => {
                    diagnostics.push(Diagnostic::new(
                        COMPONENT,
                        "Collaborator returned no suggested fix for assertion failures",
                    ));
                    ASSERTION_FALLBACK_FIX.to_string()
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not get assertion fix from synthesizer, using fallback");
                diagnostics.push(Diagnostic::new(COMPONENT, e.to_string()));
                ASSERTION_FALLBACK_FIX.to_string()
            }
        }
    }
}

fn timing_fix(group: &[&FailurePattern]) -> String {
    // Count patterns per locator; ties keep the first seen.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for locator in group.iter().filter_map(|p| p.element_locator.as_deref()) {
        match counts.iter_mut().find(|(l, _)| *l == locator) {
            Some((_, n)) => *n += 1,
            None => counts.push((locator, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (locator, n) in counts {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((locator, n));
        }
    }

    match best {
        Some((locator, _)) => {
            format!("Add explicit wait for element '{locator}' with increased timeout (30s+)")
        }
        None => "Add explicit waits and increase default timeout values".to_string(),
    }
}

fn selector_fix(group: &[&FailurePattern]) -> String {
    let mut named: Vec<&str> = Vec::new();
    for locator in group.iter().filter_map(|p| p.element_locator.as_deref()) {
        if !named.contains(&locator) {
            named.push(locator);
        }
        if named.len() == MAX_NAMED_SELECTORS {
            break;
        }
    }

    if named.is_empty() {
        "Review element selectors and use more stable locator strategies".to_string()
    } else {
        format!(
            "Update selectors to use more robust locators (data-testid, role-based). Problem selectors: {}",
            named.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRuleRepository;
    use crate::domain::models::FailureAnalysis;
    use crate::services::test_support::StubSynthesizer;
    use std::sync::atomic::Ordering;

    fn pattern(kind: FailureKind, locator: Option<&str>, frequency: u32) -> FailurePattern {
        let mut p = FailurePattern::new(
            format!("test_{}", locator.unwrap_or("none")),
            kind,
            locator.map(String::from),
            "msg",
            Utc::now(),
        );
        p.frequency = frequency;
        p
    }

    async fn book() -> RuleBook {
        RuleBook::open(Arc::new(InMemoryRuleRepository::new()))
            .await
            .into_value()
            .unwrap()
    }

    #[test]
    fn test_group_confidence_saturates() {
        let a = pattern(FailureKind::TimingIssue, None, 5);
        let b = pattern(FailureKind::TimingIssue, None, 9);
        assert!((group_confidence(&[&a, &b]) - 0.7).abs() < 1e-9);

        let c = pattern(FailureKind::TimingIssue, None, 40);
        assert!((group_confidence(&[&c]) - 1.0).abs() < f64::EPSILON);
        assert!(group_confidence(&[]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_low_confidence_groups_are_discarded() {
        let patterns = vec![pattern(FailureKind::NetworkIssue, None, 3)];
        let mut rules = book().await;

        let outcome = RuleSynthesizer::new(3, 0.7)
            .synthesize(&patterns, &mut rules)
            .await;

        assert!(outcome.value().unwrap().is_empty());
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn test_below_min_frequency_is_ignored() {
        let patterns = vec![pattern(FailureKind::NetworkIssue, None, 2)];
        let mut rules = book().await;

        let outcome = RuleSynthesizer::new(3, 0.1)
            .synthesize(&patterns, &mut rules)
            .await;

        assert!(outcome.value().unwrap().is_empty());
    }

    #[test]
    fn test_timing_fix_names_most_common_locator() {
        let patterns = vec![
            pattern(FailureKind::TimingIssue, Some("#a"), 8),
            pattern(FailureKind::TimingIssue, Some("#b"), 8),
            pattern(FailureKind::TimingIssue, Some("#b"), 8),
        ];
        let group: Vec<_> = patterns.iter().collect();
        assert_eq!(
            timing_fix(&group),
            "Add explicit wait for element '#b' with increased timeout (30s+)"
        );
    }

    #[test]
    fn test_selector_fix_names_up_to_three_distinct() {
        let patterns = [
            pattern(FailureKind::ElementSelector, Some("#a"), 3),
            pattern(FailureKind::ElementSelector, Some("#a"), 3),
            pattern(FailureKind::ElementSelector, Some("#b"), 3),
            pattern(FailureKind::ElementSelector, None, 3),
            pattern(FailureKind::ElementSelector, Some("#c"), 3),
            pattern(FailureKind::ElementSelector, Some("#d"), 3),
        ];
        let group: Vec<_> = patterns.iter().collect();
        assert!(selector_fix(&group).ends_with("Problem selectors: #a, #b, #c"));

        let bare = [pattern(FailureKind::ElementSelector, None, 3)];
        let group: Vec<_> = bare.iter().collect();
        assert_eq!(
            selector_fix(&group),
            "Review element selectors and use more stable locator strategies"
        );
    }

    #[tokio::test]
    async fn test_generic_fix_for_other_kinds() {
        let patterns = vec![pattern(FailureKind::PermissionIssue, None, 10)];
        let mut rules = book().await;

        let created = RuleSynthesizer::new(3, 0.7)
            .synthesize(&patterns, &mut rules)
            .await
            .into_value()
            .unwrap();

        assert_eq!(
            created[0].suggested_fix,
            "Generic fix for permission_issue: Review test logic and add error handling"
        );
    }

    #[tokio::test]
    async fn test_assertion_fix_uses_collaborator() {
        let stub = Arc::new(StubSynthesizer {
            analysis: Some(FailureAnalysis {
                suggested_fix: Some("Compare totals after rounding".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let patterns: Vec<_> = (0..7)
            .map(|i| {
                let mut p = pattern(FailureKind::AssertionFailure, None, 9);
                p.test_name = format!("test_{i}");
                p
            })
            .collect();
        let mut rules = book().await;

        let outcome = RuleSynthesizer::new(3, 0.7)
            .with_synthesizer(stub.clone())
            .synthesize(&patterns, &mut rules)
            .await;

        assert!(outcome.is_complete());
        assert_eq!(
            outcome.value().unwrap()[0].suggested_fix,
            "Compare totals after rounding"
        );
        let sampled = stub.last_analysis_sample.load(Ordering::SeqCst);
        assert_eq!(sampled, ANALYSIS_SAMPLE_SIZE);
    }

    #[tokio::test]
    async fn test_collaborator_failure_falls_back_and_degrades() {
        let stub = Arc::new(StubSynthesizer::unavailable());
        let patterns = vec![
            pattern(FailureKind::AssertionFailure, None, 9),
            pattern(FailureKind::NetworkIssue, None, 9),
        ];
        let mut rules = book().await;

        let outcome = RuleSynthesizer::new(3, 0.7)
            .with_synthesizer(stub)
            .synthesize(&patterns, &mut rules)
            .await;

        assert!(outcome.is_degraded());
        let created = outcome.value().unwrap();
        assert_eq!(created.len(), 2);
        let fixes: Vec<_> = created.iter().map(|r| r.suggested_fix.as_str()).collect();
        assert!(fixes.contains(&ASSERTION_FALLBACK_FIX));
        assert_eq!(rules.len(), 2);
    }
}

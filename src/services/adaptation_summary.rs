//! Learning-progress summary over the pattern store and rule list.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::models::{AdaptiveRule, FailureKind, FailurePattern};

/// Rules above this success rate count as effective.
const EFFECTIVE_SUCCESS_RATE: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdaptationSummary {
    pub total_patterns_learned: usize,
    pub recent_patterns: usize,
    pub learning_window_days: u32,
    /// Recent pattern count per kind.
    pub pattern_kinds: BTreeMap<FailureKind, usize>,
    pub active_rules: usize,
    pub effective_rules: usize,
    /// Recent failure frequency summed per last-seen day.
    pub daily_failure_trend: BTreeMap<NaiveDate, u64>,
    /// Up to five kinds by recent pattern count, most common first.
    pub top_failure_kinds: Vec<(FailureKind, usize)>,
    pub avg_rule_confidence: f64,
}

pub fn summarize_adaptation(
    patterns: &[FailurePattern],
    rules: &[AdaptiveRule],
    learning_window_days: u32,
    now: DateTime<Utc>,
) -> AdaptationSummary {
    let cutoff = now - Duration::days(i64::from(learning_window_days));
    let recent: Vec<&FailurePattern> = patterns.iter().filter(|p| p.seen_since(cutoff)).collect();

    let mut pattern_kinds: BTreeMap<FailureKind, usize> = BTreeMap::new();
    let mut daily_failure_trend: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for pattern in &recent {
        *pattern_kinds.entry(pattern.failure_kind).or_default() += 1;
        *daily_failure_trend
            .entry(pattern.last_seen.date_naive())
            .or_default() += u64::from(pattern.frequency);
    }

    let mut top_failure_kinds: Vec<(FailureKind, usize)> =
        pattern_kinds.iter().map(|(k, n)| (*k, *n)).collect();
    top_failure_kinds.sort_by(|a, b| b.1.cmp(&a.1));
    top_failure_kinds.truncate(5);

    let avg_rule_confidence = if rules.is_empty() {
        0.0
    } else {
        rules.iter().map(|r| r.confidence).sum::<f64>() / rules.len() as f64
    };

    AdaptationSummary {
        total_patterns_learned: patterns.len(),
        recent_patterns: recent.len(),
        learning_window_days,
        pattern_kinds,
        active_rules: rules.len(),
        effective_rules: rules
            .iter()
            .filter(|r| r.success_rate > EFFECTIVE_SUCCESS_RATE)
            .count(),
        daily_failure_trend,
        top_failure_kinds,
        avg_rule_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RuleFeedback;

    #[test]
    fn test_summary_counts_window_and_rules() {
        let now = Utc::now();
        let month_ago = now - Duration::days(30);
        let mut old = FailurePattern::new("a", FailureKind::DataIssue, None, "", month_ago);
        old.frequency = 9;
        let mut fresh = FailurePattern::new("b", FailureKind::TimingIssue, None, "", now);
        fresh.frequency = 4;
        let fresh2 = FailurePattern::new("c", FailureKind::TimingIssue, None, "", now);

        let mut good = AdaptiveRule::new(FailureKind::TimingIssue, "x", 0.8, now);
        good.record_feedback(RuleFeedback::Prevented);
        let plain = AdaptiveRule::new(FailureKind::NetworkIssue, "y", 0.6, now);

        let summary = summarize_adaptation(&[old, fresh, fresh2], &[good, plain], 7, now);

        assert_eq!(summary.total_patterns_learned, 3);
        assert_eq!(summary.recent_patterns, 2);
        assert_eq!(summary.pattern_kinds[&FailureKind::TimingIssue], 2);
        assert_eq!(summary.daily_failure_trend[&now.date_naive()], 5);
        assert_eq!(
            summary.top_failure_kinds,
            vec![(FailureKind::TimingIssue, 2)]
        );
        assert_eq!(summary.active_rules, 2);
        assert_eq!(summary.effective_rules, 1);
        assert!((summary.avg_rule_confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let edge = FailurePattern::new("a", FailureKind::DataIssue, None, "", week_ago);
        let past = FailurePattern::new(
            "b",
            FailureKind::DataIssue,
            None,
            "",
            week_ago - Duration::seconds(1),
        );

        let summary = summarize_adaptation(&[edge, past], &[], 7, now);
        assert_eq!(summary.recent_patterns, 1);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize_adaptation(&[], &[], 7, Utc::now());
        assert_eq!(summary.recent_patterns, 0);
        assert!(summary.avg_rule_confidence.abs() < f64::EPSILON);
    }
}

//! Derives ranked insights from run history.
//!
//! Each sub-analysis is a pure function over a slice of runs that yields at
//! most one insight. [`InsightAggregator::analyze`] runs them all, asks the
//! collaborator for extra insights, and ranks the result.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{
    rank_insights, Diagnostic, InsightCategory, InsightRecord, InsightRequest, Outcome, Severity,
    TestRunRecord, TestStatus,
};
use crate::domain::ports::TestSynthesizer;
use crate::services::trend;

const COMPONENT: &str = "insight_aggregator";

const TREND_WINDOW: usize = 10;
const FLAKY_WINDOW: usize = 20;
const COVERAGE_WINDOW: usize = 5;
const FAILURE_WINDOW: usize = 10;
const COLLABORATOR_WINDOW: usize = 20;

const MIN_RUNS_FOR_PASS_RATE: usize = 3;
const MIN_RUNS_FOR_DURATION: usize = 5;
const MIN_OUTCOMES_FOR_FLAKY: usize = 5;
const FLAKY_RATIO: f64 = 0.2;
const TOP_FLAKY: usize = 5;

fn tail(runs: &[TestRunRecord], n: usize) -> &[TestRunRecord] {
    &runs[runs.len().saturating_sub(n)..]
}

/// Low mean pass rate, or a declining pass-rate slope, over the last 10 runs.
pub fn pass_rate_trend(runs: &[TestRunRecord]) -> Option<InsightRecord> {
    if runs.len() < MIN_RUNS_FOR_PASS_RATE {
        return None;
    }

    let rates = trend::pass_rates(tail(runs, TREND_WINDOW));
    let mean_pct = trend::mean(&rates) * 100.0;
    let slope = trend::slope(&rates);

    if mean_pct < 70.0 {
        let severity = if mean_pct < 50.0 {
            Severity::High
        } else {
            Severity::Medium
        };
        return Some(
            InsightRecord::new(
                InsightCategory::Quality,
                "Low Pass Rate Detected",
                format!("Average pass rate is {mean_pct:.1}%, below the recommended 85%"),
                severity,
                0.9,
            )
            .with_recommendations([
                "Review and fix failing tests",
                "Improve test stability",
                "Consider test environment issues",
                "Implement better error handling",
            ])
            .with_data("avg_pass_rate", json!(mean_pct))
            .with_data("trend", json!(slope)),
        );
    }

    (slope < -0.1).then(|| {
        InsightRecord::new(
            InsightCategory::Quality,
            "Declining Pass Rate Trend",
            format!("Pass rate has been declining (trend: {slope:.2})"),
            Severity::Medium,
            0.8,
        )
        .with_recommendations([
            "Investigate recent changes",
            "Review test maintenance",
            "Check for environmental issues",
        ])
        .with_data("trend", json!(slope))
        .with_data(
            "recent_pass_rates",
            json!(rates[rates.len().saturating_sub(5)..]),
        )
    })
}

/// Slow mean per-test duration, or a rising duration slope, over the last 10 runs.
pub fn duration_trend(runs: &[TestRunRecord]) -> Option<InsightRecord> {
    if runs.len() < MIN_RUNS_FOR_DURATION {
        return None;
    }

    let durations = trend::mean_durations(tail(runs, TREND_WINDOW));
    let mean_duration = trend::mean(&durations);
    let slope = trend::slope(&durations);

    if mean_duration > 30.0 {
        return Some(
            InsightRecord::new(
                InsightCategory::Performance,
                "Slow Test Execution",
                format!("Average test duration is {mean_duration:.1} seconds per test"),
                Severity::Medium,
                0.8,
            )
            .with_recommendations([
                "Optimize test selectors",
                "Reduce explicit waits",
                "Parallelize test execution",
                "Review test setup/teardown",
            ])
            .with_data("avg_duration", json!(mean_duration))
            .with_data("trend", json!(slope)),
        );
    }

    (slope > 0.2).then(|| {
        InsightRecord::new(
            InsightCategory::Performance,
            "Increasing Test Duration",
            format!("Test execution time is increasing (trend: {slope:.2})"),
            Severity::Medium,
            0.7,
        )
        .with_recommendations([
            "Profile slow tests",
            "Check for performance regressions",
            "Optimize test infrastructure",
        ])
        .with_data("trend", json!(slope))
        .with_data(
            "recent_durations",
            json!(durations[durations.len().saturating_sub(5)..]),
        )
    })
}

/// A test whose outcomes mix passes and failures beyond the minimum ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct FlakyTest {
    pub name: String,
    pub score: f64,
    pub outcomes: Vec<TestStatus>,
}

/// Flaky tests over the last 20 runs, flakiest first.
pub fn find_flaky_tests(runs: &[TestRunRecord]) -> Vec<FlakyTest> {
    let mut order: Vec<&str> = Vec::new();
    let mut outcomes: HashMap<&str, Vec<TestStatus>> = HashMap::new();
    let recent = tail(runs, FLAKY_WINDOW);
    for test in recent.iter().flat_map(|r| &r.test_details) {
        outcomes
            .entry(test.name.as_str())
            .or_insert_with(|| {
                order.push(test.name.as_str());
                Vec::new()
            })
            .push(test.status);
    }

    let mut flaky: Vec<FlakyTest> = order
        .into_iter()
        .filter_map(|name| {
            let statuses = outcomes.remove(name)?;
            if statuses.len() < MIN_OUTCOMES_FOR_FLAKY {
                return None;
            }
            let count = |status: TestStatus| statuses.iter().filter(|s| **s == status).count();
            let passes = count(TestStatus::Passed);
            let fails = count(TestStatus::Failed);
            if passes == 0 || fails == 0 {
                return None;
            }
            let score = passes.min(fails) as f64 / statuses.len() as f64;
            (score >= FLAKY_RATIO).then(|| FlakyTest {
                name: name.to_string(),
                score,
                outcomes: statuses,
            })
        })
        .collect();

    flaky.sort_by(|a, b| b.score.total_cmp(&a.score));
    flaky
}

pub fn flaky_tests(runs: &[TestRunRecord]) -> Option<InsightRecord> {
    let flaky = find_flaky_tests(runs);
    if flaky.is_empty() {
        return None;
    }

    let top: Vec<_> = flaky
        .iter()
        .take(TOP_FLAKY)
        .map(|t| json!({"name": t.name, "score": t.score}))
        .collect();
    let severity = if flaky.len() > 10 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(
        InsightRecord::new(
            InsightCategory::Reliability,
            "Flaky Tests Detected",
            format!(
                "Found {} flaky tests with inconsistent results",
                flaky.len()
            ),
            severity,
            0.9,
        )
        .with_recommendations([
            "Stabilize flaky tests with better waits",
            "Review test data dependencies",
            "Fix timing-related issues",
            "Add retry mechanisms for unstable tests",
        ])
        .with_data("flaky_count", json!(flaky.len()))
        .with_data("top_flaky_tests", json!(top)),
    )
}

/// Coverage buckets in classification order. First matching keyword wins.
const COVERAGE_BUCKETS: [(&str, &[&str]); 5] = [
    ("authentication", &["login", "auth"]),
    ("product_catalog", &["product", "catalog"]),
    ("shopping_cart", &["cart"]),
    ("checkout", &["checkout", "payment"]),
    ("order_management", &["order"]),
];

pub fn coverage_bucket(test_name: &str) -> &'static str {
    let lowered = test_name.to_lowercase();
    COVERAGE_BUCKETS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or("other", |(bucket, _)| bucket)
}

/// Observed component buckets holding under 10% of recent test executions.
pub fn coverage_skew(runs: &[TestRunRecord]) -> Option<InsightRecord> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    let recent = tail(runs, COVERAGE_WINDOW);
    for test in recent.iter().flat_map(|r| &r.test_details) {
        let bucket = coverage_bucket(&test.name);
        match counts.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, n)) => *n += 1,
            None => counts.push((bucket, 1)),
        }
    }

    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return None;
    }

    let low: Vec<&str> = counts
        .iter()
        .filter(|(bucket, n)| *bucket != "other" && (*n as f64 / total as f64) * 100.0 < 10.0)
        .map(|(bucket, _)| *bucket)
        .collect();
    if low.is_empty() {
        return None;
    }

    let listed = low.join(", ");
    let coverage: serde_json::Map<_, _> = counts
        .iter()
        .map(|(b, n)| ((*b).to_string(), json!(n)))
        .collect();

    Some(
        InsightRecord::new(
            InsightCategory::Coverage,
            "Low Test Coverage Areas",
            format!("Components with low test coverage: {listed}"),
            Severity::Medium,
            0.8,
        )
        .with_recommendations([
            format!("Increase test coverage for {listed}"),
            "Generate additional tests for uncovered areas".to_string(),
            "Review component criticality and add appropriate tests".to_string(),
        ])
        .with_data("component_coverage", serde_json::Value::Object(coverage))
        .with_data("low_coverage_components", json!(low)),
    )
}

const FAILURE_BUCKETS: [&str; 5] = [
    "timeout",
    "element_not_found",
    "network_issue",
    "assertion_failure",
    "other",
];

pub fn failure_bucket(error: &str) -> &'static str {
    let lowered = error.to_lowercase();
    if lowered.contains("timeout") {
        "timeout"
    } else if lowered.contains("selector") || lowered.contains("element") {
        "element_not_found"
    } else if lowered.contains("network") {
        "network_issue"
    } else if lowered.contains("assertion") {
        "assertion_failure"
    } else {
        "other"
    }
}

/// Most frequent failure bucket over the last 10 runs. Ties go to the
/// bucket listed first.
pub fn failure_summary(runs: &[TestRunRecord]) -> Option<InsightRecord> {
    let mut counts = [0usize; FAILURE_BUCKETS.len()];
    for test in tail(runs, FAILURE_WINDOW)
        .iter()
        .flat_map(|r| &r.test_details)
        .filter(|t| t.status == TestStatus::Failed)
    {
        let bucket = failure_bucket(test.error.as_deref().unwrap_or_default());
        if let Some(i) = FAILURE_BUCKETS.iter().position(|b| *b == bucket) {
            counts[i] += 1;
        }
    }

    let mut top_index = 0;
    for (i, &n) in counts.iter().enumerate() {
        if n > counts[top_index] {
            top_index = i;
        }
    }
    let top_count = counts[top_index];
    if top_count == 0 {
        return None;
    }
    let top = FAILURE_BUCKETS[top_index];

    let patterns: serde_json::Map<_, _> = FAILURE_BUCKETS
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(b, n)| ((*b).to_string(), json!(n)))
        .collect();

    Some(
        InsightRecord::new(
            InsightCategory::Reliability,
            "Common Failure Pattern Detected",
            format!("Most common failure type: {top} ({top_count} occurrences)"),
            Severity::Medium,
            0.8,
        )
        .with_recommendations([
            format!("Focus on fixing {top} issues"),
            "Implement preventive measures".to_string(),
            "Add better error handling".to_string(),
        ])
        .with_data("failure_patterns", serde_json::Value::Object(patterns))
        .with_data("top_failure", json!({"type": top, "count": top_count})),
    )
}

/// Runs every sub-analysis and ranks the combined insights.
#[derive(Default)]
pub struct InsightAggregator {
    synthesizer: Option<Arc<dyn TestSynthesizer>>,
}

impl InsightAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn TestSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Analyze the full history (oldest first). Insights are recomputed from
    /// scratch on every call.
    ///
    /// Collaborator failure contributes no insights and degrades the outcome.
    pub async fn analyze(&self, runs: &[TestRunRecord]) -> Outcome<Vec<InsightRecord>> {
        if runs.is_empty() {
            debug!("No run history to analyze");
            return Outcome::Complete(Vec::new());
        }

        let mut insights: Vec<InsightRecord> = [
            pass_rate_trend(runs),
            duration_trend(runs),
            flaky_tests(runs),
            coverage_skew(runs),
            failure_summary(runs),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut diagnostics = Vec::new();
        if let Some(synthesizer) = &self.synthesizer {
            let recent = tail(runs, COLLABORATOR_WINDOW);
            let request = InsightRequest {
                request_type: "comprehensive_analysis".to_string(),
                test_history: recent.to_vec(),
                performance_trends: trend::snapshot(recent),
            };
            match synthesizer.get_insights(&request).await {
                Ok(response) => {
                    debug!(
                        count = response.insights.len(),
                        "Collaborator insights received"
                    );
                    insights.extend(response.insights.into_iter().map(InsightRecord::from));
                }
                Err(e) => {
                    warn!(error = %e, "Could not get collaborator insights");
                    diagnostics.push(Diagnostic::new(COMPONENT, e.to_string()));
                }
            }
        }

        rank_insights(&mut insights);
        info!(
            count = insights.len(),
            runs = runs.len(),
            "Generated insights"
        );
        Outcome::from_parts(insights, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CollaboratorInsight, InsightResponse, TestOutcome, TestRunReport};
    use crate::services::test_support::StubSynthesizer;
    use chrono::Utc;

    fn run(total: u32, passed: u32, duration: f64) -> TestRunRecord {
        TestRunRecord::from_report(
            TestRunReport {
                total,
                passed,
                failed: total - passed,
                duration,
                ..Default::default()
            },
            Utc::now(),
        )
    }

    fn run_with(tests: Vec<TestOutcome>) -> TestRunRecord {
        let mut r = run(tests.len() as u32, 0, 0.0);
        r.test_details = tests;
        r
    }

    fn outcome(name: &str, status: TestStatus) -> TestOutcome {
        TestOutcome::new(name, status)
    }

    #[test]
    fn test_low_pass_rate_high_severity() {
        let runs = vec![run(100, 40, 10.0), run(100, 45, 10.0), run(100, 42, 10.0)];
        let insight = pass_rate_trend(&runs).unwrap();
        assert_eq!(insight.title, "Low Pass Rate Detected");
        assert_eq!(insight.severity, Severity::High);
        assert_eq!(
            insight.description,
            "Average pass rate is 42.3%, below the recommended 85%"
        );
    }

    #[test]
    fn test_pass_rate_needs_three_runs() {
        assert!(pass_rate_trend(&[run(10, 1, 1.0), run(10, 1, 1.0)]).is_none());
    }

    #[test]
    fn test_declining_pass_rate() {
        let steady = vec![run(10, 9, 1.0), run(10, 9, 1.0), run(10, 9, 1.0)];
        assert!(pass_rate_trend(&steady).is_none());

        let runs = vec![run(10, 10, 1.0), run(10, 10, 1.0), run(10, 7, 1.0)];
        let insight = pass_rate_trend(&runs).unwrap();
        assert_eq!(insight.title, "Declining Pass Rate Trend");
        assert_eq!(insight.severity, Severity::Medium);
    }

    #[test]
    fn test_duration_analyses() {
        let slow: Vec<_> = (0..5).map(|_| run(2, 2, 80.0)).collect();
        assert_eq!(duration_trend(&slow).unwrap().title, "Slow Test Execution");

        let rising: Vec<_> = (0..5).map(|i| run(1, 1, f64::from(i) * 2.0)).collect();
        let insight = duration_trend(&rising).unwrap();
        assert_eq!(insight.title, "Increasing Test Duration");
        assert!((insight.confidence - 0.7).abs() < f64::EPSILON);

        assert!(duration_trend(&slow[..4]).is_none());
    }

    #[test]
    fn test_flaky_detection_boundary() {
        use TestStatus::{Failed as F, Passed as P};
        let sequences = [
            ("test_mixed", [P, P, F, P, F]),
            ("test_boundary", [P, P, P, P, F]),
            ("test_stable", [P, P, P, P, P]),
        ];
        let runs: Vec<_> = (0..5)
            .map(|i| {
                let tests = sequences.iter().map(|(name, seq)| outcome(name, seq[i]));
                run_with(tests.collect())
            })
            .collect();

        let flaky = find_flaky_tests(&runs);
        let names: Vec<_> = flaky.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["test_mixed", "test_boundary"]);
        assert!((flaky[0].score - 0.4).abs() < 1e-9);
        assert!((flaky[1].score - 0.2).abs() < 1e-9);

        let insight = flaky_tests(&runs).unwrap();
        assert_eq!(insight.severity, Severity::Medium);
        assert_eq!(insight.data["flaky_count"], json!(2));
    }

    #[test]
    fn test_flaky_needs_five_outcomes() {
        use TestStatus::{Failed as F, Passed as P};
        let runs: Vec<_> = [P, F, P, F]
            .into_iter()
            .map(|s| run_with(vec![outcome("test_x", s)]))
            .collect();
        assert!(find_flaky_tests(&runs).is_empty());
    }

    #[test]
    fn test_coverage_flags_small_observed_buckets() {
        let mut tests: Vec<_> = (0..19)
            .map(|i| outcome(&format!("test_login_{i}"), TestStatus::Passed))
            .collect();
        tests.push(outcome("test_cart_add", TestStatus::Passed));
        let insight = coverage_skew(&[run_with(tests)]).unwrap();

        assert_eq!(
            insight.description,
            "Components with low test coverage: shopping_cart"
        );
        assert_eq!(
            insight.data["component_coverage"]["authentication"],
            json!(19)
        );
    }

    #[test]
    fn test_coverage_bucket_order() {
        assert_eq!(
            coverage_bucket("test_login_then_checkout"),
            "authentication"
        );
        assert_eq!(coverage_bucket("test_ProductCart"), "product_catalog");
        assert_eq!(coverage_bucket("test_order_history"), "order_management");
        assert_eq!(coverage_bucket("test_misc"), "other");
    }

    #[test]
    fn test_failure_summary_top_bucket() {
        let failed = |err: &str| outcome("t", TestStatus::Failed).with_error(err);
        let runs = vec![run_with(vec![
            failed("Timeout 30000ms"),
            failed("element detached"),
            failed("selector not visible"),
            failed("AssertionError"),
            outcome("t2", TestStatus::Passed).with_error("timeout ignored for passing"),
        ])];

        let insight = failure_summary(&runs).unwrap();
        assert_eq!(
            insight.description,
            "Most common failure type: element_not_found (2 occurrences)"
        );
        assert!(failure_summary(&[run_with(vec![])]).is_none());
    }

    #[test]
    fn test_failure_summary_tie_goes_to_first_bucket() {
        let runs = vec![run_with(vec![
            outcome("a", TestStatus::Failed).with_error("network down"),
            outcome("b", TestStatus::Failed).with_error("timeout"),
        ])];
        assert_eq!(
            failure_summary(&runs).unwrap().data["top_failure"]["type"],
            json!("timeout")
        );
    }

    #[tokio::test]
    async fn test_analyze_ranks_and_merges_collaborator() {
        let stub = Arc::new(StubSynthesizer {
            insights: Some(InsightResponse {
                insights: vec![CollaboratorInsight {
                    title: Some("Critical thing".to_string()),
                    severity: Some("critical".to_string()),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        });
        let runs = vec![run(100, 40, 10.0), run(100, 45, 10.0), run(100, 42, 10.0)];

        let outcome = InsightAggregator::new()
            .with_synthesizer(stub)
            .analyze(&runs)
            .await;

        assert!(outcome.is_complete());
        let insights = outcome.into_value().unwrap();
        assert_eq!(insights[0].title, "Critical thing");
        assert_eq!(insights[0].category, InsightCategory::AiAnalysis);
        assert_eq!(insights[1].title, "Low Pass Rate Detected");
    }

    #[tokio::test]
    async fn test_analyze_degrades_when_collaborator_down() {
        let runs = vec![run(100, 40, 10.0), run(100, 45, 10.0), run(100, 42, 10.0)];
        let outcome = InsightAggregator::new()
            .with_synthesizer(Arc::new(StubSynthesizer::unavailable()))
            .analyze(&runs)
            .await;

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_history_skips_collaborator() {
        let stub = Arc::new(StubSynthesizer::unavailable());
        let outcome = InsightAggregator::new()
            .with_synthesizer(stub.clone())
            .analyze(&[])
            .await;
        assert!(outcome.is_complete());
        assert_eq!(stub.call_count(), 0);
    }
}

//! End-to-end learning flow over JSON-backed stores.

mod common;

use adaptest::domain::models::{FailureKind, FailureRecord, RuleFeedback};
use adaptest::services::{ImprovementService, RecordResult, RuleApplicator, RuleSynthesizer};
use common::open_stores;

const TIMEOUT_ERROR: &str = "Timeout waiting for selector '#search-results'";

#[tokio::test]
async fn test_repeated_timeout_becomes_rule() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, mut rules, _) = open_stores(dir.path()).await;

    let record = FailureRecord::failed("test_search_products", TIMEOUT_ERROR);
    assert_eq!(
        store.record_failure(&record).await.into_value(),
        Some(RecordResult::Created)
    );
    store.record_failure(&record).await;
    assert_eq!(
        store.record_failure(&record).await.into_value(),
        Some(RecordResult::Incremented { frequency: 3 })
    );

    assert_eq!(store.len(), 1);
    let pattern = &store.patterns()[0];
    assert_eq!(pattern.failure_kind, FailureKind::TimingIssue);
    assert_eq!(pattern.element_locator.as_deref(), Some("#search-results"));
    assert_eq!(pattern.frequency, 3);

    let created = RuleSynthesizer::new(3, 0.3)
        .synthesize(store.patterns(), &mut rules)
        .await;
    assert!(created.is_complete());
    let created = created.into_value().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].failure_kind, FailureKind::TimingIssue);
    assert!((created[0].confidence - 0.3).abs() < 1e-9);
    assert!(created[0].suggested_fix.contains("#search-results"));
}

#[tokio::test]
async fn test_default_threshold_needs_more_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, mut rules, _) = open_stores(dir.path()).await;

    let record = FailureRecord::failed("test_search_products", TIMEOUT_ERROR);
    for _ in 0..3 {
        store.record_failure(&record).await;
    }

    let created = RuleSynthesizer::new(3, 0.7)
        .synthesize(store.patterns(), &mut rules)
        .await
        .into_value()
        .unwrap();
    assert!(created.is_empty());
    assert!(rules.is_empty());
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (mut store, mut rules, _) = open_stores(dir.path()).await;
        let record = FailureRecord::failed("test_checkout", "Connection refused by payment API");
        for _ in 0..4 {
            store.record_failure(&record).await;
        }
        RuleSynthesizer::new(3, 0.3)
            .synthesize(store.patterns(), &mut rules)
            .await;
    }

    let (store, rules, _) = open_stores(dir.path()).await;
    assert_eq!(store.len(), 1);
    assert_eq!(store.patterns()[0].frequency, 4);
    assert_eq!(store.patterns()[0].failure_kind, FailureKind::NetworkIssue);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules.rules()[0].failure_kind, FailureKind::NetworkIssue);
}

#[tokio::test]
async fn test_passed_records_are_not_learned() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, _, _) = open_stores(dir.path()).await;

    let mut record = FailureRecord::failed("test_login", TIMEOUT_ERROR);
    record.status = adaptest::domain::models::TestStatus::Passed;

    assert_eq!(
        store.record_failure(&record).await.into_value(),
        Some(RecordResult::Ignored)
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_rule_rewrites_test_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, mut rules, _) = open_stores(dir.path()).await;

    let record = FailureRecord::failed("test_search_products", TIMEOUT_ERROR);
    for _ in 0..3 {
        store.record_failure(&record).await;
    }
    RuleSynthesizer::new(3, 0.3)
        .synthesize(store.patterns(), &mut rules)
        .await;

    let test_file = dir.path().join("test_search.py");
    tokio::fs::write(
        &test_file,
        "def test_search(page):\n    page.click(\"#search-button\")\n",
    )
    .await
    .unwrap();

    let service = ImprovementService::new(RuleApplicator::new(0.3));
    let first = service
        .apply_to_file(&test_file, &mut rules)
        .await
        .into_value()
        .unwrap();
    assert_eq!(first.improvements_applied.len(), 1);
    let backup = first.backup_created.unwrap();
    assert!(backup.exists());

    let content = tokio::fs::read_to_string(&test_file).await.unwrap();
    assert!(content.contains("page.wait_for_selector(\"#search-button\", timeout=30000)"));
    assert!(rules.rules()[0].last_applied.is_some());

    // The guard recognizes the injected wait, so a second pass is a no-op.
    let second = service
        .apply_to_file(&test_file, &mut rules)
        .await
        .into_value()
        .unwrap();
    assert!(second.improvements_applied.is_empty());
    let reread = tokio::fs::read_to_string(&test_file).await.unwrap();
    assert_eq!(reread, content);
}

#[tokio::test]
async fn test_dry_run_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, mut rules, _) = open_stores(dir.path()).await;
    let record = FailureRecord::failed("test_search_products", TIMEOUT_ERROR);
    for _ in 0..3 {
        store.record_failure(&record).await;
    }
    RuleSynthesizer::new(3, 0.3)
        .synthesize(store.patterns(), &mut rules)
        .await;

    let test_file = dir.path().join("test_search.py");
    let original = "def test_search(page):\n    page.click('#go')\n";
    tokio::fs::write(&test_file, original).await.unwrap();

    let preview = ImprovementService::new(RuleApplicator::new(0.3))
        .dry_run(true)
        .apply_to_file(&test_file, &mut rules)
        .await
        .into_value()
        .unwrap();

    assert_eq!(preview.improvements_applied.len(), 1);
    assert!(preview.backup_created.is_none());
    let unchanged = tokio::fs::read_to_string(&test_file).await.unwrap();
    assert_eq!(unchanged, original);
    assert!(rules.rules()[0].last_applied.is_none());
}

#[tokio::test]
async fn test_feedback_updates_success_rate() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, mut rules, _) = open_stores(dir.path()).await;
    let record = FailureRecord::failed("test_search_products", TIMEOUT_ERROR);
    for _ in 0..3 {
        store.record_failure(&record).await;
    }
    let created = RuleSynthesizer::new(3, 0.3)
        .synthesize(store.patterns(), &mut rules)
        .await
        .into_value()
        .unwrap();
    let rule_id = created[0].rule_id.clone();

    let prevented = RuleFeedback::Prevented;
    for _ in 0..2 {
        rules.record_feedback(&rule_id, prevented).await;
    }
    let rule = rules
        .record_feedback(&rule_id, RuleFeedback::Recurred)
        .await
        .into_value()
        .unwrap();

    assert_eq!(rule.feedback_count(), 3);
    assert!((rule.success_rate - 2.0 / 3.0).abs() < 1e-9);
    assert!(rules.record_feedback("missing", RuleFeedback::Prevented).await.is_failed());
}

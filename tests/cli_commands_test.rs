//! Command helpers exercised without spawning the binary.

mod common;

use adaptest::cli::commands::history::record_report;
use adaptest::cli::output::CommandOutput;
use adaptest::domain::models::{TestOutcome, TestRunReport, TestStatus};
use common::open_stores;

fn report_json() -> &'static str {
    r#"{
        "run_id": "nightly-42",
        "total": 3,
        "passed": 1,
        "failed": 2,
        "duration": 9.5,
        "browser": "firefox",
        "tests": [
            {"name": "test_login", "status": "passed", "duration": 1.0},
            {"name": "test_cart", "status": "failed", "duration": 4.0,
             "error": "Network request to /api/cart failed"},
            {"name": "test_cart", "status": "failed", "duration": 4.5,
             "error": "Network request to /api/cart failed"}
        ]
    }"#
}

#[tokio::test]
async fn test_record_report_learns_failures() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _, mut history) = open_stores(dir.path()).await;
    let report: TestRunReport = serde_json::from_str(report_json()).unwrap();

    let recorded = record_report(&mut history, Some(store), report)
        .await
        .unwrap();

    assert_eq!(recorded.run.run_id, "nightly-42");
    assert_eq!(recorded.run.browser, "firefox");
    assert_eq!(recorded.patterns_recorded, 2);
    assert!(recorded.diagnostics.is_empty());
    assert!(recorded.to_human().contains("Learned from 2 failure(s)"));

    let (store, _, history) = open_stores(dir.path()).await;
    assert_eq!(history.len(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.patterns()[0].frequency, 2);
}

#[tokio::test]
async fn test_record_report_without_learning() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, mut history) = open_stores(dir.path()).await;
    let report = TestRunReport {
        total: 1,
        failed: 1,
        tests: vec![TestOutcome::new("test_x", TestStatus::Failed).with_error("boom")],
        ..TestRunReport::default()
    };

    let recorded = record_report(&mut history, None, report).await.unwrap();

    assert_eq!(recorded.patterns_recorded, 0);
    let json = recorded.to_json();
    assert_eq!(json["run"]["failed"], 1);
    assert_eq!(json["patterns_recorded"], 0);

    let (store, _, _) = open_stores(dir.path()).await;
    assert!(store.is_empty());
}

//! E2E tests: full dashboard refresh over several builds.

use std::time::{Duration, Instant};

use allure_dashboard_lib::models::{RecordErrorKind, RecordStatus};
use allure_dashboard_lib::services::RetryPolicy;

use super::mock_jenkins::{MockBuild, MockJenkins, Reply};
use super::test_helpers::*;

#[actix_rt::test]
async fn test_refresh_isolates_failing_builds() {
    let mock = MockJenkins::start(Some(TEST_SESSION)).await;
    mock.set_build(
        "ui-tests",
        42,
        MockBuild::ok(summary_json(4, 1, 0, 0), results_json(&[("login", "failed")])),
    );
    mock.set_build("api-tests", 7, MockBuild::both(Reply::Status(500)));
    mock.set_build(
        "perf-tests",
        3,
        MockBuild::both(Reply::Delayed(Duration::from_secs(3), summary_json(1, 0, 0, 0))),
    );

    let service = create_service(
        &mock.base_url,
        Some(TEST_SESSION),
        Duration::from_millis(500),
        vec![
            new_build(&mock.build_url("ui-tests", 42), Some("staging")),
            new_build(&mock.build_url("api-tests", 7), Some("staging")),
            new_build(&mock.build_url("perf-tests", 3), None),
        ],
        RetryPolicy::none(),
    )
    .await;

    let snapshot = service.refresh().await.expect("refresh should publish");

    let jobs: Vec<&str> = snapshot
        .records
        .iter()
        .map(|r| r.build_config.job_name.as_str())
        .collect();
    assert_eq!(jobs, vec!["ui-tests", "api-tests", "perf-tests"], "input order kept");

    assert_eq!(snapshot.records[0].status, RecordStatus::Ok);
    assert_eq!(snapshot.records[1].status, RecordStatus::Error);
    assert_eq!(snapshot.records[2].status, RecordStatus::Error);
    assert!(
        snapshot.records[2]
            .error_detail
            .as_deref()
            .unwrap()
            .contains("timed out")
    );
    assert_eq!(snapshot.ok_count(), 1);
    assert_eq!(snapshot.error_count(), 2);
    assert!(!snapshot.reauthenticate_required);

    let envs: Vec<&str> = snapshot
        .environments
        .iter()
        .map(|e| e.environment.as_str())
        .collect();
    assert_eq!(envs, vec!["default", "staging"]);
    let staging = &snapshot.environments[1];
    assert_eq!(staging.total, 5);
    assert_eq!(staging.failed, 1);
    assert_eq!(staging.success_rate_percent, 80.0);
}

#[actix_rt::test]
async fn test_builds_fetch_concurrently() {
    let mock = MockJenkins::start(Some(TEST_SESSION)).await;
    let delay = Duration::from_millis(600);
    for number in 1..=4 {
        mock.set_build(
            "nightly",
            number,
            MockBuild {
                summary: Reply::Delayed(delay, summary_json(1, 0, 0, 0)),
                results: Reply::Delayed(delay, results_json(&[("smoke", "passed")])),
            },
        );
    }
    let builds = (1..=4)
        .map(|n| new_build(&mock.build_url("nightly", n), None))
        .collect();
    let service = create_service(
        &mock.base_url,
        Some(TEST_SESSION),
        Duration::from_secs(5),
        builds,
        RetryPolicy::none(),
    )
    .await;

    let started = Instant::now();
    let snapshot = service.refresh().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(snapshot.ok_count(), 4);
    assert!(
        elapsed < delay * 4,
        "eight reads should overlap, took {:?}",
        elapsed
    );
}

#[actix_rt::test]
async fn test_flaky_ranking_across_builds() {
    let mock = MockJenkins::start(Some(TEST_SESSION)).await;
    mock.set_build(
        "ui-tests",
        41,
        MockBuild::ok(
            summary_json(1, 1, 0, 0),
            results_json(&[("checkout", "failed"), ("login", "passed")]),
        ),
    );
    mock.set_build(
        "ui-tests",
        42,
        MockBuild::ok(
            summary_json(1, 1, 0, 0),
            results_json(&[("checkout", "passed"), ("login", "broken")]),
        ),
    );
    mock.set_build(
        "ui-tests",
        43,
        MockBuild::ok(
            summary_json(1, 1, 0, 0),
            results_json(&[("checkout", "failed"), ("login", "passed")]),
        ),
    );
    let builds = (41..=43)
        .map(|n| new_build(&mock.build_url("ui-tests", n), None))
        .collect();
    let service = create_service(
        &mock.base_url,
        Some(TEST_SESSION),
        Duration::from_secs(5),
        builds,
        RetryPolicy::none(),
    )
    .await;

    let snapshot = service.refresh().await.unwrap();

    let ranking: Vec<(&str, f64)> = snapshot
        .flaky_tests
        .iter()
        .map(|f| (f.test_name.as_str(), f.failure_rate_percent))
        .collect();
    assert_eq!(ranking, vec![("checkout", 66.67), ("login", 33.33)]);
    assert_eq!(snapshot.flaky_tests[0].total_runs, 3);
    assert_eq!(snapshot.flaky_tests[0].job_name, "ui-tests");

    // All three records fetched on the same day
    assert_eq!(snapshot.trend.len(), 1);
    assert_eq!(snapshot.trend[0].total, 6);
    assert_eq!(snapshot.trend[0].success_rate_percent, 50.0);
}

#[actix_rt::test]
async fn test_retry_policy_refetches_transient_failures() {
    let mock = MockJenkins::start(Some(TEST_SESSION)).await;
    mock.set_build("api-tests", 7, MockBuild::both(Reply::Status(503)));
    let service = create_service(
        &mock.base_url,
        Some(TEST_SESSION),
        Duration::from_secs(5),
        vec![new_build(&mock.build_url("api-tests", 7), None)],
        RetryPolicy::with_attempts(2),
    )
    .await;

    let snapshot = service.refresh().await.unwrap();

    assert_eq!(snapshot.records[0].error_kind, Some(RecordErrorKind::Fetch));
    assert_eq!(
        mock.hits("/job/api-tests/7/allure-results/api/rs/allure2/export/summary.json"),
        3,
        "one attempt plus two retries"
    );
}

#[actix_rt::test]
async fn test_auth_failures_are_not_retried() {
    let mock = MockJenkins::start(Some(TEST_SESSION)).await;
    mock.set_build(
        "ui-tests",
        42,
        MockBuild::ok(summary_json(1, 0, 0, 0), results_json(&[("login", "passed")])),
    );
    let service = create_service(
        &mock.base_url,
        Some("expired"),
        Duration::from_secs(5),
        vec![new_build(&mock.build_url("ui-tests", 42), None)],
        RetryPolicy::with_attempts(3),
    )
    .await;

    let snapshot = service.refresh().await.unwrap();

    assert!(snapshot.reauthenticate_required);
    assert_eq!(
        mock.hits("/job/ui-tests/42/allure-results/api/rs/allure2/export/summary.json"),
        1
    );
}

#[actix_rt::test]
async fn test_missing_build_is_not_retried() {
    let mock = MockJenkins::start(Some(TEST_SESSION)).await;
    let service = create_service(
        &mock.base_url,
        Some(TEST_SESSION),
        Duration::from_secs(5),
        vec![new_build(&mock.build_url("deleted-job", 9), None)],
        RetryPolicy::with_attempts(3),
    )
    .await;

    let snapshot = service.refresh().await.unwrap();

    let record = &snapshot.records[0];
    assert_eq!(record.status, RecordStatus::Error);
    assert_eq!(record.error_kind, Some(RecordErrorKind::Fetch));
    assert!(!record.transient);
    assert_eq!(
        mock.hits("/job/deleted-job/9/allure-results/api/rs/allure2/export/summary.json"),
        1
    );
}

//! E2E tests: build list and dashboard endpoints.

use std::time::Duration;

use actix_web::test;
use allure_dashboard_lib::api::builds::BuildListResponse;
use allure_dashboard_lib::error::ErrorResponse;
use allure_dashboard_lib::middleware::request_logger::REQUEST_ID_HEADER;
use allure_dashboard_lib::models::{BuildConfig, DashboardSnapshot, RecordStatus};
use allure_dashboard_lib::services::RetryPolicy;
use serde_json::{Value, json};

use super::mock_jenkins::{MockBuild, MockJenkins};
use super::test_helpers::*;

#[actix_rt::test]
async fn test_health() {
    let mock = MockJenkins::start(None).await;
    let service = create_service(
        &mock.base_url,
        None,
        Duration::from_secs(5),
        vec![],
        RetryPolicy::none(),
    )
    .await;
    let app = create_test_app(service).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/api/v1/status").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["builds"], 0);
    assert_eq!(body["last_refresh"], Value::Null);
}

#[actix_rt::test]
async fn test_build_list_lifecycle() {
    let mock = MockJenkins::start(None).await;
    let service = create_service(
        &mock.base_url,
        None,
        Duration::from_secs(5),
        vec![],
        RetryPolicy::none(),
    )
    .await;
    let app = create_test_app(service).await;

    // Add
    let req = test::TestRequest::post()
        .uri("/api/v1/builds")
        .set_json(json!({
            "buildUrl": mock.build_url("ui-tests", 42),
            "environment": "staging",
            "tags": ["smoke", " ", "nightly"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: BuildConfig = test::read_body_json(resp).await;
    assert_eq!(created.name, "ui-tests #42");
    assert_eq!(created.job_name, "ui-tests");
    assert_eq!(created.build_number, 42);
    assert_eq!(created.tags.len(), 2);

    // Same build again
    let req = test::TestRequest::post()
        .uri("/api/v1/builds")
        .set_json(json!({ "buildUrl": mock.build_url("ui-tests", 42) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    // Unrecognized URL
    let req = test::TestRequest::post()
        .uri("/api/v1/builds")
        .set_json(json!({ "buildUrl": format!("{}/view/all/", mock.base_url) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let err: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(err.error, "INVALID_INPUT");

    // List
    let req = test::TestRequest::get().uri("/api/v1/builds").to_request();
    let resp = test::call_service(&app, req).await;
    let list: BuildListResponse = test::read_body_json(resp).await;
    assert_eq!(list.builds.len(), 1);
    let version = list.version;

    // Remove
    let req = test::TestRequest::delete()
        .uri("/api/v1/builds/ui-tests/42")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::delete()
        .uri("/api/v1/builds/ui-tests/42")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get().uri("/api/v1/builds").to_request();
    let resp = test::call_service(&app, req).await;
    let list: BuildListResponse = test::read_body_json(resp).await;
    assert!(list.builds.is_empty());
    assert!(list.version > version);
}

#[actix_rt::test]
async fn test_remove_build_with_encoded_job_name() {
    let mock = MockJenkins::start(None).await;
    let service = create_service(
        &mock.base_url,
        None,
        Duration::from_secs(5),
        vec![],
        RetryPolicy::none(),
    )
    .await;
    let app = create_test_app(service).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/builds")
        .set_json(json!({ "buildUrl": mock.build_url("UI%20Tests", 3) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: BuildConfig = test::read_body_json(resp).await;
    assert_eq!(created.job_name, "UI%20Tests");

    let req = test::TestRequest::delete()
        .uri("/api/v1/builds/UI%20Tests/3")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get().uri("/api/v1/builds").to_request();
    let resp = test::call_service(&app, req).await;
    let list: BuildListResponse = test::read_body_json(resp).await;
    assert!(list.builds.is_empty());
}

#[actix_rt::test]
async fn test_replace_rejects_duplicates() {
    let mock = MockJenkins::start(None).await;
    let service = create_service(
        &mock.base_url,
        None,
        Duration::from_secs(5),
        vec![new_build(&mock.build_url("ui-tests", 1), None)],
        RetryPolicy::none(),
    )
    .await;
    let app = create_test_app(service.clone()).await;

    let url = mock.build_url("ui-tests", 42);
    let req = test::TestRequest::put()
        .uri("/api/v1/builds")
        .set_json(json!([{ "buildUrl": url }, { "buildUrl": url.trim_end_matches('/') }]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    // Original list kept
    let list = service.registry().snapshot().await;
    assert_eq!(list.builds.len(), 1);
    assert_eq!(list.builds[0].build_number, 1);
}

#[actix_rt::test]
async fn test_dashboard_refreshes_when_build_list_changes() {
    let mock = MockJenkins::start(None).await;
    mock.set_build(
        "ui-tests",
        42,
        MockBuild::ok(summary_json(2, 0, 0, 0), results_json(&[("login", "passed")])),
    );
    mock.set_build(
        "api-tests",
        7,
        MockBuild::ok(summary_json(1, 1, 0, 0), results_json(&[("auth", "failed")])),
    );
    let service = create_service(
        &mock.base_url,
        None,
        Duration::from_secs(5),
        vec![new_build(&mock.build_url("ui-tests", 42), None)],
        RetryPolicy::none(),
    )
    .await;
    let app = create_test_app(service).await;

    let req = test::TestRequest::get().uri("/api/v1/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let first: DashboardSnapshot = test::read_body_json(resp).await;
    assert_eq!(first.records.len(), 1);
    assert_eq!(first.records[0].status, RecordStatus::Ok);

    // Unchanged list reuses the snapshot
    let req = test::TestRequest::get().uri("/api/v1/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    let again: DashboardSnapshot = test::read_body_json(resp).await;
    assert_eq!(again.generation, first.generation);

    let req = test::TestRequest::post()
        .uri("/api/v1/builds")
        .set_json(json!({ "buildUrl": mock.build_url("api-tests", 7) }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get().uri("/api/v1/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    let second: DashboardSnapshot = test::read_body_json(resp).await;
    assert!(second.generation > first.generation);
    assert_eq!(second.records.len(), 2);
    assert_eq!(second.flaky_tests.len(), 1);
    assert_eq!(second.flaky_tests[0].test_name, "auth");
    assert_eq!(second.flaky_tests[0].job_name, "api-tests");

    // Explicit refresh always runs
    let req = test::TestRequest::post()
        .uri("/api/v1/dashboard/refresh")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let third: DashboardSnapshot = test::read_body_json(resp).await;
    assert!(third.generation > second.generation);
}

use std::time::Duration as StdDuration;

use claimboard::error::{AppError, ProviderErrorCode};
use claimboard::services::provider_service::testing::{fetch_snapshot_via_http, map_http_error};
use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn fetch_sends_the_token_and_decodes_the_snapshot() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/snapshot")
            .header("authorization", "Token test-token");
        then.status(200).json_body(json!({
            "claims": [
                {
                    "id": 12,
                    "message": "message1",
                    "status": "pending",
                    "employee": 1,
                    "category": 1,
                    "publish_date": "2023-08-01T14:33:25.557503Z",
                    "close": false
                },
                {
                    "id": 8,
                    "employee": 2,
                    "category": 2,
                    "publish_date": "2023-08-01T14:33:25Z",
                    "close_date": "2023-08-02T10:00:00Z",
                    "close": true
                }
            ],
            "categories": [
                {"id": 1, "name": "Conflicts"},
                {"id": 2, "name": "Risques"}
            ],
            "users": [
                {"department": 1},
                {"department": 2}
            ],
            "departments": [{"id": 1}, {"id": 2}, {"id": 3}]
        }));
    });

    let snapshot = fetch_snapshot_via_http(&server.url("/snapshot"), StdDuration::from_secs(5))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(snapshot.claims.len(), 2);
    assert_eq!(snapshot.claims[0].id, 12);
    assert_eq!(snapshot.claims[0].message.as_deref(), Some("message1"));
    assert!(!snapshot.claims[0].close);
    assert!(snapshot.claims[1].close);
    assert_eq!(
        snapshot.claims[1].close_date.as_deref(),
        Some("2023-08-02T10:00:00Z")
    );
    assert_eq!(snapshot.categories[1].name, "Risques");
    assert_eq!(snapshot.users.len(), 2);
    assert_eq!(snapshot.departments.len(), 3);
}

#[tokio::test]
async fn missing_snapshot_keys_default_to_empty_lists() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/snapshot");
        then.status(200).json_body(json!({}));
    });

    let snapshot = fetch_snapshot_via_http(&server.url("/snapshot"), StdDuration::from_secs(5))
        .await
        .unwrap();

    assert!(snapshot.claims.is_empty());
    assert!(snapshot.categories.is_empty());
    assert!(snapshot.users.is_empty());
    assert!(snapshot.departments.is_empty());
}

#[tokio::test]
async fn malformed_bodies_surface_as_invalid_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/snapshot");
        then.status(200).body("not json at all");
    });

    let error = fetch_snapshot_via_http(&server.url("/snapshot"), StdDuration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(
        error.provider_code(),
        Some(ProviderErrorCode::InvalidResponse)
    );
}

#[tokio::test]
async fn unauthorized_fails_fast_without_retrying() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/snapshot");
        then.status(401);
    });

    let error = fetch_snapshot_via_http(&server.url("/snapshot"), StdDuration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(mock.hits(), 1);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Unauthorized));
}

#[tokio::test]
async fn server_errors_are_retried_until_the_schedule_runs_out() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/snapshot");
        then.status(503);
    });

    let error = fetch_snapshot_via_http(&server.url("/snapshot"), StdDuration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(mock.hits(), 4);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Unavailable));
    assert!(error.to_string().contains("503"));
}

#[test]
fn http_error_mapping_exposes_retry_semantics() {
    let (error, retryable) = map_http_error(StatusCode::UNAUTHORIZED);
    assert!(!retryable);
    assert_eq!(error.to_string(), "数据源访问令牌无效或未授权");
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Unauthorized));
    assert_eq!(error.provider_correlation_id(), Some("test-correlation-id"));

    let (error, retryable) = map_http_error(StatusCode::FORBIDDEN);
    assert!(!retryable);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Forbidden));

    let (error, retryable) = map_http_error(StatusCode::TOO_MANY_REQUESTS);
    assert!(retryable);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::RateLimited));

    let (error, retryable) = map_http_error(StatusCode::from_u16(503).unwrap());
    assert!(retryable);
    assert!(error.to_string().contains("数据源服务暂时不可用 (状态码 503)"));
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Unavailable));

    let (error, retryable) = map_http_error(StatusCode::NOT_FOUND);
    assert!(!retryable);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::InvalidRequest));

    let (error, retryable) = map_http_error(StatusCode::BAD_REQUEST);
    assert!(!retryable);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::InvalidRequest));

    let (error, retryable) = map_http_error(StatusCode::IM_A_TEAPOT);
    assert!(!retryable);
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Unknown));
}

#[test]
fn provider_errors_render_through_app_error() {
    let error = AppError::provider(ProviderErrorCode::MissingToken, "数据源访问令牌未配置");
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::MissingToken));
    assert_eq!(error.provider_correlation_id(), None);
    assert_eq!(error.to_string(), "数据源访问令牌未配置");
}

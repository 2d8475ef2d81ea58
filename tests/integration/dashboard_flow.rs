use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use claimboard::error::ProviderErrorCode;
use claimboard::models::config::ConfigUpdateInput;
use claimboard::models::dashboard::DashboardState;
use claimboard::services::provider_service::ProviderConfig;
use claimboard::AppState;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn valid_config() -> ConfigUpdateInput {
    ConfigUpdateInput {
        total_employees_number: 10,
        total_unities_number: 45,
        performance_hours_offset: 48,
    }
}

fn state_against(server: &MockServer) -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let provider = ProviderConfig {
        base_url: server.url("/snapshot"),
        token: Some("test-token".to_string()),
        http_timeout: StdDuration::from_secs(5),
    }
    .build_provider()
    .unwrap()
    .expect("provider should build with a token");

    let state = AppState::with_provider(
        temp_dir.path().join("claimboard.db"),
        Arc::new(provider),
    )
    .unwrap();

    (state, temp_dir)
}

fn feed_timestamp(instant: chrono::DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[tokio::test]
async fn unconfigured_dashboard_redirects_to_setup() {
    let server = MockServer::start();
    let (state, _guard) = state_against(&server);

    let outcome = state.dashboard().build().await.unwrap();
    assert_eq!(outcome, DashboardState::NotConfigured);
}

#[tokio::test]
async fn invalid_setup_is_rejected_per_field_and_nothing_persists() {
    let server = MockServer::start();
    let (state, _guard) = state_against(&server);

    let error = state
        .config()
        .save(ConfigUpdateInput {
            total_employees_number: 0,
            total_unities_number: 45,
            performance_hours_offset: 48,
        })
        .unwrap_err();

    let details = error.validation_details().unwrap();
    assert!(details.get("total_employees_number").is_some());

    let outcome = state.dashboard().build().await.unwrap();
    assert_eq!(outcome, DashboardState::NotConfigured);
}

#[tokio::test]
async fn configured_dashboard_aggregates_the_fetched_snapshot() {
    let server = MockServer::start();
    let (state, _guard) = state_against(&server);
    state.config().save(valid_config()).unwrap();

    // Recent activity sits at "now" so it always falls inside the
    // performance window; response-time fixtures stay in January so the
    // month buckets are deterministic across the calendar year.
    let recent = feed_timestamp(Utc::now() - Duration::minutes(5));
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/snapshot")
            .header("authorization", "Token test-token");
        then.status(200).json_body(json!({
            "claims": [
                {
                    "id": 12,
                    "message": "message1",
                    "status": "proceed",
                    "employee": 1,
                    "category": 1,
                    "publish_date": "2023-01-05T14:26:00Z",
                    "start_date": "2023-01-05T14:33:25Z",
                    "close": false
                },
                {
                    "id": 8,
                    "message": "message2",
                    "status": "finish",
                    "employee": 2,
                    "category": 2,
                    "publish_date": recent,
                    "close_date": recent,
                    "close": true
                },
                {
                    "id": 40,
                    "message": "draft without publish date",
                    "employee": 3
                }
            ],
            "categories": [
                {"id": 1, "name": "Conflicts"},
                {"id": 2, "name": "Risques"}
            ],
            "users": [
                {"department": 1},
                {"department": 1},
                {"department": 2}
            ],
            "departments": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}]
        }));
    });

    let outcome = state.dashboard().build().await.unwrap();
    let DashboardState::Ready(data) = outcome else {
        panic!("expected a ready dashboard");
    };

    mock.assert();

    assert_eq!(data.activated_employees, 2);
    assert_eq!(data.activated_employees_percentage, "20%");
    assert_eq!(data.total_employees, 10);

    // Units come from the upstream department count, not the configured 45.
    assert_eq!(data.activated_units, 2);
    assert_eq!(data.total_units, 4);
    assert_eq!(data.activated_units_percentage, "50%");

    assert_eq!(data.mean_response_time.minutes, 7);
    assert_eq!(data.mean_ending_time.days, 0);

    assert_eq!(data.most_opened_claim_category, "Conflicts");
    assert_eq!(data.most_closed_claim_category, "Risques");
    assert_eq!(data.most_closed_claim_category_times, 1);

    assert_eq!(data.last_five_unclosed_claims.len(), 1);
    assert_eq!(data.last_five_unclosed_claims[0].id, 12);
    assert_eq!(data.last_five_closed_claims.len(), 1);
    assert_eq!(data.last_five_closed_claims[0].id, 8);

    assert_eq!(data.performance.counted_closed_claims, 1);
    assert_eq!(data.performance.counted_published_claims, 1);
    assert_eq!(data.performance.percentage, "100%");
    assert_eq!(data.performance.hours, 48);

    assert_eq!(data.bar_chart.labels.first().map(String::as_str), Some("Jan"));
    assert_eq!(data.bar_chart.data.iter().sum::<i64>(), 2);
    assert_eq!(data.line_chart.labels, data.bar_chart.labels);
    assert_eq!(data.line_chart.data.last(), Some(&2));
}

#[tokio::test]
async fn provider_refusal_becomes_a_typed_failure() {
    let server = MockServer::start();
    let (state, _guard) = state_against(&server);
    state.config().save(valid_config()).unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/snapshot");
        then.status(401);
    });

    let error = state.dashboard().build().await.unwrap_err();
    assert_eq!(error.provider_code(), Some(ProviderErrorCode::Unauthorized));
}

#[tokio::test]
async fn configuration_survives_reopening_the_store() {
    let server = MockServer::start();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("claimboard.db");

    {
        let provider = ProviderConfig {
            base_url: server.url("/snapshot"),
            token: Some("test-token".to_string()),
            http_timeout: StdDuration::from_secs(5),
        }
        .build_provider()
        .unwrap()
        .unwrap();
        let state = AppState::with_provider(&db_path, Arc::new(provider)).unwrap();
        state.config().save(valid_config()).unwrap();
    }

    let provider = ProviderConfig {
        base_url: server.url("/snapshot"),
        token: Some("test-token".to_string()),
        http_timeout: StdDuration::from_secs(5),
    }
    .build_provider()
    .unwrap()
    .unwrap();
    let reopened = AppState::with_provider(&db_path, Arc::new(provider)).unwrap();

    let config = reopened.config().get().unwrap().unwrap();
    assert_eq!(config.total_employees, 10);
    assert_eq!(config.performance_hours_offset, 48);
}

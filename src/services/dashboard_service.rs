use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::claim::{ApiSnapshot, Category, Claim};
use crate::models::config::DashboardConfig;
use crate::models::dashboard::{
    CategoryCount, ChartSeries, DashboardData, DashboardState, NO_CATEGORY_NAME, NO_CATEGORY_TIMES,
};
use crate::services::config_service::ConfigService;
use crate::services::provider_service::SnapshotProvider;
use crate::services::stats_service::{
    best_performance_window, count_activated_employees, count_activated_units,
    cumulative_by_month, group_by_month, last_claims_by_id, most_occurred_category,
};
use crate::utils::time::mean_delta_formatted;

const LAST_CLAIMS_LIMIT: usize = 5;
const SAMPLE_PERFORMANCE_HOURS: i64 = 48;

pub struct DashboardService {
    config_service: Arc<ConfigService>,
    provider: Arc<dyn SnapshotProvider>,
}

impl DashboardService {
    pub fn new(config_service: Arc<ConfigService>, provider: Arc<dyn SnapshotProvider>) -> Self {
        Self {
            config_service,
            provider,
        }
    }

    /// One dashboard build: configuration, then a fresh snapshot, then the
    /// aggregation pass. An absent configuration is a normal outcome;
    /// provider failures propagate as typed errors for the caller's
    /// "data unavailable" state.
    pub async fn build(&self) -> AppResult<DashboardState> {
        let Some(config) = self.config_service.get()? else {
            debug!(target: "app::dashboard", "dashboard requested before configuration");
            return Ok(DashboardState::NotConfigured);
        };

        let snapshot = self.provider.fetch_snapshot().await?;
        let data = assemble_dashboard(&config, &snapshot, Utc::now())?;

        info!(
            target: "app::dashboard",
            claims = snapshot.claims.len(),
            activated_employees = data.activated_employees,
            "dashboard assembled"
        );

        Ok(DashboardState::Ready(Box::new(data)))
    }
}

/// Pure assembly of the dashboard contract from a configuration and one
/// snapshot. `now` anchors the calendar window and the performance range.
pub fn assemble_dashboard(
    config: &DashboardConfig,
    snapshot: &ApiSnapshot,
    now: DateTime<Utc>,
) -> AppResult<DashboardData> {
    let published: Vec<Claim> = snapshot
        .claims
        .iter()
        .filter(|claim| claim.is_published())
        .cloned()
        .collect();
    let unclosed: Vec<Claim> = published
        .iter()
        .filter(|claim| !claim.close)
        .cloned()
        .collect();
    let closed: Vec<Claim> = published
        .iter()
        .filter(|claim| claim.close)
        .cloned()
        .collect();
    let ended: Vec<Claim> = snapshot
        .claims
        .iter()
        .filter(|claim| claim.is_ended())
        .cloned()
        .collect();
    let started: Vec<Claim> = snapshot
        .claims
        .iter()
        .filter(|claim| claim.is_started())
        .cloned()
        .collect();

    let bar_chart = chart_series(group_by_month(&published, Claim::publish_date, now)?);
    let line_chart = chart_series(cumulative_by_month(&published, Claim::publish_date, now)?);

    let activated_employees = count_activated_employees(&published, config.total_employees);
    // The activated-units base is the upstream department count, not the
    // configured total; the legacy dashboard never consults the latter here.
    let activated_units =
        count_activated_units(&snapshot.users, snapshot.departments.len() as i64);

    let mean_response_time = mean_delta_formatted(&started, Claim::publish_date, Claim::start_date)?;
    let mean_ending_time = mean_delta_formatted(&ended, Claim::publish_date, Claim::end_date)?;

    let (most_opened_claim_category, most_opened_claim_category_times) =
        legacy_category(most_occurred_category(&published, &snapshot.categories));
    let (most_closed_claim_category, most_closed_claim_category_times) =
        legacy_category(most_occurred_category(&closed, &snapshot.categories));

    let last_five_unclosed_claims = last_claims_by_id(&unclosed, LAST_CLAIMS_LIMIT);
    let last_five_closed_claims = last_claims_by_id(&closed, LAST_CLAIMS_LIMIT);

    let performance =
        best_performance_window(&closed, &published, config.performance_hours_offset, now)?;

    Ok(DashboardData {
        activated_employees: activated_employees.number,
        activated_employees_percentage: activated_employees.percentage,
        total_employees: activated_employees.total,
        activated_units: activated_units.number,
        activated_units_percentage: activated_units.percentage,
        total_units: activated_units.total,
        mean_response_time,
        mean_ending_time,
        most_opened_claim_category,
        most_opened_claim_category_times,
        last_five_unclosed_claims,
        most_closed_claim_category,
        most_closed_claim_category_times,
        last_five_closed_claims,
        performance,
        bar_chart,
        line_chart,
    })
}

/// A demo dashboard built through the real aggregation routines from
/// fixed fixtures, for previewing the presentation layer before any
/// provider is wired up.
pub fn sample_dashboard(now: DateTime<Utc>) -> AppResult<DashboardData> {
    let started = vec![sample_interval_claim(
        1,
        "2023-07-01T11:26:00.210087Z",
        IntervalKind::Start("2023-08-01T14:33:25.557503Z"),
    )];
    let mean_response_time = mean_delta_formatted(&started, Claim::publish_date, Claim::start_date)?;

    let ended = vec![sample_interval_claim(
        1,
        "2023-07-01T11:26:00.210087Z",
        IntervalKind::End("2023-08-02T10:33:25.557503Z"),
    )];
    let mean_ending_time = mean_delta_formatted(&ended, Claim::publish_date, Claim::end_date)?;

    let categories = vec![
        Category {
            id: 1,
            name: "Conflicts".to_string(),
        },
        Category {
            id: 2,
            name: "Risques".to_string(),
        },
    ];

    let (most_opened_claim_category, most_opened_claim_category_times) = legacy_category(
        most_occurred_category(&sample_categorized_claims(&[1, 1, 2]), &categories),
    );
    let (most_closed_claim_category, most_closed_claim_category_times) = legacy_category(
        most_occurred_category(&sample_categorized_claims(&[2, 2, 2]), &categories),
    );

    // Recent activity is anchored just inside the window so the sample
    // performance ratio is meaningful at any clock.
    let recent = format_sample_timestamp(now - Duration::hours(1));
    let closed = vec![
        sample_closed_claim(1, &recent),
        sample_closed_claim(2, &recent),
    ];
    let published = vec![
        sample_published_claim(3, &recent),
        sample_published_claim(4, &recent),
        closed[0].clone(),
        closed[1].clone(),
    ];
    let performance =
        best_performance_window(&closed, &published, SAMPLE_PERFORMANCE_HOURS, now)?;

    let chart_claims = vec![
        sample_published_claim(1, "2023-01-01T14:33:25.557503Z"),
        sample_published_claim(2, "2023-01-01T14:33:25.557503Z"),
        sample_published_claim(3, "2023-02-01T14:33:25.557503Z"),
        sample_published_claim(4, "2023-01-01T14:33:25.557503Z"),
        sample_published_claim(5, "2023-03-01T14:33:25.557503Z"),
        sample_published_claim(6, "2023-05-01T14:33:25.557503Z"),
    ];
    let bar_chart = chart_series(group_by_month(&chart_claims, Claim::publish_date, now)?);
    let line_chart = chart_series(cumulative_by_month(&chart_claims, Claim::publish_date, now)?);

    Ok(DashboardData {
        activated_employees: 20,
        activated_employees_percentage: "20%".to_string(),
        total_employees: 100,
        activated_units: 15,
        activated_units_percentage: "33.33%".to_string(),
        total_units: 45,
        mean_response_time,
        mean_ending_time,
        most_opened_claim_category,
        most_opened_claim_category_times,
        last_five_unclosed_claims: sample_unclosed_claims(),
        most_closed_claim_category,
        most_closed_claim_category_times,
        last_five_closed_claims: sample_closed_claims(),
        performance,
        bar_chart,
        line_chart,
    })
}

fn legacy_category(result: Option<CategoryCount>) -> (String, i64) {
    match result {
        Some(winner) => (winner.category.name, winner.times),
        None => (NO_CATEGORY_NAME.to_string(), NO_CATEGORY_TIMES),
    }
}

fn chart_series(series: Vec<(&'static str, i64)>) -> ChartSeries {
    let mut data = Vec::with_capacity(series.len());
    let mut labels = Vec::with_capacity(series.len());
    for (label, value) in series {
        labels.push(label.to_string());
        data.push(value);
    }
    ChartSeries { data, labels }
}

enum IntervalKind<'a> {
    Start(&'a str),
    End(&'a str),
}

fn blank_claim(id: i64) -> Claim {
    Claim {
        id,
        message: None,
        status: None,
        employee: None,
        category: None,
        publish_date: None,
        start_date: None,
        end_date: None,
        close_date: None,
        close: false,
    }
}

fn sample_interval_claim(id: i64, publish_date: &str, interval: IntervalKind<'_>) -> Claim {
    let mut claim = blank_claim(id);
    claim.publish_date = Some(publish_date.to_string());
    match interval {
        IntervalKind::Start(value) => claim.start_date = Some(value.to_string()),
        IntervalKind::End(value) => claim.end_date = Some(value.to_string()),
    }
    claim
}

fn sample_categorized_claims(category_ids: &[i64]) -> Vec<Claim> {
    category_ids
        .iter()
        .enumerate()
        .map(|(index, category_id)| {
            let mut claim = blank_claim(index as i64 + 1);
            claim.category = Some(*category_id);
            claim
        })
        .collect()
}

fn sample_published_claim(id: i64, publish_date: &str) -> Claim {
    let mut claim = blank_claim(id);
    claim.publish_date = Some(publish_date.to_string());
    claim
}

fn sample_closed_claim(id: i64, timestamp: &str) -> Claim {
    let mut claim = sample_published_claim(id, timestamp);
    claim.close_date = Some(timestamp.to_string());
    claim.close = true;
    claim
}

fn sample_listed_claim(
    id: i64,
    message: &str,
    status: &str,
    publish_date: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
    close: bool,
) -> Claim {
    let mut claim = sample_published_claim(id, publish_date);
    claim.message = Some(message.to_string());
    claim.status = Some(status.to_string());
    claim.start_date = start_date.map(str::to_string);
    claim.end_date = end_date.map(str::to_string);
    claim.close = close;
    claim
}

fn sample_unclosed_claims() -> Vec<Claim> {
    vec![
        sample_listed_claim(
            1,
            "message1",
            "pending",
            "2023-01-01T14:33:25.557503Z",
            None,
            None,
            false,
        ),
        sample_listed_claim(
            45,
            "message2",
            "proceed",
            "2023-02-01T14:33:25.557503Z",
            Some("2023-02-01T14:34:25.557503Z"),
            None,
            false,
        ),
        sample_listed_claim(
            33,
            "message3",
            "finish",
            "2023-03-01T14:33:25.557503Z",
            Some("2023-03-01T14:34:25.557503Z"),
            Some("2023-03-01T14:35:25.557503Z"),
            false,
        ),
        sample_listed_claim(
            66,
            "message4",
            "proceed",
            "2023-04-01T14:33:25.557503Z",
            Some("2023-04-01T14:34:25.557503Z"),
            None,
            false,
        ),
        sample_listed_claim(
            98,
            "message5",
            "finish",
            "2023-05-01T14:33:25.557503Z",
            Some("2023-05-01T14:34:25.557503Z"),
            Some("2023-05-01T14:35:25.557503Z"),
            false,
        ),
    ]
}

fn sample_closed_claims() -> Vec<Claim> {
    vec![
        sample_listed_claim(
            22,
            "message2",
            "finish",
            "2023-02-01T14:33:25.557503Z",
            Some("2023-02-01T14:33:25.557503Z"),
            Some("2023-02-01T14:55:25.557503Z"),
            true,
        ),
        sample_listed_claim(
            45,
            "message2",
            "finish",
            "2023-02-01T14:33:25.557503Z",
            Some("2023-02-01T14:34:25.557503Z"),
            Some("2023-02-01T14:35:25.557503Z"),
            true,
        ),
        sample_listed_claim(
            33,
            "message3",
            "finish",
            "2023-03-01T14:33:25.557503Z",
            Some("2023-03-01T14:34:25.557503Z"),
            Some("2023-03-01T14:35:25.557503Z"),
            true,
        ),
        sample_listed_claim(
            66,
            "message4",
            "finish",
            "2023-04-01T14:33:25.557503Z",
            Some("2023-04-01T14:34:25.557503Z"),
            Some("2023-04-01T14:35:25.557503Z"),
            true,
        ),
        sample_listed_claim(
            98,
            "message5",
            "finish",
            "2023-05-01T14:33:25.557503Z",
            Some("2023-05-01T14:34:25.557503Z"),
            Some("2023-05-01T14:35:25.557503Z"),
            true,
        ),
    ]
}

fn format_sample_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

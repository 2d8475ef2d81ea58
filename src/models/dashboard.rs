use serde::Serialize;

use crate::models::claim::{Category, Claim};

/// Outcome of a dashboard build. `NotConfigured` is a normal state, not a
/// failure; the caller redirects to the setup form.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Ready(Box<DashboardData>),
    NotConfigured,
}

impl DashboardState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DashboardState::Ready(_))
    }
}

/// Distinct-count statistic over a configured total, percentage already
/// rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivationStats {
    pub number: i64,
    pub percentage: String,
    pub total: i64,
}

/// A duration broken into whole days, hours and minutes. Seconds are
/// discarded, never rounded up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DurationBreakdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// The winning category of a ranking pass and how often it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub category: Category,
    pub times: i64,
}

/// Throughput over the trailing performance window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub counted_closed_claims: i64,
    pub counted_published_claims: i64,
    pub percentage: String,
    pub hours: i64,
}

/// Parallel label/value series for the chart widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub data: Vec<i64>,
    pub labels: Vec<String>,
}

/// Sentinel rendered when no category ranking could be computed. The
/// legacy presentation layer keys on this pair.
pub const NO_CATEGORY_NAME: &str = "No Category Found";
pub const NO_CATEGORY_TIMES: i64 = -1;

/// The flat dashboard contract handed to the presentation layer. Field
/// names are the legacy snake_case keys and must not be renamed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub activated_employees: i64,
    pub activated_employees_percentage: String,
    pub total_employees: i64,
    pub activated_units: i64,
    pub activated_units_percentage: String,
    pub total_units: i64,
    pub mean_response_time: DurationBreakdown,
    pub mean_ending_time: DurationBreakdown,
    pub most_opened_claim_category: String,
    pub most_opened_claim_category_times: i64,
    pub last_five_unclosed_claims: Vec<Claim>,
    pub most_closed_claim_category: String,
    pub most_closed_claim_category_times: i64,
    pub last_five_closed_claims: Vec<Claim>,
    pub performance: PerformanceStats,
    pub bar_chart: ChartSeries,
    pub line_chart: ChartSeries,
}

use serde::{Deserialize, Serialize};

/// The single dashboard configuration record. At most one exists; its
/// absence means the dashboard has never been set up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub total_employees: i64,
    pub total_units: i64,
    pub performance_hours_offset: i64,
    pub updated_at: String,
}

/// Submitted configuration values. Field names match the legacy setup
/// form so validation errors can be reported per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdateInput {
    pub total_employees_number: i64,
    pub total_unities_number: i64,
    pub performance_hours_offset: i64,
}

impl From<&DashboardConfig> for ConfigUpdateInput {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            total_employees_number: config.total_employees,
            total_unities_number: config.total_units,
            performance_hours_offset: config.performance_hours_offset,
        }
    }
}

use std::sync::RwLock;

use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::info;

use crate::db::repositories::config_repository::{ConfigRepository, DashboardConfigRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::config::{ConfigUpdateInput, DashboardConfig};

pub struct ConfigService {
    db: DbPool,
    cache: RwLock<Option<DashboardConfig>>,
}

impl ConfigService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(None),
        }
    }

    /// The configuration record, or `None` when the dashboard has never
    /// been set up.
    pub fn get(&self) -> AppResult<Option<DashboardConfig>> {
        if let Ok(guard) = self.cache.read() {
            if let Some(config) = guard.as_ref() {
                return Ok(Some(config.clone()));
            }
        }

        let loaded = self
            .db
            .with_connection(ConfigRepository::get)?
            .map(config_from_row);

        if let Some(config) = loaded.as_ref() {
            if let Ok(mut guard) = self.cache.write() {
                *guard = Some(config.clone());
            }
        }

        Ok(loaded)
    }

    /// Validate and persist a submitted configuration. All three values
    /// must be at least 1; violations are rejected together with
    /// per-field messages and nothing is written. The write is a single
    /// upsert, so concurrent submissions cannot duplicate the record.
    pub fn save(&self, input: ConfigUpdateInput) -> AppResult<DashboardConfig> {
        validate_input(&input)?;

        self.db.with_connection(|conn| {
            ConfigRepository::upsert(
                conn,
                input.total_employees_number,
                input.total_unities_number,
                input.performance_hours_offset,
            )
        })?;

        info!(
            target: "app::config",
            total_employees = input.total_employees_number,
            total_units = input.total_unities_number,
            performance_hours_offset = input.performance_hours_offset,
            "dashboard configuration saved"
        );

        let saved = self
            .db
            .with_connection(ConfigRepository::get)?
            .map(config_from_row)
            .ok_or_else(AppError::not_found)?;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(saved.clone());
        }

        Ok(saved)
    }

    /// The stored configuration reshaped as form input, for pre-filling
    /// the setup form. `None` when unconfigured.
    pub fn current_input(&self) -> AppResult<Option<ConfigUpdateInput>> {
        Ok(self.get()?.as_ref().map(ConfigUpdateInput::from))
    }
}

fn config_from_row(row: DashboardConfigRow) -> DashboardConfig {
    DashboardConfig {
        total_employees: row.total_employees,
        total_units: row.total_units,
        performance_hours_offset: row.performance_hours_offset,
        updated_at: row.updated_at,
    }
}

fn validate_input(input: &ConfigUpdateInput) -> AppResult<()> {
    let mut field_errors = JsonMap::new();

    if input.total_employees_number < 1 {
        field_errors.insert(
            "total_employees_number".to_string(),
            json!("员工总数必须大于等于 1"),
        );
    }
    if input.total_unities_number < 1 {
        field_errors.insert(
            "total_unities_number".to_string(),
            json!("单位总数必须大于等于 1"),
        );
    }
    if input.performance_hours_offset < 1 {
        field_errors.insert(
            "performance_hours_offset".to_string(),
            json!("绩效时间窗口必须大于等于 1 小时"),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation_with_details(
            "配置校验失败",
            JsonValue::Object(field_errors),
        ))
    }
}

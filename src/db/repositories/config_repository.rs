use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct DashboardConfigRow {
    pub total_employees: i64,
    pub total_units: i64,
    pub performance_hours_offset: i64,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for DashboardConfigRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            total_employees: row.get("total_employees")?,
            total_units: row.get("total_units")?,
            performance_hours_offset: row.get("performance_hours_offset")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct ConfigRepository;

impl ConfigRepository {
    pub fn get(conn: &Connection) -> AppResult<Option<DashboardConfigRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT total_employees, total_units, performance_hours_offset, updated_at
                FROM dashboard_config
                WHERE id = 1
            "#,
        )?;

        let row = stmt
            .query_row([], |row| DashboardConfigRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    /// Create-or-replace in a single statement; concurrent submissions can
    /// never leave two configuration records behind.
    pub fn upsert(
        conn: &Connection,
        total_employees: i64,
        total_units: i64,
        performance_hours_offset: i64,
    ) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO dashboard_config
                    (id, total_employees, total_units, performance_hours_offset)
                VALUES
                    (1, :total_employees, :total_units, :performance_hours_offset)
                ON CONFLICT(id) DO UPDATE SET
                    total_employees = excluded.total_employees,
                    total_units = excluded.total_units,
                    performance_hours_offset = excluded.performance_hours_offset,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {
                ":total_employees": total_employees,
                ":total_units": total_units,
                ":performance_hours_offset": performance_hours_offset,
            },
        )?;

        Ok(())
    }
}

//! Care window persistence port and SQLite implementation.
//!
//! # Invariants
//! - Time-of-day columns store canonical `HH:MM` text.
//! - Listing order is deterministic: `weekday, start_time, uuid`.

use super::{ensure_connection_ready, not_found, uuid_column, RepoError, RepoResult};
use crate::error::EntityKind;
use crate::model::actor::UserId;
use crate::model::care_window::{validate_time_of_day, CareWindow, CareWindowId};
use crate::model::directory::PatientId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const CARE_WINDOW_SELECT_SQL: &str = "SELECT
    uuid,
    caregiver_uuid,
    patient_uuid,
    weekday,
    start_time,
    end_time
FROM care_windows";

/// Filter for listing care windows; `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CareWindowQuery {
    pub weekday: Option<u8>,
    pub patient_id: Option<PatientId>,
    pub caregiver_id: Option<UserId>,
}

impl CareWindowQuery {
    pub fn weekday(weekday: u8) -> Self {
        Self {
            weekday: Some(weekday),
            ..Self::default()
        }
    }

    pub fn patient(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }

    pub fn caregiver(caregiver_id: UserId) -> Self {
        Self {
            caregiver_id: Some(caregiver_id),
            ..Self::default()
        }
    }
}

/// Repository interface for care window storage.
pub trait CareWindowRepository {
    fn create_care_window(&self, window: &CareWindow) -> RepoResult<CareWindowId>;
    /// Replaces every field of the window with the same id.
    fn update_care_window(&self, window: &CareWindow) -> RepoResult<()>;
    fn get_care_window(&self, id: CareWindowId) -> RepoResult<Option<CareWindow>>;
    fn list_care_windows(&self, query: &CareWindowQuery) -> RepoResult<Vec<CareWindow>>;
    /// Hard-deletes one window. Activities are left untouched.
    fn delete_care_window(&self, id: CareWindowId) -> RepoResult<()>;
}

/// SQLite-backed care window repository.
pub struct SqliteCareWindowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCareWindowRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CareWindowRepository for SqliteCareWindowRepository<'_> {
    fn create_care_window(&self, window: &CareWindow) -> RepoResult<CareWindowId> {
        window.validate()?;

        self.conn.execute(
            "INSERT INTO care_windows (
                uuid,
                caregiver_uuid,
                patient_uuid,
                weekday,
                start_time,
                end_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                window.id.to_string(),
                window.caregiver_id.to_string(),
                window.patient_id.to_string(),
                i64::from(window.weekday),
                window.start_time.to_string(),
                window.end_time.to_string(),
            ],
        )?;

        Ok(window.id)
    }

    fn update_care_window(&self, window: &CareWindow) -> RepoResult<()> {
        window.validate()?;

        let changed = self.conn.execute(
            "UPDATE care_windows
             SET
                caregiver_uuid = ?1,
                patient_uuid = ?2,
                weekday = ?3,
                start_time = ?4,
                end_time = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                window.caregiver_id.to_string(),
                window.patient_id.to_string(),
                i64::from(window.weekday),
                window.start_time.to_string(),
                window.end_time.to_string(),
                window.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(not_found(EntityKind::CareWindow, window.id));
        }

        Ok(())
    }

    fn get_care_window(&self, id: CareWindowId) -> RepoResult<Option<CareWindow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CARE_WINDOW_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_care_window_row(row)?));
        }

        Ok(None)
    }

    fn list_care_windows(&self, query: &CareWindowQuery) -> RepoResult<Vec<CareWindow>> {
        let mut sql = format!("{CARE_WINDOW_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(weekday) = query.weekday {
            sql.push_str(" AND weekday = ?");
            bind_values.push(Value::Integer(i64::from(weekday)));
        }
        if let Some(patient_id) = query.patient_id {
            sql.push_str(" AND patient_uuid = ?");
            bind_values.push(Value::Text(patient_id.to_string()));
        }
        if let Some(caregiver_id) = query.caregiver_id {
            sql.push_str(" AND caregiver_uuid = ?");
            bind_values.push(Value::Text(caregiver_id.to_string()));
        }

        sql.push_str(" ORDER BY weekday ASC, start_time ASC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut windows = Vec::new();

        while let Some(row) = rows.next()? {
            windows.push(parse_care_window_row(row)?);
        }

        Ok(windows)
    }

    fn delete_care_window(&self, id: CareWindowId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM care_windows WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(not_found(EntityKind::CareWindow, id));
        }

        Ok(())
    }
}

fn parse_care_window_row(row: &Row<'_>) -> RepoResult<CareWindow> {
    let weekday = match row.get::<_, i64>("weekday")? {
        value @ 0..=6 => value as u8,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid weekday `{other}` in care_windows.weekday"
            )));
        }
    };

    let start_text: String = row.get("start_time")?;
    let end_text: String = row.get("end_time")?;
    let start_time = validate_time_of_day(&start_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid time `{start_text}` in care_windows.start_time"
        ))
    })?;
    let end_time = validate_time_of_day(&end_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid time `{end_text}` in care_windows.end_time"))
    })?;

    let window = CareWindow {
        id: uuid_column(row, "care_windows", "uuid")?,
        caregiver_id: uuid_column(row, "care_windows", "caregiver_uuid")?,
        patient_id: uuid_column(row, "care_windows", "patient_uuid")?,
        weekday,
        start_time,
        end_time,
    };
    window.validate()?;
    Ok(window)
}

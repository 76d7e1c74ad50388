//! Activity persistence port and SQLite implementation.
//!
//! # Invariants
//! - Datetimes are stored as zone-less `YYYY-MM-DD HH:MM:SS` text, so text
//!   ordering matches chronological ordering.
//! - Listing order is deterministic: `start_datetime, uuid`.

use super::{ensure_connection_ready, not_found, uuid_column, RepoError, RepoResult};
use crate::error::EntityKind;
use crate::model::activity::{Activity, ActivityId};
use crate::model::directory::PatientId;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    uuid,
    patient_uuid,
    title,
    description,
    start_datetime,
    end_datetime
FROM activities";

/// Filter for listing activities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    pub patient_id: Option<PatientId>,
}

impl ActivityQuery {
    pub fn patient(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
        }
    }
}

/// Repository interface for activity storage.
pub trait ActivityRepository {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId>;
    fn update_activity(&self, activity: &Activity) -> RepoResult<()>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>>;
    fn list_activities(&self, query: &ActivityQuery) -> RepoResult<Vec<Activity>>;
    fn delete_activity(&self, id: ActivityId) -> RepoResult<()>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId> {
        ensure_ordered(activity)?;

        self.conn.execute(
            "INSERT INTO activities (
                uuid,
                patient_uuid,
                title,
                description,
                start_datetime,
                end_datetime
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                activity.id.to_string(),
                activity.patient_id.to_string(),
                activity.title.as_str(),
                activity.description.as_deref(),
                activity.start_datetime,
                activity.end_datetime,
            ],
        )?;

        Ok(activity.id)
    }

    fn update_activity(&self, activity: &Activity) -> RepoResult<()> {
        ensure_ordered(activity)?;

        let changed = self.conn.execute(
            "UPDATE activities
             SET
                patient_uuid = ?1,
                title = ?2,
                description = ?3,
                start_datetime = ?4,
                end_datetime = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                activity.patient_id.to_string(),
                activity.title.as_str(),
                activity.description.as_deref(),
                activity.start_datetime,
                activity.end_datetime,
                activity.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(not_found(EntityKind::Activity, activity.id));
        }

        Ok(())
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_activity_row(row)?));
        }

        Ok(None)
    }

    fn list_activities(&self, query: &ActivityQuery) -> RepoResult<Vec<Activity>> {
        let mut sql = format!("{ACTIVITY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(patient_id) = query.patient_id {
            sql.push_str(" AND patient_uuid = ?");
            bind_values.push(Value::Text(patient_id.to_string()));
        }

        sql.push_str(" ORDER BY start_datetime ASC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut activities = Vec::new();

        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }

        Ok(activities)
    }

    fn delete_activity(&self, id: ActivityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM activities WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(not_found(EntityKind::Activity, id));
        }

        Ok(())
    }
}

/// Storage-level sanity check; the scheduling rules live in the service.
fn ensure_ordered(activity: &Activity) -> RepoResult<()> {
    if activity.start_datetime > activity.end_datetime {
        return Err(RepoError::InvalidData(format!(
            "activity {} ends before it starts",
            activity.id
        )));
    }
    Ok(())
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let start_datetime: NaiveDateTime = row.get("start_datetime")?;
    let end_datetime: NaiveDateTime = row.get("end_datetime")?;

    let activity = Activity {
        id: uuid_column(row, "activities", "uuid")?,
        patient_id: uuid_column(row, "activities", "patient_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_datetime,
        end_datetime,
    };
    ensure_ordered(&activity)?;
    Ok(activity)
}

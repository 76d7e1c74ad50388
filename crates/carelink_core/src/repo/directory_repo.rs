//! Patients, users and medical records persistence.
//!
//! These are plain CRUD records; the scheduler only needs existence and role
//! lookups from them.

use super::{ensure_connection_ready, uuid_column, RepoError, RepoResult};
use crate::model::actor::{Role, UserId};
use crate::model::directory::{MedicalRecord, MedicalRecordId, Patient, PatientId, User};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT uuid, username, name, role, birthdate, contact FROM users";
const PATIENT_SELECT_SQL: &str = "SELECT uuid, name, birthdate FROM patients";
const RECORD_SELECT_SQL: &str =
    "SELECT uuid, patient_uuid, author_uuid, content, created_at FROM medical_records";

/// Repository interface for people and clinical records.
pub trait DirectoryRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Lists users ordered by username, optionally filtered by role.
    fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<User>>;
    /// Counts usernames starting with `prefix` (case-sensitive).
    fn count_usernames_with_prefix(&self, prefix: &str) -> RepoResult<u32>;

    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId>;
    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>>;
    /// Lists patients ordered by name.
    fn list_patients(&self) -> RepoResult<Vec<Patient>>;

    fn create_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecordId>;
    /// Lists records of one patient, oldest first.
    fn list_medical_records(&self, patient_id: PatientId) -> RepoResult<Vec<MedicalRecord>>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (uuid, username, name, role, birthdate, contact)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.name.as_str(),
                user.role.as_str(),
                user.birthdate,
                user.contact.as_deref(),
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(role) = role {
            sql.push_str(" AND role = ?");
            bind_values.push(Value::Text(role.as_str().to_string()));
        }
        sql.push_str(" ORDER BY username ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn count_usernames_with_prefix(&self, prefix: &str) -> RepoResult<u32> {
        // substr comparison avoids LIKE wildcard escaping for `_` and `%`.
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE substr(username, 1, length(?1)) = ?1;",
            [prefix],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId> {
        self.conn.execute(
            "INSERT INTO patients (uuid, name, birthdate) VALUES (?1, ?2, ?3);",
            params![patient.id.to_string(), patient.name.as_str(), patient.birthdate],
        )?;
        Ok(patient.id)
    }

    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATIENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_patient_row(row)?));
        }
        Ok(None)
    }

    fn list_patients(&self) -> RepoResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATIENT_SELECT_SQL} ORDER BY name ASC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }
        Ok(patients)
    }

    fn create_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecordId> {
        self.conn.execute(
            "INSERT INTO medical_records (uuid, patient_uuid, author_uuid, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id.to_string(),
                record.patient_id.to_string(),
                record.author_id.to_string(),
                record.content.as_str(),
                record.created_at,
            ],
        )?;
        Ok(record.id)
    }

    fn list_medical_records(&self, patient_id: PatientId) -> RepoResult<Vec<MedicalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL} WHERE patient_uuid = ?1 ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([patient_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(MedicalRecord {
                id: uuid_column(row, "medical_records", "uuid")?,
                patient_id: uuid_column(row, "medical_records", "patient_uuid")?,
                author_id: uuid_column(row, "medical_records", "author_uuid")?,
                content: row.get("content")?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(records)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    Ok(User {
        id: uuid_column(row, "users", "uuid")?,
        username: row.get("username")?,
        name: row.get("name")?,
        role,
        birthdate: row.get("birthdate")?,
        contact: row.get("contact")?,
    })
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<Patient> {
    Ok(Patient {
        id: uuid_column(row, "patients", "uuid")?,
        name: row.get("name")?,
        birthdate: row.get("birthdate")?,
    })
}

use carelink_core::db::open_db;
use carelink_core::{
    serialized_write, AuthContext, CareWindowInput, CareWindowRegistry, CoreError,
    DirectoryRepository, Patient, Role, SqliteCareWindowRepository, SqliteDirectoryRepository,
    User,
};
use rusqlite::Connection;
use std::time::Duration;

#[test]
fn committed_scope_persists_writes() {
    let conn = carelink_core::open_db_in_memory().unwrap();

    let inserted = serialized_write(&conn, || -> Result<u32, CoreError> {
        let directory = SqliteDirectoryRepository::try_new(&conn)?;
        directory.create_patient(&Patient::new("Joao Lima", None))?;
        directory.create_patient(&Patient::new("Rosa Dias", None))?;
        Ok(2)
    })
    .unwrap();

    assert_eq!(inserted, 2);
    assert_eq!(count(&conn, "patients"), 2);
}

#[test]
fn failed_scope_rolls_back_every_write() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let admin = User::new("admin", "Clinic Admin", Role::Admin);
    directory.create_user(&admin).unwrap();
    let caregiver = User::new("ana.souza1", "Ana Souza", Role::Caregiver);
    directory.create_user(&caregiver).unwrap();
    let patient = directory
        .create_patient(&Patient::new("Joao Lima", None))
        .unwrap();
    let ctx = AuthContext::admin(admin.id);

    // The second window overlaps the first, so the whole scope is undone.
    let result = serialized_write(&conn, || -> Result<_, CoreError> {
        let registry = CareWindowRegistry::new(
            SqliteCareWindowRepository::try_new(&conn)?,
            SqliteDirectoryRepository::try_new(&conn)?,
        );
        registry.create(window(patient, caregiver.id, "09:00", "10:00"), &ctx)?;
        registry.create(window(patient, caregiver.id, "09:30", "10:30"), &ctx)
    });

    assert!(matches!(result, Err(CoreError::Conflict(_))));
    assert_eq!(count(&conn, "care_windows"), 0);
}

#[test]
fn second_writer_cannot_enter_while_scope_is_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carelink.sqlite3");
    let first = open_db(&path).unwrap();
    let second = open_db(&path).unwrap();
    second.busy_timeout(Duration::from_millis(20)).unwrap();

    serialized_write(&first, || -> Result<(), CoreError> {
        let blocked = second.execute_batch("BEGIN IMMEDIATE;");
        assert!(blocked.is_err(), "write lock must be held by the open scope");
        Ok(())
    })
    .unwrap();

    second.execute_batch("BEGIN IMMEDIATE; COMMIT;").unwrap();
}

fn window(patient: uuid::Uuid, caregiver: uuid::Uuid, start: &str, end: &str) -> CareWindowInput {
    CareWindowInput {
        patient_id: Some(patient.to_string()),
        caregiver_id: Some(caregiver.to_string()),
        weekday: Some(1),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

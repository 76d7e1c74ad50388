use carelink_core::db::migrations::latest_version;
use carelink_core::db::{open_db, open_db_in_memory, DbError};
use carelink_core::{RepoError, SqliteCareWindowRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["users", "patients", "care_windows", "activities", "medical_records"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO activities (uuid, patient_uuid, title, start_datetime, end_datetime)
         VALUES ('a', 'missing-patient', 'Walk', '2030-03-11 09:00:00', '2030-03-11 10:00:00');",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn schema_rejects_inverted_window_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (uuid, username, name, role) VALUES ('c', 'ana.souza1', 'Ana Souza', 'CAREGIVER');
         INSERT INTO patients (uuid, name) VALUES ('p', 'Joao Lima');",
    )
    .unwrap();

    let inverted = conn.execute(
        "INSERT INTO care_windows (uuid, caregiver_uuid, patient_uuid, weekday, start_time, end_time)
         VALUES ('w', 'c', 'p', 1, '10:00', '09:00');",
        [],
    );
    assert!(inverted.is_err());

    let bad_weekday = conn.execute(
        "INSERT INTO care_windows (uuid, caregiver_uuid, patient_uuid, weekday, start_time, end_time)
         VALUES ('w', 'c', 'p', 7, '09:00', '10:00');",
        [],
    );
    assert!(bad_weekday.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carelink.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "care_windows");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteCareWindowRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

use carelink_core::repo::care_window_repo::CareWindowQuery;
use carelink_core::{
    AuthContext, AuthorizationError, CareWindowInput, CareWindowRegistry, CareWindowRepository,
    ConflictError, CoreError, DirectoryRepository, EntityKind, Patient, Role,
    SqliteCareWindowRepository, SqliteDirectoryRepository, User, UserId, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    admin: AuthContext,
    caregiver: UserId,
    patient: Uuid,
}

#[test]
fn admin_creates_window_and_it_is_persisted() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    let window = registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();

    let repo = SqliteCareWindowRepository::try_new(&conn).unwrap();
    let stored = repo.get_care_window(window.id).unwrap().unwrap();
    assert_eq!(stored, window);
    assert_eq!(stored.start_time.to_string(), "09:00");
}

#[test]
fn overlapping_window_for_same_caregiver_conflicts() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let other_patient = add_patient(&conn, "Rosa Dias");
    let registry = registry(&conn);

    let first = registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    let err = registry
        .create(input(other_patient, fx.caregiver, 1, "09:30", "10:30"), &fx.admin)
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Conflict(ConflictError::CareWindow(id)) if id == first.id
    ));
    assert_eq!(count_windows(&conn), 1);
}

#[test]
fn overlapping_window_for_same_patient_conflicts() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let second_caregiver = add_caregiver(&conn, "bia.rocha1");
    let registry = registry(&conn);

    registry
        .create(input(fx.patient, fx.caregiver, 3, "10:00", "11:00"), &fx.admin)
        .unwrap();
    let err = registry
        .create(input(fx.patient, second_caregiver, 3, "08:00", "12:00"), &fx.admin)
        .unwrap_err();

    assert!(matches!(err, CoreError::Conflict(ConflictError::CareWindow(_))));
}

#[test]
fn identical_ranges_for_unrelated_pairs_both_succeed() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let second_caregiver = add_caregiver(&conn, "bia.rocha1");
    let second_patient = add_patient(&conn, "Rosa Dias");
    let registry = registry(&conn);

    registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    registry
        .create(input(second_patient, second_caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();

    assert_eq!(count_windows(&conn), 2);
}

#[test]
fn touching_windows_and_other_weekdays_do_not_conflict() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    registry
        .create(input(fx.patient, fx.caregiver, 1, "10:00", "11:00"), &fx.admin)
        .unwrap();
    registry
        .create(input(fx.patient, fx.caregiver, 2, "09:30", "10:30"), &fx.admin)
        .unwrap();

    assert_eq!(count_windows(&conn), 3);
}

#[test]
fn updating_to_unchanged_range_does_not_self_conflict() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    let window = registry
        .create(input(fx.patient, fx.caregiver, 5, "14:00", "16:00"), &fx.admin)
        .unwrap();
    let same = registry
        .update(
            window.id,
            input(fx.patient, fx.caregiver, 5, "14:00", "16:00"),
            &fx.admin,
        )
        .unwrap();
    assert_eq!(same, window);

    let widened = registry
        .update(
            window.id,
            input(fx.patient, fx.caregiver, 5, "13:00", "17:00"),
            &fx.admin,
        )
        .unwrap();
    assert_eq!(widened.id, window.id);
    assert_eq!(widened.start_time.to_string(), "13:00");
}

#[test]
fn updating_into_another_window_conflicts_and_keeps_stored_row() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    let later = registry
        .create(input(fx.patient, fx.caregiver, 1, "12:00", "13:00"), &fx.admin)
        .unwrap();

    let err = registry
        .update(
            later.id,
            input(fx.patient, fx.caregiver, 1, "09:45", "12:30"),
            &fx.admin,
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let repo = SqliteCareWindowRepository::try_new(&conn).unwrap();
    assert_eq!(repo.get_care_window(later.id).unwrap().unwrap(), later);
}

#[test]
fn caregiver_cannot_mutate_windows() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);
    let as_caregiver = AuthContext::caregiver(fx.caregiver);

    let err = registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &as_caregiver)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Authorization(AuthorizationError::AdminRequired)
    ));

    let window = registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    assert!(matches!(
        registry.delete(window.id, &as_caregiver),
        Err(CoreError::Authorization(AuthorizationError::AdminRequired))
    ));
    assert_eq!(count_windows(&conn), 1);
}

#[test]
fn malformed_payloads_are_rejected_before_storage() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    let err = registry
        .create(
            CareWindowInput {
                patient_id: Some(fx.patient.to_string()),
                ..CareWindowInput::default()
            },
            &fx.admin,
        )
        .unwrap_err();
    match err {
        CoreError::MissingParams(fields) => {
            assert_eq!(fields, vec!["caregiverId", "startTime", "endTime", "weekday"]);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        registry.create(input(fx.patient, fx.caregiver, 7, "09:00", "10:00"), &fx.admin),
        Err(CoreError::Validation(ValidationError::InvalidWeekday(7)))
    ));
    assert!(matches!(
        registry.create(input(fx.patient, fx.caregiver, 1, "9:00", "10:00"), &fx.admin),
        Err(CoreError::Validation(ValidationError::InvalidTimeOfDay(_)))
    ));
    assert!(matches!(
        registry.create(input(fx.patient, fx.caregiver, 1, "10:00", "10:00"), &fx.admin),
        Err(CoreError::Validation(ValidationError::EmptyTimeRange { .. }))
    ));
    assert_eq!(count_windows(&conn), 0);
}

#[test]
fn unknown_or_non_caregiver_references_are_not_found() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    let missing_patient = Uuid::new_v4();
    assert!(matches!(
        registry.create(input(missing_patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin),
        Err(CoreError::NotFound { entity: EntityKind::Patient, id }) if id == missing_patient
    ));

    let admin_id = fx.admin.actor_id;
    assert!(matches!(
        registry.create(input(fx.patient, admin_id, 1, "09:00", "10:00"), &fx.admin),
        Err(CoreError::NotFound { entity: EntityKind::Caregiver, id }) if id == admin_id
    ));

    let missing_window = Uuid::new_v4();
    assert!(matches!(
        registry.update(
            missing_window,
            input(fx.patient, fx.caregiver, 1, "09:00", "10:00"),
            &fx.admin
        ),
        Err(CoreError::NotFound { entity: EntityKind::CareWindow, .. })
    ));
}

#[test]
fn pair_listing_is_limited_to_self_or_admin() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let other_caregiver = add_caregiver(&conn, "bia.rocha1");
    let registry = registry(&conn);

    registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    registry
        .create(input(fx.patient, fx.caregiver, 4, "09:00", "10:00"), &fx.admin)
        .unwrap();

    let own = registry
        .list_for_pair(fx.patient, fx.caregiver, &AuthContext::caregiver(fx.caregiver))
        .unwrap();
    assert_eq!(own.iter().map(|w| w.weekday).collect::<Vec<_>>(), vec![1, 4]);

    let err = registry
        .list_for_pair(fx.patient, fx.caregiver, &AuthContext::caregiver(other_caregiver))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Authorization(AuthorizationError::NotSelfOrAdmin { .. })
    ));

    let window_id = own[0].id;
    assert!(registry
        .get(window_id, &AuthContext::caregiver(other_caregiver))
        .is_err());
    assert_eq!(
        registry
            .get(window_id, &AuthContext::caregiver(fx.caregiver))
            .unwrap()
            .id,
        window_id
    );
}

#[test]
fn deleting_window_keeps_scheduled_activities() {
    let conn = carelink_core::open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let registry = registry(&conn);

    let window = registry
        .create(input(fx.patient, fx.caregiver, 1, "09:00", "10:00"), &fx.admin)
        .unwrap();
    conn.execute(
        "INSERT INTO activities (uuid, patient_uuid, title, start_datetime, end_datetime)
         VALUES (?1, ?2, 'Walk', '2030-03-11 09:15:00', '2030-03-11 09:45:00');",
        [Uuid::new_v4().to_string(), fx.patient.to_string()],
    )
    .unwrap();

    registry.delete(window.id, &fx.admin).unwrap();

    let repo = SqliteCareWindowRepository::try_new(&conn).unwrap();
    assert!(repo
        .list_care_windows(&CareWindowQuery::patient(fx.patient))
        .unwrap()
        .is_empty());
    let activities: i64 = conn
        .query_row("SELECT COUNT(*) FROM activities;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(activities, 1);
}

fn registry(
    conn: &Connection,
) -> CareWindowRegistry<SqliteCareWindowRepository<'_>, SqliteDirectoryRepository<'_>> {
    CareWindowRegistry::new(
        SqliteCareWindowRepository::try_new(conn).unwrap(),
        SqliteDirectoryRepository::try_new(conn).unwrap(),
    )
}

fn seed(conn: &Connection) -> Fixture {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();
    let admin = User::new("admin", "Clinic Admin", Role::Admin);
    directory.create_user(&admin).unwrap();

    Fixture {
        admin: AuthContext::admin(admin.id),
        caregiver: add_caregiver(conn, "ana.souza1"),
        patient: add_patient(conn, "Joao Lima"),
    }
}

fn add_caregiver(conn: &Connection, username: &str) -> UserId {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();
    let caregiver = User::new(username, username, Role::Caregiver);
    directory.create_user(&caregiver).unwrap()
}

fn add_patient(conn: &Connection, name: &str) -> Uuid {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();
    directory.create_patient(&Patient::new(name, None)).unwrap()
}

fn input(patient: Uuid, caregiver: Uuid, weekday: i64, start: &str, end: &str) -> CareWindowInput {
    CareWindowInput {
        patient_id: Some(patient.to_string()),
        caregiver_id: Some(caregiver.to_string()),
        weekday: Some(weekday),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
    }
}

fn count_windows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM care_windows;", [], |row| row.get(0))
        .unwrap()
}

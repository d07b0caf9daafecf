//! File-backed SQLite store and CSV import

use std::sync::Arc;

use hostrota::models::{CandidateId, EnrollmentStatus, SessionRecord};
use hostrota::notifications::MemoryNotifier;
use hostrota::scheduler::{HostRotation, PendingAction, ShiftDirection};
use hostrota::storage::{
    create_sqlite_repository, import_enrollments_csv, HostRecordRepository, ImportError,
    SqliteHostRepository,
};

fn session() -> SessionRecord {
    SessionRecord {
        id: "s1".to_string(),
        course_name: "Weekday Course".to_string(),
        teacher_id: "t1".to_string(),
        teacher_name: "Tess".to_string(),
        teacher_address: Some("9 Oak Ave".to_string()),
        teacher_phone: None,
        start_date: "2025-03-03".to_string(),
        end_date: "2025-03-14".to_string(),
        day_filter: Some("Tue, Thu".to_string()),
    }
}

const ROSTER: &str = "\u{feff}student_id,student_name,address,phone,can_host,status\n\
stu-1,\"Kim, Min\",\"12 Pine Rd, Apt 4\",555-0101,yes,active\n\
stu-2,Lee Ara,3 Elm St,,no,\n\
\n\
stu-3,Park Jun,,555-0103,maybe,active\n\
stu-4,Choi Eun,8 Birch Ln,555-0104,1,inactive\n\
stu-1,Kim Min (again),12 Pine Rd,,true,active\n";

#[test]
fn test_sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("rota.db");

    {
        let store = create_sqlite_repository(&path).unwrap();
        store.upsert_session(&session()).unwrap();
        import_enrollments_csv(store.as_ref(), "s1", ROSTER).unwrap();

        let mut rotation =
            HostRotation::load(store, Arc::new(MemoryNotifier::new()), "s1").unwrap();
        rotation.shift_all(ShiftDirection::Forward);
        rotation
            .confirm(PendingAction::MarkCancelled {
                date: chrono::NaiveDate::from_ymd_opt(2025, 3, 6).unwrap(),
            })
            .unwrap();
    }

    assert!(path.exists());
    let reopened = SqliteHostRepository::new(&path).unwrap();
    assert_eq!(reopened.get_session("s1").unwrap(), Some(session()));

    let first = chrono::NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
    assert_eq!(reopened.get_teacher_host_date("t1", "s1").unwrap(), Some(first));
    assert_eq!(reopened.cancelled_dates("s1").unwrap().len(), 1);

    let kim = reopened
        .list_active_enrollments("s1")
        .unwrap()
        .into_iter()
        .find(|e| e.student_id == "stu-1")
        .unwrap();
    assert_eq!(kim.host_date, Some(first));
}

#[test]
fn test_import_counts_and_failures() {
    let store = SqliteHostRepository::in_memory().unwrap();
    store.upsert_session(&session()).unwrap();

    let summary = import_enrollments_csv(&store, "s1", ROSTER).unwrap();

    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.failures.len(), 1);
    // the blank line still counts toward line numbers
    assert_eq!(summary.failures[0].line, 5);
    assert!(summary.failures[0].reason.contains("maybe"));
    assert_eq!(summary.processed(), 5);

    // inactive enrollments are not listed
    let active = store.list_active_enrollments("s1").unwrap();
    let names: Vec<&str> = active.iter().map(|e| e.student_name.as_str()).collect();
    assert_eq!(names, vec!["Kim, Min", "Lee Ara"]);

    let kim = &active[0];
    assert!(kim.can_host);
    assert_eq!(kim.address.as_deref(), Some("12 Pine Rd, Apt 4"));
    assert_eq!(kim.status, EnrollmentStatus::Active);

    let lee = &active[1];
    assert!(!lee.can_host);
    assert_eq!(lee.phone, None);
}

#[test]
fn test_import_rejects_unknown_session_and_bad_header() {
    let store = SqliteHostRepository::in_memory().unwrap();
    store.upsert_session(&session()).unwrap();

    let err = import_enrollments_csv(&store, "s9", ROSTER).unwrap_err();
    assert!(matches!(err, ImportError::UnknownSession(ref id) if id == "s9"));

    let err = import_enrollments_csv(&store, "s1", "student_id,student_name,address\n").unwrap_err();
    assert!(matches!(err, ImportError::MissingColumn(ref c) if c == "phone"));

    let err = import_enrollments_csv(&store, "s1", "\n\n").unwrap_err();
    assert!(matches!(err, ImportError::Empty));
}

#[test]
fn test_imported_rotation_hides_non_hosts() {
    let store = SqliteHostRepository::in_memory().unwrap();
    store.upsert_session(&session()).unwrap();
    import_enrollments_csv(&store, "s1", ROSTER).unwrap();

    let store: Arc<dyn HostRecordRepository> = Arc::new(store);
    let rotation = HostRotation::load(store, Arc::new(MemoryNotifier::new()), "s1").unwrap();

    let displayed = rotation.displayed();
    assert_eq!(displayed.len(), 2);
    assert!(displayed.iter().any(|c| c.id == CandidateId::teacher("t1")));
    assert!(displayed.iter().all(|c| c.display_name != "Lee Ara"));
    assert_eq!(rotation.dates().len(), 4);
}

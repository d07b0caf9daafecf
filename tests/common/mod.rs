//! Common test utilities

#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;

use hostrota::models::{EnrollmentRecord, EnrollmentStatus, SessionRecord};
use hostrota::notifications::MemoryNotifier;
use hostrota::scheduler::HostRotation;
use hostrota::storage::{HostRecordRepository, MockHostRepository, SqliteHostRepository};

pub const SESSION_ID: &str = "session-1";
pub const TEACHER_ID: &str = "teacher-row-1";

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Mondays and Wednesdays from 2025-01-06 to 2025-01-19: four meetings
pub fn create_test_session() -> SessionRecord {
    SessionRecord {
        id: SESSION_ID.to_string(),
        course_name: "Evening Bible Study".to_string(),
        teacher_id: TEACHER_ID.to_string(),
        teacher_name: "Tess Park".to_string(),
        teacher_address: Some("9 Oak Ave".to_string()),
        teacher_phone: Some("555-0199".to_string()),
        start_date: "2025-01-06".to_string(),
        end_date: "2025-01-19".to_string(),
        day_filter: Some("Monday, Wednesday".to_string()),
    }
}

/// Active enrollment willing to host
pub fn create_enrollment(id: &str, name: &str) -> EnrollmentRecord {
    EnrollmentRecord {
        id: id.to_string(),
        session_id: SESSION_ID.to_string(),
        student_id: format!("student-{id}"),
        student_name: name.to_string(),
        address: Some("12 Main St".to_string()),
        phone: None,
        status: EnrollmentStatus::Active,
        can_host: true,
        host_date: None,
    }
}

/// Session plus Ann, Bob and Cy (Cy does not host)
pub fn seed(repo: &dyn HostRecordRepository) {
    repo.upsert_session(&create_test_session()).unwrap();
    repo.upsert_enrollment(&create_enrollment("e-ann", "Ann")).unwrap();
    repo.upsert_enrollment(&create_enrollment("e-bob", "Bob")).unwrap();

    let mut cy = create_enrollment("e-cy", "Cy");
    cy.can_host = false;
    repo.upsert_enrollment(&cy).unwrap();
}

pub fn seeded_mock() -> Arc<MockHostRepository> {
    let repo = Arc::new(MockHostRepository::new());
    seed(repo.as_ref());
    repo
}

pub fn seeded_sqlite() -> Arc<SqliteHostRepository> {
    let repo = Arc::new(SqliteHostRepository::in_memory().unwrap());
    seed(repo.as_ref());
    repo
}

/// Both store implementations, seeded identically
pub fn seeded_stores() -> Vec<Arc<dyn HostRecordRepository>> {
    vec![seeded_sqlite(), seeded_mock()]
}

pub fn load_rotation(store: Arc<dyn HostRecordRepository>) -> (HostRotation, Arc<MemoryNotifier>) {
    let sink = Arc::new(MemoryNotifier::new());
    let rotation = HostRotation::load(store, sink.clone(), SESSION_ID).unwrap();
    (rotation, sink)
}

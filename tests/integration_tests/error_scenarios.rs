//! Failure handling: injected write errors, unknown ids, missing sessions

use std::sync::Arc;

use hostrota::models::CandidateId;
use hostrota::notifications::{MemoryNotifier, NotificationLevel};
use hostrota::scheduler::{
    AssignRequest, HostRotation, PendingAction, SchedulerError, ShiftDirection,
};
use hostrota::storage::HostRecordRepository;

use crate::common::{d, load_rotation, seeded_mock, SESSION_ID, TEACHER_ID};

#[test]
fn test_partial_failure_keeps_memory_in_sync() {
    let store = seeded_mock();
    let (mut rotation, sink) = load_rotation(store.clone());
    store.fail_writes_for("e-bob");

    let report = rotation.shift_all(ShiftDirection::Forward);

    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "e-bob");
    assert!(report.failures[0].reason.contains("Injected write failure"));
    assert!(!report.is_complete());

    // failed candidate keeps its old date in memory and in the store
    assert_eq!(rotation.assignments().get(&CandidateId::enrollment("e-bob")), None);
    assert_eq!(
        rotation.assignments().get(&CandidateId::enrollment("e-ann")),
        Some(d(2025, 1, 6))
    );

    // one error per failed write, no success summary
    assert_eq!(sink.count(NotificationLevel::Error), 1);
    assert_eq!(sink.count(NotificationLevel::Success), 0);
}

#[test]
fn test_retry_after_failure_cleared() {
    let store = seeded_mock();
    let (mut rotation, sink) = load_rotation(store.clone());
    store.fail_writes_for("e-ann");

    let ann = CandidateId::enrollment("e-ann");
    rotation.request_assign(&ann, Some(d(2025, 1, 13))).unwrap();
    assert_eq!(rotation.assignments().get(&ann), None);

    store.clear_failures();
    sink.take();
    rotation.request_assign(&ann, Some(d(2025, 1, 13))).unwrap();
    assert_eq!(rotation.assignments().get(&ann), Some(d(2025, 1, 13)));
    assert_eq!(sink.count(NotificationLevel::Success), 1);
}

#[test]
fn test_teacher_write_failure() {
    let store = seeded_mock();
    let (mut rotation, sink) = load_rotation(store.clone());
    store.fail_writes_for(TEACHER_ID);

    let teacher = CandidateId::teacher(TEACHER_ID);
    rotation.request_assign(&teacher, Some(d(2025, 1, 6))).unwrap();

    assert_eq!(rotation.assignments().get(&teacher), None);
    assert_eq!(store.get_teacher_host_date(TEACHER_ID, SESSION_ID).unwrap(), None);
    assert_eq!(sink.count(NotificationLevel::Error), 1);
}

#[test]
fn test_mark_failure_leaves_date_open() {
    let store = seeded_mock();
    let (mut rotation, sink) = load_rotation(store.clone());
    for id in ["e-ann", "e-bob", "e-cy"] {
        store.fail_writes_for(id);
    }

    let report = rotation
        .confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) })
        .unwrap();

    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.records_affected, 0);
    assert!(rotation.cancelled_dates().is_empty());
    assert!(store.cancelled_dates(SESSION_ID).unwrap().is_empty());
    assert_eq!(sink.count(NotificationLevel::Error), 3);
}

#[test]
fn test_partial_mark_matches_store() {
    let store = seeded_mock();
    let (mut rotation, sink) = load_rotation(store.clone());
    store.fail_writes_for("e-bob");

    let report = rotation
        .confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) })
        .unwrap();

    assert_eq!(report.records_affected, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "e-bob");
    assert!(rotation.cancelled_dates().contains(&d(2025, 1, 8)));
    assert_eq!(
        store.cancelled_dates(SESSION_ID).unwrap(),
        rotation.cancelled_dates().clone()
    );
    assert_eq!(sink.count(NotificationLevel::Error), 1);

    let ann = CandidateId::enrollment("e-ann");
    let request = rotation.request_assign(&ann, Some(d(2025, 1, 8))).unwrap();
    assert!(matches!(request, AssignRequest::NeedsConfirmation(_)));

    store.clear_failures();
    let report = rotation
        .confirm(PendingAction::UnmarkCancelled { date: d(2025, 1, 8) })
        .unwrap();
    assert_eq!(report.records_affected, 2);
    assert!(store.cancelled_dates(SESSION_ID).unwrap().is_empty());
}

#[test]
fn test_unknown_candidate() {
    let store = seeded_mock();
    let (mut rotation, _) = load_rotation(store);

    let ghost = CandidateId::enrollment("e-ghost");
    let err = rotation.request_assign(&ghost, Some(d(2025, 1, 6))).unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownCandidate { .. }));

    let err = rotation.set_can_host(&ghost, false).unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownCandidate { .. }));
}

#[test]
fn test_teacher_can_host_is_immutable() {
    let store = seeded_mock();
    let (mut rotation, _) = load_rotation(store);

    let err = rotation
        .set_can_host(&CandidateId::teacher(TEACHER_ID), false)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::TeacherHostImmutable { .. }));
}

#[test]
fn test_can_host_failure_keeps_flag() {
    let store = seeded_mock();
    let (mut rotation, sink) = load_rotation(store.clone());
    store.fail_writes_for("e-bob");

    let bob = CandidateId::enrollment("e-bob");
    let report = rotation.set_can_host(&bob, false).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(rotation.displayed().iter().any(|c| c.id == bob));
    assert_eq!(sink.count(NotificationLevel::Error), 1);
}

#[test]
fn test_missing_session() {
    let store = seeded_mock();
    let sink = Arc::new(MemoryNotifier::new());
    let err = HostRotation::load(store, sink, "no-such-session").unwrap_err();
    assert!(matches!(err, SchedulerError::SessionNotFound { .. }));
}

#[test]
fn test_external_write_marks_view_stale() {
    let store = seeded_mock();
    let (mut rotation, _) = load_rotation(store.clone());

    // our own writes do not count
    rotation.shift_all(ShiftDirection::Forward);
    assert_eq!(rotation.poll_changes(), 0);
    assert!(!rotation.is_stale());

    store.set_enrollment_host_date("e-ann", Some(d(2025, 1, 15))).unwrap();
    assert_eq!(rotation.poll_changes(), 1);
    assert!(rotation.is_stale());

    rotation.reload().unwrap();
    assert!(!rotation.is_stale());
    assert_eq!(
        rotation.assignments().get(&CandidateId::enrollment("e-ann")),
        Some(d(2025, 1, 15))
    );
}

#[test]
fn test_foreign_write_during_own_operation_is_not_swallowed() {
    let store = seeded_mock();
    let (mut rotation, _) = load_rotation(store.clone());

    store.set_enrollment_host_date("e-bob", Some(d(2025, 1, 13))).unwrap();
    let ann = CandidateId::enrollment("e-ann");
    rotation.request_assign(&ann, Some(d(2025, 1, 8))).unwrap();

    assert!(rotation.poll_changes() > 0);
    assert!(rotation.is_stale());

    rotation.reload().unwrap();
    assert_eq!(
        rotation.assignments().get(&CandidateId::enrollment("e-bob")),
        Some(d(2025, 1, 13))
    );
    assert_eq!(rotation.assignments().get(&ann), Some(d(2025, 1, 8)));
}

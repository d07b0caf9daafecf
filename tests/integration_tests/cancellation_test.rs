//! Cancelled-date markers, confirmation gate and audit trail

use hostrota::models::CandidateId;
use hostrota::notifications::NotificationLevel;
use hostrota::scheduler::{AssignRequest, PendingAction, SchedulerError};
use hostrota::storage::HostRecordRepository;

use crate::common::{d, load_rotation, seeded_stores, SESSION_ID};

#[test]
fn test_mark_writes_one_marker_per_enrollment() {
    for store in seeded_stores() {
        let (mut rotation, sink) = load_rotation(store.clone());
        let pending = rotation.request_mark_cancelled(d(2025, 1, 8));
        assert_eq!(pending, PendingAction::MarkCancelled { date: d(2025, 1, 8) });

        // nothing happens before confirmation
        assert!(store.cancelled_dates(SESSION_ID).unwrap().is_empty());

        let report = rotation.confirm(pending).unwrap();
        // Ann, Bob and Cy, whether or not they host
        assert_eq!(report.records_affected, 3);
        assert!(rotation.cancelled_dates().contains(&d(2025, 1, 8)));
        assert!(store
            .cancelled_dates(SESSION_ID)
            .unwrap()
            .contains(&d(2025, 1, 8)));
        assert_eq!(sink.count(NotificationLevel::Success), 1);
    }
}

#[test]
fn test_mark_twice_keeps_one_marker_per_enrollment() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) }).unwrap();
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) }).unwrap();

        let removed = store.unmark_date_cancelled(SESSION_ID, d(2025, 1, 8)).unwrap();
        assert_eq!(removed.len(), 3);
    }
}

#[test]
fn test_unmark_writes_audit_entry_per_marker() {
    for store in seeded_stores() {
        let (mut rotation, sink) = load_rotation(store.clone());
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 13) }).unwrap();
        sink.take();

        let pending = rotation.request_unmark_cancelled(d(2025, 1, 13));
        let report = rotation.confirm(pending).unwrap();
        assert_eq!(report.records_affected, 3);
        assert!(report.is_complete());
        assert!(rotation.cancelled_dates().is_empty());
        assert!(store.cancelled_dates(SESSION_ID).unwrap().is_empty());

        let audit = store.list_audit(10).unwrap();
        assert_eq!(audit.len(), 3);
        for entry in &audit {
            assert_eq!(entry.action, "delete");
            assert_eq!(entry.table_name, "attendance");
            let details = entry.details.as_deref().unwrap();
            assert!(details.contains("SESSION_CANCELLED"));
            assert!(details.contains("2025-01-13"));
        }
        assert_eq!(sink.count(NotificationLevel::Success), 1);
    }
}

#[test]
fn test_unmark_of_open_date_is_stale() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        let err = rotation
            .confirm(PendingAction::UnmarkCancelled { date: d(2025, 1, 6) })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::StaleConfirmation { .. }));
        assert!(store.list_audit(10).unwrap().is_empty());
    }
}

#[test]
fn test_assign_onto_cancelled_date_waits_for_confirmation() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) }).unwrap();

        let ann = CandidateId::enrollment("e-ann");
        let request = rotation.request_assign(&ann, Some(d(2025, 1, 8))).unwrap();
        let pending = match request {
            AssignRequest::NeedsConfirmation(pending) => pending,
            other => panic!("expected confirmation, got {other:?}"),
        };
        assert_eq!(rotation.assignments().get(&ann), None);

        let report = rotation.confirm(pending).unwrap();
        assert_eq!(report.applied.len(), 1);
        assert_eq!(rotation.assignments().get(&ann), Some(d(2025, 1, 8)));

        let ann_record = store
            .list_active_enrollments(SESSION_ID)
            .unwrap()
            .into_iter()
            .find(|e| e.id == "e-ann")
            .unwrap();
        assert_eq!(ann_record.host_date, Some(d(2025, 1, 8)));
    }
}

#[test]
fn test_clearing_never_needs_confirmation() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) }).unwrap();

        let bob = CandidateId::enrollment("e-bob");
        let request = rotation.request_assign(&bob, None).unwrap();
        assert!(matches!(request, AssignRequest::Applied(ref r) if r.is_noop()));
    }
}

#[test]
fn test_grid_flags_cancelled_date() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 15) }).unwrap();

        let grid = rotation.grid();
        assert!(grid.day(d(2025, 1, 15)).unwrap().cancelled);
        assert!(!grid.day(d(2025, 1, 13)).unwrap().cancelled);

        // a fresh load sees the marker too
        let (reloaded, _) = load_rotation(store);
        assert!(reloaded.cancelled_dates().contains(&d(2025, 1, 15)));
    }
}

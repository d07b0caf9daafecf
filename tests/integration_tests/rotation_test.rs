//! Rotation operations persisted through both store implementations

use hostrota::models::CandidateId;
use hostrota::scheduler::{AssignRequest, DisplayFilter, IssueKind, IssueLevel, ShiftDirection};
use hostrota::storage::HostRecordRepository;

use crate::common::{d, load_rotation, seeded_stores, SESSION_ID, TEACHER_ID};

fn ann() -> CandidateId {
    CandidateId::enrollment("e-ann")
}

fn bob() -> CandidateId {
    CandidateId::enrollment("e-bob")
}

fn teacher() -> CandidateId {
    CandidateId::teacher(TEACHER_ID)
}

#[test]
fn test_displayed_order_and_filter() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        assert_eq!(
            rotation.dates(),
            &[d(2025, 1, 6), d(2025, 1, 8), d(2025, 1, 13), d(2025, 1, 15)]
        );

        rotation.request_assign(&bob(), Some(d(2025, 1, 6))).unwrap();
        let names: Vec<String> = rotation
            .displayed()
            .into_iter()
            .map(|c| c.display_name)
            .collect();
        // assigned first, then unassigned by name; Cy cannot host
        assert_eq!(names, vec!["Bob", "Ann", "Tess Park"]);

        rotation.set_display_filter(DisplayFilter::All);
        assert_eq!(rotation.displayed().len(), 4);
    }
}

#[test]
fn test_shift_forward_from_unassigned_lands_on_first_date() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        let report = rotation.shift_all(ShiftDirection::Forward);

        assert_eq!(report.applied.len(), 3);
        assert!(report.is_complete());
        for candidate in rotation.displayed() {
            assert_eq!(candidate.assigned_date, Some(d(2025, 1, 6)));
        }
        // Cy is not displayed and keeps no date
        assert_eq!(rotation.assignments().get(&CandidateId::enrollment("e-cy")), None);

        // persisted, including the teacher row
        assert_eq!(
            store.get_teacher_host_date(TEACHER_ID, SESSION_ID).unwrap(),
            Some(d(2025, 1, 6))
        );
    }
}

#[test]
fn test_shift_forward_clamps_on_last_date() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        rotation.request_assign(&ann(), Some(d(2025, 1, 15))).unwrap();

        rotation.shift_all(ShiftDirection::Forward);
        assert_eq!(rotation.assignments().get(&ann()), Some(d(2025, 1, 15)));

        rotation.shift_all(ShiftDirection::Backward);
        assert_eq!(rotation.assignments().get(&ann()), Some(d(2025, 1, 13)));
    }
}

#[test]
fn test_shift_treats_off_window_date_as_unassigned() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        // a Tuesday, not a meeting date
        rotation.request_assign(&ann(), Some(d(2025, 1, 7))).unwrap();

        rotation.shift_all(ShiftDirection::Backward);
        assert_eq!(rotation.assignments().get(&ann()), Some(d(2025, 1, 15)));
    }
}

#[test]
fn test_duplicate_date_reported_once() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        rotation.request_assign(&ann(), Some(d(2025, 1, 8))).unwrap();
        rotation.request_assign(&bob(), Some(d(2025, 1, 8))).unwrap();

        let report = rotation.validate();
        let duplicates: Vec<_> = report.issues_of(IssueKind::DuplicateDate).collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].level, IssueLevel::Error);
        assert_eq!(duplicates[0].date, Some(d(2025, 1, 8)));
        assert!(duplicates[0].candidates.contains(&ann()));
        assert!(duplicates[0].candidates.contains(&bob()));

        let grid = rotation.grid();
        assert!(grid.day(d(2025, 1, 8)).unwrap().has_conflict());
    }
}

#[test]
fn test_quick_fix_keeps_first_in_display_order() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        rotation.request_assign(&ann(), Some(d(2025, 1, 8))).unwrap();
        rotation.request_assign(&bob(), Some(d(2025, 1, 8))).unwrap();
        rotation.request_assign(&teacher(), Some(d(2025, 1, 8))).unwrap();

        let first = rotation.quick_fix();
        assert_eq!(first.applied.len(), 2);
        assert_eq!(rotation.assignments().get(&ann()), Some(d(2025, 1, 8)));
        assert_eq!(rotation.assignments().get(&bob()), None);
        assert_eq!(rotation.assignments().get(&teacher()), None);

        let second = rotation.quick_fix();
        assert!(second.is_noop());
    }
}

#[test]
fn test_coverage_counts_dates_before_first_assignment() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store);
        rotation.request_assign(&ann(), Some(d(2025, 1, 13))).unwrap();

        let coverage = rotation.validate().coverage;
        assert_eq!(coverage.window_size, 4);
        assert_eq!(coverage.covered, 3);
        assert_eq!(coverage.remaining, 1);
    }
}

#[test]
fn test_reload_reads_back_persisted_state() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        rotation.shift_all(ShiftDirection::Forward);
        rotation.shift_all(ShiftDirection::Forward);

        let (reloaded, _) = load_rotation(store);
        assert_eq!(reloaded.assignments(), rotation.assignments());
    }
}

#[test]
fn test_assign_clear_removes_teacher_row() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        rotation.request_assign(&teacher(), Some(d(2025, 1, 6))).unwrap();

        let request = rotation.request_assign(&teacher(), None).unwrap();
        assert!(matches!(request, AssignRequest::Applied(ref r) if r.records_affected == 1));
        assert_eq!(store.get_teacher_host_date(TEACHER_ID, SESSION_ID).unwrap(), None);
    }
}

#[test]
fn test_clear_all_only_after_confirm() {
    for store in seeded_stores() {
        let (mut rotation, _) = load_rotation(store.clone());
        rotation.shift_all(ShiftDirection::Forward);

        let pending = rotation.request_clear_all();
        assert_eq!(rotation.assignments().assigned_count(), 3);

        let report = rotation.confirm(pending).unwrap();
        assert_eq!(report.applied.len(), 3);
        assert_eq!(rotation.assignments().assigned_count(), 0);
        assert!(store
            .list_active_enrollments(SESSION_ID)
            .unwrap()
            .iter()
            .all(|e| e.host_date.is_none()));
    }
}

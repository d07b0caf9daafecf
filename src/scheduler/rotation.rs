//! Host rotation controller
//!
//! [`HostRotation`] owns the in-memory view of one session: the expanded
//! meeting dates, the candidates, the assignment map and the cancelled
//! dates. Every mutation is planned with the pure functions in
//! [`assignment`](super::assignment), then persisted change by change
//! through the record store. A change is applied to the in-memory map only
//! after its write succeeded, so the returned [`OperationReport`] always
//! matches what the store holds.
//!
//! Destructive operations do not run directly. They return a
//! [`PendingAction`] that must be handed back to [`HostRotation::confirm`].

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::assignment::{
    plan_clear_all, plan_quick_fix, plan_shift_all, sort_for_display, AssignmentChange,
    AssignmentMap, ShiftDirection,
};
use super::calendar::{format_date, CalendarWindow};
use super::error::{SchedulerError, SchedulerResult};
use super::grid::{self, CalendarGrid};
use super::validation::{self, ValidationReport};
use crate::i18n::t;
use crate::models::{AuditEntry, CandidateId, HostCandidate, SessionRecord};
use crate::notifications::{Notification, SharedNotifier};
use crate::storage::events::StoreEvent;
use crate::storage::repository::SharedHostRepository;

// ============================================================================
// Display filter
// ============================================================================

/// Which candidates take part in bulk operations and views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFilter {
    /// Only candidates willing to host (the teacher always is)
    #[default]
    CanHostOnly,
    All,
}

impl DisplayFilter {
    fn admits(&self, candidate: &HostCandidate) -> bool {
        match self {
            Self::CanHostOnly => candidate.can_host,
            Self::All => true,
        }
    }
}

// ============================================================================
// Confirmation gate
// ============================================================================

/// An operation waiting for explicit confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PendingAction {
    /// Assign a candidate to a date marked as not held
    AssignOntoCancelled {
        candidate_id: CandidateId,
        date: NaiveDate,
    },
    /// Clear every displayed candidate's date
    ClearAll,
    /// Mark a date as not held
    MarkCancelled { date: NaiveDate },
    /// Remove the not-held markers of a date
    UnmarkCancelled { date: NaiveDate },
}

impl PendingAction {
    /// Question to put to the user
    pub fn describe(&self) -> String {
        match self {
            Self::AssignOntoCancelled { candidate_id, date } => format!(
                "{} is marked as cancelled. Assign '{}' anyway?",
                format_date(*date),
                candidate_id
            ),
            Self::ClearAll => "Clear the host date of every displayed candidate?".to_string(),
            Self::MarkCancelled { date } => {
                format!("Mark {} as not held for every enrollment?", format_date(*date))
            }
            Self::UnmarkCancelled { date } => format!(
                "Remove the cancellation of {}? The markers are deleted and audited.",
                format_date(*date)
            ),
        }
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Outcome of an assignment request
#[derive(Debug, Clone, PartialEq)]
pub enum AssignRequest {
    Applied(OperationReport),
    NeedsConfirmation(PendingAction),
}

// ============================================================================
// Reports
// ============================================================================

/// A write that did not reach the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistFailure {
    /// Candidate id, date or record id the write was for
    pub target: String,
    pub reason: String,
}

/// Per-candidate result of a mutating operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    /// Changes that were persisted and applied in memory
    pub applied: Vec<AssignmentChange>,
    pub failures: Vec<PersistFailure>,
    /// Store rows written or deleted
    pub records_affected: usize,
}

impl OperationReport {
    /// True when no write failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when nothing was written and nothing failed
    pub fn is_noop(&self) -> bool {
        self.records_affected == 0 && self.failures.is_empty()
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Session view plus the operations that mutate it
pub struct HostRotation {
    store: SharedHostRepository,
    notifier: SharedNotifier,
    session: SessionRecord,
    window: Option<CalendarWindow>,
    dates: Vec<NaiveDate>,
    candidates: Vec<HostCandidate>,
    assignments: AssignmentMap,
    cancelled: BTreeSet<NaiveDate>,
    filter: DisplayFilter,
    changes: broadcast::Receiver<StoreEvent>,
    /// Events our own writes are expected to publish
    own_writes: Vec<StoreEvent>,
    /// Foreign events seen while settling our own writes
    pending_foreign: usize,
    stale: bool,
}

impl HostRotation {
    /// Load the view of a session from the store
    pub fn load(
        store: SharedHostRepository,
        notifier: SharedNotifier,
        session_id: &str,
    ) -> SchedulerResult<Self> {
        // Subscribe first so writes racing the reads still mark the view stale
        let changes = store.subscribe();
        let session = store
            .get_session(session_id)
            .map_err(|e| SchedulerError::store_read("get_session", e.to_string()))?
            .ok_or_else(|| SchedulerError::session_not_found(session_id))?;

        let mut rotation = Self {
            store,
            notifier,
            window: None,
            dates: Vec::new(),
            candidates: Vec::new(),
            assignments: AssignmentMap::new(),
            cancelled: BTreeSet::new(),
            filter: DisplayFilter::default(),
            changes,
            own_writes: Vec::new(),
            pending_foreign: 0,
            stale: false,
            session,
        };
        rotation.read_view()?;
        Ok(rotation)
    }

    /// Re-read the whole view from the store
    pub fn reload(&mut self) -> SchedulerResult<()> {
        self.discard_changes();
        let session = self
            .store
            .get_session(&self.session.id)
            .map_err(|e| SchedulerError::store_read("get_session", e.to_string()))?
            .ok_or_else(|| SchedulerError::session_not_found(self.session.id.clone()))?;
        self.session = session;
        self.read_view()
    }

    fn read_view(&mut self) -> SchedulerResult<()> {
        let session = &self.session;
        let enrollments = self
            .store
            .list_active_enrollments(&session.id)
            .map_err(|e| SchedulerError::store_read("list_active_enrollments", e.to_string()))?;
        let teacher_date = self
            .store
            .get_teacher_host_date(&session.teacher_id, &session.id)
            .map_err(|e| SchedulerError::store_read("get_teacher_host_date", e.to_string()))?;
        let cancelled = self
            .store
            .cancelled_dates(&session.id)
            .map_err(|e| SchedulerError::store_read("cancelled_dates", e.to_string()))?;

        let window = CalendarWindow::from_session(session);
        if window.is_none() {
            tracing::warn!(
                session_id = %session.id,
                start = %session.start_date,
                end = %session.end_date,
                "Session window could not be parsed; no meeting dates"
            );
        }

        let mut candidates = Vec::with_capacity(enrollments.len() + 1);
        candidates.push(HostCandidate::teacher(session, teacher_date));
        candidates.extend(enrollments.iter().map(HostCandidate::from_enrollment));

        self.dates = window.as_ref().map(CalendarWindow::dates).unwrap_or_default();
        self.window = window;
        self.assignments = AssignmentMap::from_candidates(&candidates);
        self.candidates = candidates;
        self.cancelled = cancelled;
        self.stale = false;

        tracing::debug!(
            session_id = %self.session.id,
            candidates = self.candidates.len(),
            dates = self.dates.len(),
            cancelled = self.cancelled.len(),
            "Loaded host rotation view"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn window(&self) -> Option<&CalendarWindow> {
        self.window.as_ref()
    }

    /// Meeting dates of the session, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn cancelled_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.cancelled
    }

    pub fn assignments(&self) -> &AssignmentMap {
        &self.assignments
    }

    pub fn display_filter(&self) -> DisplayFilter {
        self.filter
    }

    pub fn set_display_filter(&mut self, filter: DisplayFilter) {
        self.filter = filter;
    }

    /// Every candidate with its current date, unfiltered and unsorted
    pub fn candidates(&self) -> Vec<HostCandidate> {
        self.candidates
            .iter()
            .map(|c| HostCandidate {
                assigned_date: self.assignments.get(&c.id),
                ..c.clone()
            })
            .collect()
    }

    /// Candidates passing the display filter, in display order
    pub fn displayed(&self) -> Vec<HostCandidate> {
        let mut shown: Vec<HostCandidate> = self
            .candidates()
            .into_iter()
            .filter(|c| self.filter.admits(c))
            .collect();
        sort_for_display(&mut shown);
        shown
    }

    fn displayed_ids(&self) -> Vec<CandidateId> {
        self.displayed().into_iter().map(|c| c.id).collect()
    }

    fn find(&self, id: &CandidateId) -> SchedulerResult<&HostCandidate> {
        self.candidates
            .iter()
            .find(|c| c.id == *id)
            .ok_or_else(|| SchedulerError::unknown_candidate(id.as_str()))
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.displayed(), &self.dates)
    }

    pub fn grid(&self) -> CalendarGrid {
        grid::project(&self.displayed(), &self.dates, &self.cancelled)
    }

    // ------------------------------------------------------------------------
    // Change feed
    // ------------------------------------------------------------------------

    /// Count store writes to this session made by someone else
    ///
    /// Any such write marks the view stale; call [`reload`](Self::reload)
    /// to refresh it.
    pub fn poll_changes(&mut self) -> usize {
        let seen = self.drain_foreign() + std::mem::take(&mut self.pending_foreign);
        if seen > 0 {
            tracing::info!(session_id = %self.session.id, events = seen, "Session changed in store");
            self.stale = true;
        }
        seen
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn expect_event(&mut self, event: StoreEvent) {
        self.own_writes.push(event);
    }

    /// Drain the feed, matching events against our own writes
    ///
    /// Returns the number of events for this session that no own write
    /// accounts for. Lagged events cannot be matched and count as foreign.
    fn drain_foreign(&mut self) -> usize {
        let mut foreign = 0;
        loop {
            match self.changes.try_recv() {
                Ok(event) if event.session_id() == self.session.id => {
                    match self.own_writes.iter().position(|own| *own == event) {
                        Some(pos) => {
                            self.own_writes.swap_remove(pos);
                        }
                        None => foreign += 1,
                    }
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => foreign += skipped as usize,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        foreign
    }

    /// Consume the events of an operation's own writes
    ///
    /// Foreign events interleaved with them are kept for the next
    /// [`poll_changes`](Self::poll_changes) and mark the view stale now.
    fn settle_changes(&mut self) {
        let foreign = self.drain_foreign();
        self.own_writes.clear();
        if foreign > 0 {
            tracing::info!(session_id = %self.session.id, events = foreign, "Foreign writes seen during operation");
            self.pending_foreign += foreign;
            self.stale = true;
        }
    }

    /// Drop everything queued; the caller is about to re-read the store
    fn discard_changes(&mut self) {
        while !matches!(
            self.changes.try_recv(),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed)
        ) {}
        self.own_writes.clear();
        self.pending_foreign = 0;
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Set or clear one candidate's date
    ///
    /// Assigning onto a cancelled date needs confirmation and changes
    /// nothing until confirmed.
    pub fn request_assign(
        &mut self,
        id: &CandidateId,
        date: Option<NaiveDate>,
    ) -> SchedulerResult<AssignRequest> {
        self.find(id)?;

        if let Some(date) = date.filter(|d| self.cancelled.contains(d)) {
            return Ok(AssignRequest::NeedsConfirmation(
                PendingAction::AssignOntoCancelled {
                    candidate_id: id.clone(),
                    date,
                },
            ));
        }

        let change = self.assignments.plan(id, date);
        Ok(AssignRequest::Applied(self.persist_changes("assign", vec![change])))
    }

    /// Clearing every date always needs confirmation
    pub fn request_clear_all(&self) -> PendingAction {
        PendingAction::ClearAll
    }

    pub fn request_mark_cancelled(&self, date: NaiveDate) -> PendingAction {
        PendingAction::MarkCancelled { date }
    }

    pub fn request_unmark_cancelled(&self, date: NaiveDate) -> PendingAction {
        PendingAction::UnmarkCancelled { date }
    }

    /// Run a previously requested action
    pub fn confirm(&mut self, action: PendingAction) -> SchedulerResult<OperationReport> {
        tracing::info!(session_id = %self.session.id, action = ?action, "Confirmed action");

        match action {
            PendingAction::AssignOntoCancelled { candidate_id, date } => {
                self.find(&candidate_id)?;
                let change = self.assignments.plan(&candidate_id, Some(date));
                Ok(self.persist_changes("assign", vec![change]))
            }
            PendingAction::ClearAll => {
                let changes = plan_clear_all(&self.displayed_ids(), &self.assignments);
                Ok(self.persist_changes("clear_all", changes))
            }
            PendingAction::MarkCancelled { date } => Ok(self.mark_cancelled(date)),
            PendingAction::UnmarkCancelled { date } => {
                if !self.cancelled.contains(&date) {
                    return Err(SchedulerError::stale_confirmation(format!(
                        "{} is not marked as cancelled",
                        format_date(date)
                    )));
                }
                Ok(self.unmark_cancelled(date))
            }
        }
    }

    /// Move every displayed candidate one meeting forward or backward
    pub fn shift_all(&mut self, direction: ShiftDirection) -> OperationReport {
        let changes = plan_shift_all(
            &self.displayed_ids(),
            &self.assignments,
            &self.dates,
            direction,
        );
        self.persist_changes(direction.as_str(), changes)
    }

    /// Keep the first candidate of every duplicated date and clear the rest
    pub fn quick_fix(&mut self) -> OperationReport {
        let changes = plan_quick_fix(&self.displayed_ids(), &self.assignments);
        self.persist_changes("quick_fix", changes)
    }

    /// Change an enrollment's willingness to host
    pub fn set_can_host(&mut self, id: &CandidateId, can_host: bool) -> SchedulerResult<OperationReport> {
        let candidate = self.find(id)?;
        if candidate.is_teacher {
            return Err(SchedulerError::teacher_immutable(id.as_str()));
        }

        let mut report = OperationReport::default();
        match self.store.set_enrollment_can_host(id.as_str(), can_host) {
            Ok(()) => {
                self.expect_event(StoreEvent::EnrollmentChanged {
                    session_id: self.session.id.clone(),
                    enrollment_id: id.as_str().to_string(),
                });
                if let Some(c) = self.candidates.iter_mut().find(|c| c.id == *id) {
                    c.can_host = can_host;
                }
                report.records_affected = 1;
                tracing::info!(candidate = %id, can_host, "Updated can-host flag");
            }
            Err(e) => self.record_failure(&mut report, id.as_str(), &e),
        }

        self.settle_changes();
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    fn persist_changes(&mut self, operation: &str, changes: Vec<AssignmentChange>) -> OperationReport {
        let mut report = OperationReport::default();

        for change in changes.into_iter().filter(|c| !c.is_noop()) {
            match self.write_change(&change) {
                Ok(published) => {
                    if let Some(event) = published {
                        self.expect_event(event);
                    }
                    self.assignments.apply(&change);
                    report.records_affected += 1;
                    report.applied.push(change);
                }
                Err(e) => self.record_failure(&mut report, change.candidate_id.as_str(), &e),
            }
        }

        self.settle_changes();

        tracing::info!(
            session_id = %self.session.id,
            operation,
            applied = report.applied.len(),
            failed = report.failures.len(),
            "Host assignment operation finished"
        );
        if !report.applied.is_empty() && report.is_complete() {
            self.notifier.notify(Notification::success(t!(
                "notify.changes_saved",
                count = report.applied.len()
            )));
        }

        report
    }

    /// Persist one change; returns the event the store published for it
    fn write_change(&self, change: &AssignmentChange) -> anyhow::Result<Option<StoreEvent>> {
        let session_id = &self.session.id;
        if change.candidate_id.is_teacher() {
            let teacher_id = &self.session.teacher_id;
            let published = match change.to {
                Some(date) => {
                    self.store.upsert_teacher_host_date(teacher_id, session_id, date)?;
                    true
                }
                // deleting a missing row publishes nothing
                None => self.store.delete_teacher_host_date(teacher_id, session_id)?,
            };
            Ok(published.then(|| StoreEvent::TeacherHostChanged {
                session_id: session_id.clone(),
                teacher_id: teacher_id.clone(),
            }))
        } else {
            let enrollment_id = change.candidate_id.as_str();
            self.store.set_enrollment_host_date(enrollment_id, change.to)?;
            Ok(Some(StoreEvent::EnrollmentChanged {
                session_id: session_id.clone(),
                enrollment_id: enrollment_id.to_string(),
            }))
        }
    }

    fn record_failure(&self, report: &mut OperationReport, target: &str, error: &anyhow::Error) {
        let reason = format!("{error:#}");
        tracing::warn!(session_id = %self.session.id, target, error = %reason, "Failed to persist change");
        self.notifier.notify(Notification::error(t!(
            "notify.persist_failed",
            target = target,
            reason = reason
        )));
        report.failures.push(PersistFailure {
            target: target.to_string(),
            reason,
        });
    }

    fn mark_cancelled(&mut self, date: NaiveDate) -> OperationReport {
        let mut report = OperationReport::default();
        let enrollment_ids: Vec<String> = self
            .candidates
            .iter()
            .filter(|c| !c.is_teacher)
            .map(|c| c.id.as_str().to_string())
            .collect();

        if enrollment_ids.is_empty() {
            tracing::warn!(session_id = %self.session.id, date = %date, "No active enrollments to mark");
            self.notifier
                .notify(Notification::warning(t!("notify.no_enrollments")));
            return report;
        }

        let outcome = self
            .store
            .mark_date_cancelled(&self.session.id, date, &enrollment_ids);

        // One landed marker already makes the date cancelled in the store
        if !outcome.written.is_empty() {
            self.expect_event(StoreEvent::AttendanceChanged {
                session_id: self.session.id.clone(),
                date,
            });
            self.cancelled.insert(date);
            report.records_affected = outcome.written.len();
            tracing::info!(
                session_id = %self.session.id,
                date = %date,
                markers = outcome.written.len(),
                failed = outcome.failed.len(),
                "Marked date cancelled"
            );
        }
        for (enrollment_id, e) in &outcome.failed {
            self.record_failure(&mut report, enrollment_id, e);
        }
        if !outcome.written.is_empty() && report.is_complete() {
            self.notifier.notify(Notification::success(t!(
                "notify.date_cancelled",
                date = format_date(date)
            )));
        }

        self.settle_changes();
        report
    }

    fn unmark_cancelled(&mut self, date: NaiveDate) -> OperationReport {
        let mut report = OperationReport::default();

        match self.store.unmark_date_cancelled(&self.session.id, date) {
            Ok(removed) => {
                if !removed.is_empty() {
                    self.expect_event(StoreEvent::AttendanceChanged {
                        session_id: self.session.id.clone(),
                        date,
                    });
                }
                self.cancelled.remove(&date);
                report.records_affected = removed.len();

                for record in &removed {
                    let details = serde_json::to_string(record).ok();
                    let entry = AuditEntry::new("delete", "attendance", record.id.clone(), details);
                    if let Err(e) = self.store.append_audit(&entry) {
                        self.record_failure(&mut report, &record.id, &e);
                    }
                }

                tracing::info!(session_id = %self.session.id, date = %date, removed = removed.len(), "Removed date cancellation");
                self.notifier.notify(Notification::success(t!(
                    "notify.date_restored",
                    date = format_date(date)
                )));
            }
            Err(e) => self.record_failure(&mut report, &format_date(date), &e),
        }

        self.settle_changes();
        report
    }
}

impl fmt::Debug for HostRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRotation")
            .field("session", &self.session.id)
            .field("dates", &self.dates.len())
            .field("candidates", &self.candidates.len())
            .field("cancelled", &self.cancelled.len())
            .field("filter", &self.filter)
            .field("stale", &self.stale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrollmentRecord, EnrollmentStatus};
    use crate::notifications::{MemoryNotifier, NotificationLevel};
    use crate::storage::repository::{HostRecordRepository, MockHostRepository};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn seeded_store() -> Arc<MockHostRepository> {
        let store = Arc::new(MockHostRepository::new());
        store
            .upsert_session(&SessionRecord {
                id: "s1".to_string(),
                course_name: "Evening Group".to_string(),
                teacher_id: "t1".to_string(),
                teacher_name: "Tess".to_string(),
                teacher_address: Some("9 Oak Ave".to_string()),
                teacher_phone: None,
                start_date: "2025-01-06".to_string(),
                end_date: "2025-01-19".to_string(),
                day_filter: Some("Monday, Wednesday".to_string()),
            })
            .unwrap();

        for (id, name, can_host) in [("e1", "Ann", true), ("e2", "Bob", true), ("e3", "Cy", false)] {
            store
                .upsert_enrollment(&EnrollmentRecord {
                    id: id.to_string(),
                    session_id: "s1".to_string(),
                    student_id: format!("st-{id}"),
                    student_name: name.to_string(),
                    address: Some("1 Main St".to_string()),
                    phone: None,
                    status: EnrollmentStatus::Active,
                    can_host,
                    host_date: None,
                })
                .unwrap();
        }
        store
    }

    fn load(store: &Arc<MockHostRepository>) -> (HostRotation, Arc<MemoryNotifier>) {
        let sink = Arc::new(MemoryNotifier::new());
        let rotation = HostRotation::load(store.clone(), sink.clone(), "s1").unwrap();
        (rotation, sink)
    }

    #[test]
    fn test_load_builds_teacher_row_and_dates() {
        let store = seeded_store();
        let (rotation, _) = load(&store);

        assert_eq!(rotation.dates().len(), 4);
        let displayed = rotation.displayed();
        // Cy cannot host
        assert_eq!(displayed.len(), 3);
        assert!(displayed.iter().any(|c| c.is_teacher));
    }

    #[test]
    fn test_load_missing_session() {
        let store = Arc::new(MockHostRepository::new());
        let err = HostRotation::load(store, Arc::new(MemoryNotifier::new()), "nope").unwrap_err();
        assert!(matches!(err, SchedulerError::SessionNotFound { .. }));
    }

    #[test]
    fn test_assign_persists_enrollment_and_teacher() {
        let store = seeded_store();
        let (mut rotation, sink) = load(&store);

        let ann = CandidateId::enrollment("e1");
        let request = rotation.request_assign(&ann, Some(d(2025, 1, 8))).unwrap();
        assert!(matches!(request, AssignRequest::Applied(ref r) if r.applied.len() == 1));

        let teacher = CandidateId::teacher("t1");
        rotation.request_assign(&teacher, Some(d(2025, 1, 6))).unwrap();

        assert_eq!(
            store.get_teacher_host_date("t1", "s1").unwrap(),
            Some(d(2025, 1, 6))
        );
        assert_eq!(
            store.list_active_enrollments("s1").unwrap()[0].host_date,
            Some(d(2025, 1, 8))
        );
        assert_eq!(sink.count(NotificationLevel::Success), 2);
        assert!(!rotation.is_stale());
    }

    #[test]
    fn test_assign_unknown_candidate() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);
        let err = rotation
            .request_assign(&CandidateId::enrollment("ghost"), None)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownCandidate { .. }));
    }

    #[test]
    fn test_failed_write_leaves_map_untouched() {
        let store = seeded_store();
        store.fail_writes_for("e2");
        let (mut rotation, sink) = load(&store);

        let report = rotation.shift_all(ShiftDirection::Forward);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target, "e2");
        assert_eq!(rotation.assignments().get(&CandidateId::enrollment("e2")), None);
        assert_eq!(
            rotation.assignments().get(&CandidateId::enrollment("e1")),
            Some(d(2025, 1, 6))
        );
        assert_eq!(sink.count(NotificationLevel::Error), 1);
    }

    #[test]
    fn test_teacher_can_host_is_immutable() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);
        let err = rotation
            .set_can_host(&CandidateId::teacher("t1"), false)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::TeacherHostImmutable { .. }));

        rotation
            .set_can_host(&CandidateId::enrollment("e3"), true)
            .unwrap();
        assert_eq!(rotation.displayed().len(), 4);
    }

    #[test]
    fn test_clear_all_needs_confirmation() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);
        rotation.shift_all(ShiftDirection::Forward);
        assert_eq!(rotation.assignments().assigned_count(), 3);

        let pending = rotation.request_clear_all();
        assert_eq!(rotation.assignments().assigned_count(), 3);

        let report = rotation.confirm(pending).unwrap();
        assert_eq!(report.applied.len(), 3);
        assert_eq!(rotation.assignments().assigned_count(), 0);
    }

    #[test]
    fn test_unmark_requires_cancelled_date() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);
        let err = rotation
            .confirm(PendingAction::UnmarkCancelled { date: d(2025, 1, 8) })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::StaleConfirmation { .. }));
    }

    #[test]
    fn test_external_write_marks_view_stale() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);
        assert_eq!(rotation.poll_changes(), 0);

        store.set_enrollment_host_date("e2", Some(d(2025, 1, 13))).unwrap();
        assert_eq!(rotation.poll_changes(), 1);
        assert!(rotation.is_stale());

        rotation.reload().unwrap();
        assert!(!rotation.is_stale());
        assert_eq!(
            rotation.assignments().get(&CandidateId::enrollment("e2")),
            Some(d(2025, 1, 13))
        );
    }

    #[test]
    fn test_foreign_write_between_own_writes_is_reported() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);

        store.set_enrollment_host_date("e2", Some(d(2025, 1, 13))).unwrap();
        rotation
            .request_assign(&CandidateId::enrollment("e1"), Some(d(2025, 1, 8)))
            .unwrap();

        assert!(rotation.is_stale());
        assert_eq!(rotation.poll_changes(), 1);
        // reported once
        assert_eq!(rotation.poll_changes(), 0);
    }

    #[test]
    fn test_own_writes_alone_keep_view_fresh() {
        let store = seeded_store();
        let (mut rotation, _) = load(&store);

        rotation.shift_all(ShiftDirection::Forward);
        rotation
            .set_can_host(&CandidateId::enrollment("e3"), true)
            .unwrap();
        rotation.confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) }).unwrap();
        rotation.confirm(PendingAction::UnmarkCancelled { date: d(2025, 1, 8) }).unwrap();
        rotation.confirm(PendingAction::ClearAll).unwrap();

        assert_eq!(rotation.poll_changes(), 0);
        assert!(!rotation.is_stale());
    }

    #[test]
    fn test_partial_mark_keeps_date_cancelled() {
        let store = seeded_store();
        store.fail_writes_for("e2");
        let (mut rotation, sink) = load(&store);

        let report = rotation
            .confirm(PendingAction::MarkCancelled { date: d(2025, 1, 8) })
            .unwrap();

        assert_eq!(report.records_affected, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target, "e2");
        assert!(rotation.cancelled_dates().contains(&d(2025, 1, 8)));
        assert!(store.cancelled_dates("s1").unwrap().contains(&d(2025, 1, 8)));
        assert_eq!(sink.count(NotificationLevel::Error), 1);
        assert_eq!(sink.count(NotificationLevel::Success), 0);

        // the gate and the unmark path both see the date
        let request = rotation
            .request_assign(&CandidateId::enrollment("e1"), Some(d(2025, 1, 8)))
            .unwrap();
        assert!(matches!(request, AssignRequest::NeedsConfirmation(_)));
        let report = rotation
            .confirm(PendingAction::UnmarkCancelled { date: d(2025, 1, 8) })
            .unwrap();
        assert_eq!(report.records_affected, 2);
        assert!(store.cancelled_dates("s1").unwrap().is_empty());
    }

    #[test]
    fn test_pending_action_description_names_date() {
        let text = PendingAction::MarkCancelled { date: d(2025, 1, 8) }.describe();
        assert!(text.contains("2025-01-08"));
    }
}

//! Host rotation scheduling
//!
//! This module turns a recurring session into a rotation of hosts: every
//! student willing to host, plus the course teacher, gets a meeting date on
//! which the session takes place at their address.
//!
//! # Overview
//!
//! The calendar, assignment, validation and grid modules are pure: they work
//! on plain values and never touch the record store. [`HostRotation`] ties
//! them to a [`HostRecordRepository`](crate::storage::HostRecordRepository),
//! persisting one change at a time and reporting per candidate what was
//! written and what failed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      HostRotation                        │
//! │  ┌────────────┐  ┌─────────────┐  ┌──────────────────┐   │
//! │  │  Calendar  │  │ Assignment  │  │ Validation/Grid  │   │
//! │  │   window   │  │     map     │  │    (derived)     │   │
//! │  └─────┬──────┘  └──────┬──────┘  └────────┬─────────┘   │
//! │        └────────────────┼──────────────────┘             │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │ one write per change
//!                           ▼
//!                ┌─────────────────────┐     change feed
//!                │ HostRecordRepository│ ──────────────────▶ stale flag
//!                └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`calendar`] - Weekday parsing and date-window expansion
//! - [`assignment`] - Assignment map, display order, shift/clear/quick-fix planning
//! - [`validation`] - Duplicate, address, unassigned and coverage checks
//! - [`grid`] - Calendar grid projection
//! - [`rotation`] - Session controller with confirmation gate and reports
//! - [`error`] - Scheduler error type
//!
//! # Quick Start
//!
//! ```ignore
//! use hostrota::scheduler::{HostRotation, ShiftDirection};
//!
//! let mut rotation = HostRotation::load(store, notifier, "session-1")?;
//!
//! // Move everyone one meeting forward
//! let report = rotation.shift_all(ShiftDirection::Forward);
//! println!("{} applied, {} failed", report.applied.len(), report.failures.len());
//!
//! // Destructive operations are confirmed explicitly
//! let pending = rotation.request_clear_all();
//! rotation.confirm(pending)?;
//!
//! for issue in rotation.validate().issues {
//!     println!("[{}] {}", issue.level, issue.message);
//! }
//! ```
//!
//! # Coverage
//!
//! | Window date | Counted as |
//! |-------------|------------|
//! | before the earliest assigned date | implicitly covered |
//! | assigned to a displayed candidate | explicitly covered |
//! | anything else | remaining |

pub mod assignment;
pub mod calendar;
pub mod error;
pub mod grid;
pub mod rotation;
pub mod validation;

// Re-export main types
pub use assignment::{AssignmentChange, AssignmentMap, ShiftDirection};
pub use calendar::{expand_window, parse_day_filter, CalendarWindow, DayFilter, WeekdaySet};
pub use error::{SchedulerError, SchedulerResult};
pub use grid::{CalendarGrid, GridDay, GridHost};
pub use rotation::{
    AssignRequest, DisplayFilter, HostRotation, OperationReport, PendingAction, PersistFailure,
};
pub use validation::{Coverage, IssueKind, IssueLevel, ValidationIssue, ValidationReport};

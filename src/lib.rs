//! hostrota - Host rotation scheduler for recurring course sessions
//!
//! Students who volunteer to host, plus the course teacher, each get a
//! meeting date on which the session takes place at their address.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`scheduler`] - Date windows, assignment operations, validation and the session controller
//! - [`models`] - Record and candidate types
//! - [`storage`] - Record store (SQLite, mock), change feed and CSV import
//! - [`export`] - CSV, JSON, Markdown and Excel schedule exports
//! - [`notifications`] - Injected user notifications
//! - [`i18n`] - Locale selection (en, ko)
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hostrota::notifications::TracingNotifier;
//! use hostrota::scheduler::{HostRotation, ShiftDirection};
//! use hostrota::storage::create_sqlite_repository;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = create_sqlite_repository("data/hostrota.db")?;
//!     let mut rotation = HostRotation::load(store, Arc::new(TracingNotifier::new()), "session-1")?;
//!     let report = rotation.shift_all(ShiftDirection::Forward);
//!     println!("{} dates moved", report.applied.len());
//!     Ok(())
//! }
//! ```

// Initialize rust-i18n at crate root level
rust_i18n::i18n!("locales", fallback = "en");

pub mod config;
pub mod error;
pub mod export;
pub mod i18n;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, HostrotaErrorTrait, Result};
    pub use crate::export::{ExportFormat, ScheduleExport};
    pub use crate::models::{CandidateId, HostCandidate, SessionRecord};
    pub use crate::notifications::{Notification, Notifier, SharedNotifier};
    pub use crate::scheduler::{HostRotation, OperationReport, PendingAction, ShiftDirection};
    pub use crate::storage::{HostRecordRepository, SharedHostRepository};
}

// Direct re-exports for convenience
pub use models::{CandidateId, HostCandidate};

//! Record store for sessions, enrollments, host dates and cancellations
//!
//! - [`repository`] - `HostRecordRepository` trait with SQLite and mock implementations
//! - [`events`] - change feed published after every write
//! - [`import`] - CSV bulk import of enrollments

pub mod events;
pub mod import;
pub mod repository;

pub use events::{ChangeFeed, StoreEvent};
pub use import::{import_enrollments_csv, ImportError, ImportFailure, ImportSummary};
pub use repository::{
    create_mock_repository, create_sqlite_repository, HostRecordRepository, MockHostRepository,
    MarkOutcome, SharedHostRepository, SqliteHostRepository, UpsertOutcome,
};

//! Integration tests module
//!
//! End-to-end tests of the host rotation controller over a real record
//! store:
//! - Assignment, shift, clear and quick-fix persisted change by change
//! - Cancelled dates and their confirmation gate
//! - Store failures surfacing in reports and notifications

pub mod cancellation_test;
pub mod error_scenarios;
pub mod rotation_test;

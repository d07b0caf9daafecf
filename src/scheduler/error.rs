//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Session id not present in the record store
    SessionNotFound {
        session_id: String,
    },

    /// Candidate id is not part of the loaded session view
    UnknownCandidate {
        id: String,
    },

    /// The synthetic teacher row cannot change its can-host flag
    TeacherHostImmutable {
        id: String,
    },

    /// A pending confirmation does not match the current session view
    StaleConfirmation {
        reason: String,
    },

    /// Reading from the record store failed
    StoreRead {
        operation: String,
        reason: String,
    },

    /// Invalid calendar date supplied where a date is mandatory
    InvalidDate {
        input: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound { session_id } => {
                write!(f, "Session not found: {}", session_id)
            }
            Self::UnknownCandidate { id } => {
                write!(f, "Unknown host candidate '{}'", id)
            }
            Self::TeacherHostImmutable { id } => {
                write!(f, "Teacher row '{}' always hosts; can-host cannot be changed", id)
            }
            Self::StaleConfirmation { reason } => {
                write!(f, "Confirmation no longer applies: {}", reason)
            }
            Self::StoreRead { operation, reason } => {
                write!(f, "Store read failed during '{}': {}", operation, reason)
            }
            Self::InvalidDate { input } => {
                write!(f, "Invalid date '{}'. Expected YYYY-MM-DD", input)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create a session not found error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create an unknown candidate error
    pub fn unknown_candidate(id: impl Into<String>) -> Self {
        Self::UnknownCandidate { id: id.into() }
    }

    /// Create a teacher-immutable error
    pub fn teacher_immutable(id: impl Into<String>) -> Self {
        Self::TeacherHostImmutable { id: id.into() }
    }

    /// Create a stale confirmation error
    pub fn stale_confirmation(reason: impl Into<String>) -> Self {
        Self::StaleConfirmation {
            reason: reason.into(),
        }
    }

    /// Create a store read error with context
    pub fn store_read(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreRead {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid date error
    pub fn invalid_date(input: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
        }
    }

    /// Check if the error is recoverable
    ///
    /// Store reads can succeed on a later reload; everything else needs
    /// different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StoreRead { .. } | Self::StaleConfirmation { .. })
    }

    /// Message in the active locale
    pub fn localized_desc(&self) -> String {
        use crate::i18n::t;

        match self {
            Self::SessionNotFound { session_id } => {
                t!("errors.scheduler.session_not_found", id = session_id).to_string()
            }
            Self::UnknownCandidate { id } => {
                t!("errors.scheduler.unknown_candidate", id = id).to_string()
            }
            Self::TeacherHostImmutable { .. } => {
                t!("errors.scheduler.teacher_immutable").to_string()
            }
            Self::StaleConfirmation { reason } => {
                t!("errors.scheduler.stale_confirmation", reason = reason).to_string()
            }
            Self::StoreRead { reason, .. } => {
                t!("errors.scheduler.store_read", reason = reason).to_string()
            }
            Self::InvalidDate { input } => {
                t!("errors.scheduler.invalid_date", input = input).to_string()
            }
        }
    }
}

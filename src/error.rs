//! Unified error handling for the hostrota crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`HostrotaErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use hostrota::error::{Error, HostrotaErrorTrait};
//!
//! fn report(err: Error) {
//!     if err.is_recoverable() {
//!         eprintln!("{} (reload and try again)", err.localized_desc());
//!     } else {
//!         eprintln!("{}: {}", err.category().localized_desc(), err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::import::ImportError;

/// Common trait for hostrota error types
pub trait HostrotaErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a reload or retry may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get localized description for user-facing messages
    fn localized_desc(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad user input (CSV rows, dates, arguments)
    Input,
    /// Record store and I/O errors
    Storage,
    /// Scheduling rules and confirmations
    Scheduler,
    /// Rendering or writing exports
    Export,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get localized description for the category
    pub fn localized_desc(&self) -> String {
        match self {
            Self::Input => crate::i18n::t!("errors.category.input").to_string(),
            Self::Storage => crate::i18n::t!("errors.category.storage").to_string(),
            Self::Scheduler => crate::i18n::t!("errors.category.scheduler").to_string(),
            Self::Export => crate::i18n::t!("errors.category.export").to_string(),
            Self::Config => crate::i18n::t!("errors.category.config").to_string(),
            Self::Other => crate::i18n::t!("errors.category.other").to_string(),
        }
    }
}

/// Unified error type for the hostrota crate
#[derive(Error, Debug)]
pub enum Error {
    /// Scheduler errors (unknown candidate, stale confirmation, store reads)
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// CSV import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export rendering or writing errors
    #[error("Export error: {0}")]
    Export(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl HostrotaErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Import(ImportError::Store(_)) => true,
            Self::Import(_) => false,
            Self::Export(_) => false,
            // Locked databases and I/O hiccups go away on their own
            Self::Database(_) => true,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn localized_desc(&self) -> String {
        use crate::i18n::t;

        match self {
            Self::Scheduler(e) => e.localized_desc(),
            Self::Import(e) => format!("{}: {e}", t!("errors.import.error")),
            Self::Export(msg) => format!("{}: {msg}", t!("errors.export.error")),
            Self::Database(e) => format!("{}: {e}", t!("errors.database.error")),
            Self::Io(e) => format!("{}: {e}", t!("errors.io.error")),
            Self::Json(e) => format!("{}: {e}", t!("errors.json.error")),
            Self::Config(msg) => format!("{}: {msg}", t!("errors.config.error")),
            Self::Other { context, .. } => context.clone(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Scheduler(SchedulerError::StoreRead { .. }) => ErrorCategory::Storage,
            Self::Scheduler(SchedulerError::InvalidDate { .. }) => ErrorCategory::Input,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Import(ImportError::Store(_)) => ErrorCategory::Storage,
            Self::Import(_) => ErrorCategory::Input,
            Self::Export(_) => ErrorCategory::Export,
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Input,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

// Conversion from anyhow::Error
//
// Typed errors anywhere below the context layers keep their variant; the
// rest becomes `Other` with the whole chain as its message.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<Error>() {
            Ok(e) => return e,
            Err(err) => err,
        };
        let err = match err.downcast::<SchedulerError>() {
            Ok(e) => return Self::Scheduler(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ImportError>() {
            Ok(e) => return Self::Import(e),
            Err(err) => err,
        };
        let err = match err.downcast::<rusqlite::Error>() {
            Ok(e) => return Self::Database(e),
            Err(err) => err,
        };
        let err = match err.downcast::<io::Error>() {
            Ok(e) => return Self::Io(e),
            Err(err) => err,
        };
        let err = match err.downcast::<serde_json::Error>() {
            Ok(e) => return Self::Json(e),
            Err(err) => err,
        };

        Self::Other {
            context: format!("{err:#}"),
            source: Some(err.into()),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

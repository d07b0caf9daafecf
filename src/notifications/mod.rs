//! User-facing notifications
//!
//! The scheduler reports persistence failures and finished operations
//! through the [`Notifier`] capability it is given at construction time.
//! There is no global listener registry: callers decide where
//! notifications go by choosing the notifier.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────┐
//! │        HostRotation        │
//! │   notify(Notification)     │
//! └─────────────┬──────────────┘
//!               │ SharedNotifier
//!               ▼
//! ┌────────────────────────────┐
//! │    NotificationManager     │
//! │  - deduplication window    │
//! │  - fan-out to channels     │
//! └─────────────┬──────────────┘
//!         ┌─────┴──────┐
//!         ▼            ▼
//!   ┌──────────┐ ┌──────────┐
//!   │ Tracing  │ │  Memory  │
//!   │ Notifier │ │ Notifier │
//!   └──────────┘ └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hostrota::notifications::{MemoryNotifier, Notification, Notifier};
//!
//! let sink = Arc::new(MemoryNotifier::new());
//! sink.notify(Notification::warning("Ann has no address"));
//! assert_eq!(sink.len(), 1);
//! ```

pub mod channels;
mod manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use channels::{MemoryNotifier, TracingNotifier};
pub use manager::NotificationManager;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }
}

/// Capability to surface a non-blocking notification to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Thread-safe shared notifier
pub type SharedNotifier = Arc<dyn Notifier>;

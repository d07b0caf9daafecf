//! Notification channels
//!
//! [`TracingNotifier`] writes notifications to the log, [`MemoryNotifier`]
//! keeps them for later inspection (CLI summaries and tests).

use std::sync::Mutex;

use super::{Notification, NotificationLevel, Notifier};

/// Emits every notification as a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::error!(text = %notification.message, "notification"),
            NotificationLevel::Warning => tracing::warn!(text = %notification.message, "notification"),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(
                    kind = notification.level.as_str(),
                    text = %notification.message,
                    "notification"
                )
            }
        }
    }
}

/// Collects notifications in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().unwrap().is_empty()
    }

    /// Copy of everything received so far
    pub fn snapshot(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    /// Drain everything received so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap())
    }

    /// Number of notifications at `level`
    pub fn count(&self, level: NotificationLevel) -> usize {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}

//! Store change notifications
//!
//! Repositories publish a [`StoreEvent`] after every successful write.
//! Subscribers only use these to notice that a view is out of date; they
//! are not an ordering or conflict-resolution mechanism.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default capacity of the change channel
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// A write that happened in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    SessionChanged {
        session_id: String,
    },
    EnrollmentChanged {
        session_id: String,
        enrollment_id: String,
    },
    TeacherHostChanged {
        session_id: String,
        teacher_id: String,
    },
    AttendanceChanged {
        session_id: String,
        date: NaiveDate,
    },
}

impl StoreEvent {
    /// Session the write belongs to
    pub fn session_id(&self) -> &str {
        match self {
            Self::SessionChanged { session_id }
            | Self::EnrollmentChanged { session_id, .. }
            | Self::TeacherHostChanged { session_id, .. }
            | Self::AttendanceChanged { session_id, .. } => session_id,
        }
    }
}

/// Broadcast channel of store events
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<StoreEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns how many subscribers received it
    pub fn publish(&self, event: StoreEvent) -> usize {
        // No subscribers is the common case for one-shot CLI runs
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

//! Notification manager: deduplication and fan-out

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Notification, Notifier, SharedNotifier};

/// Notifier that forwards to every registered channel
///
/// Identical messages at the same level within the deduplication window
/// are delivered once, so a bulk operation failing on the same cause does
/// not flood the user.
pub struct NotificationManager {
    /// Registered notification channels
    channels: Vec<SharedNotifier>,

    /// Last delivery time per `level:message`
    last_delivered: Mutex<HashMap<String, DateTime<Utc>>>,

    /// Minimum time between duplicate notifications (seconds)
    dedup_window_secs: i64,
}

impl NotificationManager {
    /// Create a manager with a 5 second deduplication window
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            last_delivered: Mutex::new(HashMap::new()),
            dedup_window_secs: 5,
        }
    }

    /// Set deduplication window in seconds (0 disables deduplication)
    pub fn with_dedup_window(mut self, secs: i64) -> Self {
        self.dedup_window_secs = secs;
        self
    }

    /// Add a notification channel
    pub fn with_channel(mut self, channel: SharedNotifier) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn should_deliver(&self, notification: &Notification) -> bool {
        if self.dedup_window_secs <= 0 {
            return true;
        }

        let key = format!("{}:{}", notification.level, notification.message);
        let mut last = self.last_delivered.lock().unwrap();
        let now = Utc::now();
        let window = Duration::seconds(self.dedup_window_secs);

        // Entries past the window no longer suppress anything
        last.retain(|_, at| now - *at < window);
        if last.contains_key(&key) {
            return false;
        }

        last.insert(key, now);
        true
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationManager {
    fn notify(&self, notification: Notification) {
        if !self.should_deliver(&notification) {
            tracing::debug!(text = %notification.message, "Suppressed duplicate notification");
            return;
        }

        for channel in &self.channels {
            channel.notify(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{MemoryNotifier, NotificationLevel};
    use std::sync::Arc;

    #[test]
    fn test_fans_out_to_all_channels() {
        let a = Arc::new(MemoryNotifier::new());
        let b = Arc::new(MemoryNotifier::new());
        let manager = NotificationManager::new()
            .with_channel(a.clone())
            .with_channel(b.clone());

        manager.notify(Notification::info("saved"));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(manager.channel_count(), 2);
    }

    #[test]
    fn test_deduplicates_within_window() {
        let sink = Arc::new(MemoryNotifier::new());
        let manager = NotificationManager::new().with_channel(sink.clone());

        manager.notify(Notification::error("database is locked"));
        manager.notify(Notification::error("database is locked"));
        manager.notify(Notification::warning("database is locked"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.count(NotificationLevel::Error), 1);
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let sink = Arc::new(MemoryNotifier::new());
        let manager = NotificationManager::new().with_channel(sink.clone());
        {
            let mut last = manager.last_delivered.lock().unwrap();
            let long_ago = Utc::now() - Duration::seconds(60);
            last.insert("error:old".to_string(), long_ago);
            last.insert("info:gone".to_string(), long_ago);
        }

        manager.notify(Notification::error("old"));
        manager.notify(Notification::error("new"));

        assert_eq!(sink.len(), 2);
        let last = manager.last_delivered.lock().unwrap();
        assert_eq!(last.len(), 2);
        assert!(!last.contains_key("info:gone"));
        assert!(last["error:old"] > Utc::now() - Duration::seconds(5));
    }

    #[test]
    fn test_zero_window_disables_dedup() {
        let sink = Arc::new(MemoryNotifier::new());
        let manager = NotificationManager::new()
            .with_dedup_window(0)
            .with_channel(sink.clone());

        manager.notify(Notification::error("same"));
        manager.notify(Notification::error("same"));
        assert_eq!(sink.len(), 2);
    }
}

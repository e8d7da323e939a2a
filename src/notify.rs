//! User-facing ephemeral messages.

use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Zero keeps the notification until it is dismissed.
    pub duration_ms: u64,
    #[serde(skip)]
    expires_at: Option<Instant>,
}

impl Notification {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str, duration_ms: u64);
}

pub type Listener = Box<dyn Fn(&Notification) + Send + Sync>;

/// Holds active notifications and fans each new one out to listeners.
#[derive(Default)]
pub struct NotificationCenter {
    active: Mutex<Vec<Notification>>,
    listeners: Mutex<Vec<Listener>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }

    pub fn show(&self, kind: NotificationKind, title: &str, message: &str, duration_ms: u64) -> String {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            duration_ms,
            expires_at: (duration_ms > 0)
                .then(|| Instant::now() + Duration::from_millis(duration_ms)),
        };
        let id = notification.id.clone();

        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener(&notification);
            }
        }
        if let Ok(mut active) = self.active.lock() {
            active.push(notification);
        }
        id
    }

    pub fn info(&self, title: &str, message: &str, duration_ms: u64) -> String {
        self.show(NotificationKind::Info, title, message, duration_ms)
    }

    pub fn success(&self, title: &str, message: &str, duration_ms: u64) -> String {
        self.show(NotificationKind::Success, title, message, duration_ms)
    }

    pub fn warning(&self, title: &str, message: &str, duration_ms: u64) -> String {
        self.show(NotificationKind::Warning, title, message, duration_ms)
    }

    pub fn error(&self, title: &str, message: &str, duration_ms: u64) -> String {
        self.show(NotificationKind::Error, title, message, duration_ms)
    }

    pub fn dismiss(&self, id: &str) {
        if let Ok(mut active) = self.active.lock() {
            active.retain(|n| n.id != id);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut active) = self.active.lock() {
            active.clear();
        }
    }

    /// Notifications that have not yet expired, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        let now = Instant::now();
        match self.active.lock() {
            Ok(mut active) => {
                active.retain(|n| !n.is_expired(now));
                active.clone()
            }
            Err(_) => Vec::new(),
        }
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, title: &str, message: &str, duration_ms: u64) {
        self.info(title, message, duration_ms);
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("active", &self.active.lock().map(|a| a.len()).unwrap_or_default())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn listeners_see_every_notification() {
        let center = NotificationCenter::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        center.subscribe(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        center.notify("New day", "Daily trackers were reset", 5000);
        center.success("Saved", "", 0);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(center.active().len(), 2);
    }

    #[test]
    fn expired_and_dismissed_notifications_drop_out() {
        let center = NotificationCenter::new();
        center.warning("Quick", "gone soon", 1);
        let sticky = center.error("Sticky", "stays", 0);
        std::thread::sleep(Duration::from_millis(5));

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, sticky);

        center.dismiss(&sticky);
        assert!(center.active().is_empty());
    }
}

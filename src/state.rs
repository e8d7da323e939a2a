use crate::notify::NotificationCenter;
use crate::tracker::Tracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Mutex<Tracker>>,
    pub notifications: Arc<NotificationCenter>,
}

impl AppState {
    pub fn new(tracker: Tracker, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            notifications,
        }
    }
}

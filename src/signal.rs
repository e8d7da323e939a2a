//! Broadcast of durable-key changes between tracker instances that share one
//! store, standing in for the browser's cross-tab `storage` event.

use tokio::sync::broadcast;
use tracing::debug;

const SIGNAL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// Instance that wrote the key; receivers skip their own writes.
    pub origin: String,
}

#[derive(Debug, Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<StorageChange>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, key: &str, origin: &str) {
        let change = StorageChange {
            key: key.to_string(),
            origin: origin.to_string(),
        };
        // No receivers simply means no other instance is listening.
        if self.sender.send(change).is_err() {
            debug!(key, "storage change had no listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_changes() {
        let bus = SignalBus::new();
        let mut receiver = bus.subscribe();
        bus.publish("lastDailyReset", "tab-a");

        let change = receiver.recv().await.unwrap();
        assert_eq!(change.key, "lastDailyReset");
        assert_eq!(change.origin, "tab-a");
    }

    #[test]
    fn publishing_without_listeners_is_harmless() {
        SignalBus::new().publish("lastDailyReset", "tab-a");
    }
}

//! Calendar-day rollover.
//!
//! The last day a rollover was applied is kept in durable storage under
//! [`ROLLOVER_MARKER_KEY`]. [`RolloverController`] decides whether the marker
//! is stale; [`crate::Tracker::check_rollover`] performs the reset sequence;
//! [`RolloverWatcher`] re-runs the check on a timer and whenever another
//! instance writes the marker.

use crate::clock::DateKey;
use crate::signal::{SignalBus, StorageChange};
use crate::tracker::Tracker;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub const ROLLOVER_MARKER_KEY: &str = "lastDailyReset";
pub const ROLLOVER_NOTIFICATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloverState {
    #[default]
    Current,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RolloverOutcome {
    /// Nothing to do; the marker already names today.
    Current,
    /// This instance applied the rollover for `day`.
    RolledOver { day: DateKey, rematerialized: bool },
    /// Another instance wrote the marker first; state was reloaded instead.
    AppliedElsewhere { day: DateKey },
}

#[derive(Debug, Clone, Default)]
pub struct RolloverController {
    state: RolloverState,
    last_applied: Option<DateKey>,
}

impl RolloverController {
    pub fn state(&self) -> RolloverState {
        self.state
    }

    pub fn last_applied(&self) -> Option<&DateKey> {
        self.last_applied.as_ref()
    }

    /// Returns `true` when the reset sequence must run for `today`.
    /// Once a day has been applied here it never fires again, whatever the
    /// marker says.
    pub fn observe(&mut self, marker: Option<&DateKey>, today: &DateKey) -> bool {
        if marker == Some(today) || self.last_applied.as_ref() == Some(today) {
            self.state = RolloverState::Current;
            self.last_applied = Some(today.clone());
            return false;
        }
        self.state = RolloverState::Stale;
        true
    }

    pub fn mark_applied(&mut self, today: &DateKey) {
        self.state = RolloverState::Current;
        self.last_applied = Some(today.clone());
    }
}

/// Background task re-checking the rollover. The timer is cleared when the
/// watcher is shut down or dropped.
pub struct RolloverWatcher {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RolloverWatcher {
    pub fn spawn(tracker: Arc<Mutex<Tracker>>, signals: SignalBus, interval: Duration) -> Self {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(watch(tracker, signals, interval, shutdown_rx));
        Self { shutdown, handle }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.handle.await {
            error!("rollover watcher ended abnormally: {err}");
        }
    }
}

async fn watch(
    tracker: Arc<Mutex<Tracker>>,
    signals: SignalBus,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut changes = signals.subscribe();
    let mut signals_open = true;

    info!(interval_secs = interval.as_secs(), "rollover watcher started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let mut tracker = tracker.lock().await;
                if let Err(err) = tracker.check_rollover() {
                    error!("rollover check failed: {err}");
                }
            }
            change = changes.recv(), if signals_open => match change {
                Ok(change) => handle_change(&tracker, &change).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed storage changes, re-checking rollover");
                    let mut tracker = tracker.lock().await;
                    if let Err(err) = tracker.reload_and_check() {
                        error!("rollover check failed: {err}");
                    }
                }
                Err(RecvError::Closed) => signals_open = false,
            },
        }
    }
    info!("rollover watcher stopped");
}

async fn handle_change(tracker: &Mutex<Tracker>, change: &StorageChange) {
    let mut tracker = tracker.lock().await;
    match tracker.on_storage_change(change) {
        Ok(Some(outcome)) => debug!(?outcome, "handled storage change"),
        Ok(None) => {}
        Err(err) => error!("failed to handle storage change: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_for_today_is_current() {
        let mut controller = RolloverController::default();
        let today = DateKey::from("2024-01-10");
        assert!(!controller.observe(Some(&today), &today));
        assert_eq!(controller.state(), RolloverState::Current);
        assert_eq!(controller.last_applied(), Some(&today));
    }

    #[test]
    fn stale_marker_fires_once_per_day() {
        let mut controller = RolloverController::default();
        let yesterday = DateKey::from("2024-01-09");
        let today = DateKey::from("2024-01-10");

        assert!(controller.observe(Some(&yesterday), &today));
        assert_eq!(controller.state(), RolloverState::Stale);
        controller.mark_applied(&today);

        // Even if the marker still looks stale, the day was applied here.
        assert!(!controller.observe(Some(&yesterday), &today));
        assert!(controller.observe(None, &DateKey::from("2024-01-11")));
    }
}

pub mod amalan;
pub mod app;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod rollover;
pub mod signal;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod users;
pub mod wallet;
pub mod water;
pub mod workout;

pub use app::router;
pub use clock::{Clock, DateKey, ManualClock, SystemClock};
pub use config::{Config, RetentionPolicy};
pub use errors::{TrackerError, TrackerResult};
pub use notify::{NotificationCenter, NotificationSink};
pub use rollover::{RolloverOutcome, RolloverWatcher};
pub use signal::SignalBus;
pub use state::AppState;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tracker::Tracker;

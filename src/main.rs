use daily_tracker::notify::Notification;
use daily_tracker::{
    router, AppState, Config, FileStore, NotificationCenter, RolloverWatcher, SignalBus,
    SystemClock, Tracker,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = Arc::new(FileStore::open(&config.data_dir)?);
    info!(data_dir = %store.dir().display(), "opened data store");

    let notifications = Arc::new(NotificationCenter::new());
    notifications.subscribe(Box::new(|notification: &Notification| {
        info!(title = %notification.title, "{}", notification.message);
    }));

    let signals = SignalBus::new();
    let mut tracker = Tracker::open(store, Arc::new(SystemClock), notifications.clone())
        .with_signals(signals.clone())
        .with_retention(config.retention);
    if let Err(err) = tracker.check_rollover() {
        error!("startup rollover check failed: {err}");
    }

    let state = AppState::new(tracker, notifications);
    let watcher = RolloverWatcher::spawn(state.tracker.clone(), signals, config.rollover_interval);
    let app = router(state);

    let addr = config.socket_addr();
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watcher.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

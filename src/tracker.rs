//! The service object every caller goes through.
//!
//! A [`Tracker`] owns one in-memory copy of each domain's records, backed by
//! a shared [`KeyValueStore`]. Several trackers over the same store behave
//! like several browser tabs: each keeps its own cache and reacts to the
//! others through the [`SignalBus`].
//!
//! Every operation runs to completion synchronously. Lookup-then-create for
//! today's records must never be split across an `.await`.

use crate::amalan::AmalanTracker;
use crate::catalog::AmalanFlag;
use crate::clock::{Clock, DateKey};
use crate::config::RetentionPolicy;
use crate::errors::{TrackerError, TrackerResult};
use crate::models::{
    AmalanStats, DailyAmalan, DailyWater, DailyWorkout, HistoryPeriod, NewTransaction,
    ProfileUpdate, UserProfile, Wallet, WalletStats, WalletTransaction, WaterStats, WorkoutStats,
};
use crate::notify::NotificationSink;
use crate::rollover::{
    RolloverController, RolloverOutcome, RolloverState, ROLLOVER_MARKER_KEY,
    ROLLOVER_NOTIFICATION_MS,
};
use crate::signal::{SignalBus, StorageChange};
use crate::stats::period_range;
use crate::storage::KeyValueStore;
use crate::store::new_record_id;
use crate::users::{CredentialCheck, UserDirectory};
use crate::wallet::WalletTracker;
use crate::water::WaterTracker;
use crate::workout::WorkoutTracker;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct Tracker {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    signals: SignalBus,
    origin: String,
    retention: RetentionPolicy,
    rollover: RolloverController,
    users: UserDirectory,
    amalan: AmalanTracker,
    water: WaterTracker,
    workout: WorkoutTracker,
    wallet: WalletTracker,
}

impl Tracker {
    /// Loads every domain from `kv`.
    pub fn open(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, sink: Arc<dyn NotificationSink>) -> Self {
        let users = UserDirectory::load(kv.as_ref());
        let amalan = AmalanTracker::load(kv.as_ref());
        let water = WaterTracker::load(kv.as_ref());
        let workout = WorkoutTracker::load(kv.as_ref());
        let wallet = WalletTracker::load(kv.as_ref());
        Self {
            users,
            amalan,
            water,
            workout,
            wallet,
            kv,
            clock,
            sink,
            signals: SignalBus::new(),
            origin: new_record_id(),
            retention: RetentionPolicy::default(),
            rollover: RolloverController::default(),
        }
    }

    pub fn with_signals(mut self, signals: SignalBus) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Identifies this instance in storage-change signals.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    pub fn rollover_state(&self) -> RolloverState {
        self.rollover.state()
    }

    fn now(&self) -> String {
        self.clock.timestamp()
    }

    fn signed_in(&self) -> TrackerResult<String> {
        self.users
            .current_user_id()
            .map(str::to_string)
            .ok_or(TrackerError::NoSession)
    }

    fn flush(&mut self) -> TrackerResult<()> {
        let kv = self.kv.as_ref();
        self.users.flush(kv)?;
        self.amalan.flush(kv)?;
        self.water.flush(kv)?;
        self.workout.flush(kv)?;
        self.wallet.flush(kv)
    }

    /// Re-reads every domain from storage, keeping this instance's session.
    pub fn reload(&mut self) {
        let kv = self.kv.as_ref();
        self.users.reload_accounts(kv);
        self.amalan = AmalanTracker::load(kv);
        self.water = WaterTracker::load(kv);
        self.workout = WorkoutTracker::load(kv);
        self.wallet = WalletTracker::load(kv);
    }

    pub fn register(&mut self, username: &str, password: &str) -> TrackerResult<UserProfile> {
        let now = self.now();
        let profile = self.users.register_user(username, password, &now)?;
        self.flush()?;
        Ok(profile)
    }

    pub fn login(&mut self, username: &str, password: &str) -> TrackerResult<UserProfile> {
        let profile = self.users.login_user(username, password)?;
        self.flush()?;
        Ok(profile)
    }

    pub fn logout(&mut self) -> TrackerResult<()> {
        self.users.logout();
        self.flush()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.users.current_user()
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> TrackerResult<UserProfile> {
        if self.users.current_user_id().is_none() {
            return Err(TrackerError::NoSession);
        }
        let profile = self.users.update_profile(update)?;
        self.flush()?;
        Ok(profile)
    }

    pub fn today_amalan(&mut self) -> TrackerResult<DailyAmalan> {
        let user_id = self.signed_in()?;
        let today = self.today();
        let record = self.amalan.get_today(&user_id, &today);
        self.flush()?;
        Ok(record)
    }

    pub fn set_amalan_flag(&mut self, flag: AmalanFlag, value: bool) -> TrackerResult<DailyAmalan> {
        let user_id = self.signed_in()?;
        let today = self.today();
        let record = self.amalan.set_flag(&user_id, &today, flag, value);
        self.flush()?;
        Ok(record)
    }

    pub fn amalan_history(&self, period: HistoryPeriod) -> TrackerResult<Vec<DailyAmalan>> {
        let user_id = self.signed_in()?;
        let range = period_range(period, self.clock.today_date());
        Ok(self.amalan.history(&user_id, range.as_ref()))
    }

    pub fn amalan_stats(&self, period: HistoryPeriod) -> TrackerResult<AmalanStats> {
        let user_id = self.signed_in()?;
        let range = period_range(period, self.clock.today_date());
        Ok(self.amalan.stats(&user_id, range.as_ref()))
    }

    pub fn today_water(&mut self) -> TrackerResult<DailyWater> {
        let user_id = self.signed_in()?;
        let today = self.today();
        let record = self.water.get_today(&user_id, &today);
        self.flush()?;
        Ok(record)
    }

    pub fn add_glass(&mut self) -> TrackerResult<DailyWater> {
        let user_id = self.signed_in()?;
        let today = self.today();
        let record = self.water.add_glass(&user_id, &today);
        self.flush()?;
        Ok(record)
    }

    pub fn remove_glass(&mut self) -> TrackerResult<DailyWater> {
        let user_id = self.signed_in()?;
        let today = self.today();
        let record = self.water.remove_glass(&user_id, &today);
        self.flush()?;
        Ok(record)
    }

    pub fn water_history(&self, period: HistoryPeriod) -> TrackerResult<Vec<DailyWater>> {
        let user_id = self.signed_in()?;
        let range = period_range(period, self.clock.today_date());
        Ok(self.water.history(&user_id, range.as_ref()))
    }

    pub fn water_stats(&self, period: HistoryPeriod) -> TrackerResult<WaterStats> {
        let user_id = self.signed_in()?;
        let range = period_range(period, self.clock.today_date());
        Ok(self.water.stats(&user_id, range.as_ref()))
    }

    pub fn today_workout(&mut self) -> TrackerResult<DailyWorkout> {
        let user_id = self.signed_in()?;
        let record = self.workout.get_today(&user_id, self.clock.today_date());
        self.flush()?;
        Ok(record)
    }

    pub fn toggle_workout(&mut self) -> TrackerResult<DailyWorkout> {
        let user_id = self.signed_in()?;
        let record = self.workout.toggle(&user_id, self.clock.today_date());
        self.flush()?;
        Ok(record)
    }

    pub fn workout_history(&self, period: HistoryPeriod) -> TrackerResult<Vec<DailyWorkout>> {
        let user_id = self.signed_in()?;
        let range = period_range(period, self.clock.today_date());
        Ok(self.workout.history(&user_id, range.as_ref()))
    }

    pub fn workout_stats(&self, period: HistoryPeriod) -> TrackerResult<WorkoutStats> {
        let user_id = self.signed_in()?;
        let today = self.clock.today_date();
        let range = period_range(period, today);
        Ok(self.workout.stats(&user_id, range.as_ref(), today))
    }

    pub fn wallet(&mut self) -> TrackerResult<Wallet> {
        let user_id = self.signed_in()?;
        let now = self.now();
        let wallet = self.wallet.wallet(&user_id, &now);
        self.flush()?;
        Ok(wallet)
    }

    pub fn add_transaction(&mut self, new: NewTransaction) -> TrackerResult<WalletTransaction> {
        let user_id = self.signed_in()?;
        let today = self.today();
        let now = self.now();
        let transaction = self.wallet.add_transaction(&user_id, &today, &now, new)?;
        self.flush()?;
        Ok(transaction)
    }

    pub fn delete_transaction(&mut self, transaction_id: &str) -> TrackerResult<()> {
        let user_id = self.signed_in()?;
        let now = self.now();
        self.wallet.delete_transaction(&user_id, transaction_id, &now)?;
        self.flush()
    }

    pub fn update_target(&mut self, target: f64) -> TrackerResult<Wallet> {
        let user_id = self.signed_in()?;
        let now = self.now();
        let wallet = self.wallet.update_target(&user_id, target, &now);
        self.flush()?;
        Ok(wallet)
    }

    pub fn transactions(&self, period: HistoryPeriod) -> TrackerResult<Vec<WalletTransaction>> {
        let user_id = self.signed_in()?;
        let range = period_range(period, self.clock.today_date());
        Ok(self.wallet.history(&user_id, range.as_ref()))
    }

    pub fn wallet_stats(&mut self, period: HistoryPeriod) -> TrackerResult<WalletStats> {
        let user_id = self.signed_in()?;
        let now = self.now();
        let range = period_range(period, self.clock.today_date());
        let stats = self.wallet.stats(&user_id, range.as_ref(), &now);
        self.flush()?;
        Ok(stats)
    }

    /// Creates today's daily records for the signed-in user, if any.
    fn materialize_today(&mut self) -> TrackerResult<bool> {
        let Some(user_id) = self.users.current_user_id().map(str::to_string) else {
            return Ok(false);
        };
        let today = self.clock.today_date();
        let key = DateKey::from_date(today);
        self.amalan.get_today(&user_id, &key);
        self.water.get_today(&user_id, &key);
        self.workout.get_today(&user_id, today);
        self.flush()?;
        Ok(true)
    }

    /// Runs the daily reset if the stored marker is not today.
    ///
    /// Writing the marker is a compare-and-swap against the value just read,
    /// so of several instances sharing the store only one performs the reset
    /// and shows the notification for a given day. The rest reload.
    pub fn check_rollover(&mut self) -> TrackerResult<RolloverOutcome> {
        let today = self.today();
        let marker = self.kv.get(ROLLOVER_MARKER_KEY)?.map(|raw| DateKey::from(raw.as_str()));

        if !self.rollover.observe(marker.as_ref(), &today) {
            return Ok(RolloverOutcome::Current);
        }

        let won = self.kv.compare_and_swap(
            ROLLOVER_MARKER_KEY,
            marker.as_ref().map(DateKey::as_str),
            today.as_str(),
        )?;
        if !won {
            info!(%today, "rollover already applied by another instance");
            self.reload();
            self.rollover.mark_applied(&today);
            self.materialize_today()?;
            return Ok(RolloverOutcome::AppliedElsewhere { day: today });
        }

        // Other instances may have written since our last load.
        self.reload();
        let removed = self.amalan.reset_daily(&today, self.retention)
            + self.water.reset_daily(&today, self.retention)
            + self.workout.reset_daily(&today, self.retention);
        let flushed = self.flush();

        // The marker already names today, so this is the only chance to
        // announce the day even if saving the reset failed.
        self.rollover.mark_applied(&today);
        self.signals.publish(ROLLOVER_MARKER_KEY, &self.origin);
        self.sink.notify(
            "A new day has started!",
            "Daily trackers were reset. Have a good day!",
            ROLLOVER_NOTIFICATION_MS,
        );
        if let Err(err) = flushed {
            error!(%today, "failed to save daily reset: {err}");
            return Err(err);
        }
        info!(%today, previous = ?marker, removed, "daily rollover applied");

        let rematerialized = self.materialize_today()?;
        Ok(RolloverOutcome::RolledOver {
            day: today,
            rematerialized,
        })
    }

    /// Reacts to another instance writing a durable key. Own writes and
    /// unrelated keys are ignored.
    pub fn on_storage_change(&mut self, change: &StorageChange) -> TrackerResult<Option<RolloverOutcome>> {
        if change.origin == self.origin || change.key != ROLLOVER_MARKER_KEY {
            return Ok(None);
        }
        self.reload_and_check().map(Some)
    }

    pub fn reload_and_check(&mut self) -> TrackerResult<RolloverOutcome> {
        self.reload();
        let outcome = self.check_rollover()?;
        if outcome == RolloverOutcome::Current {
            self.materialize_today()?;
        } else {
            debug!(?outcome, "re-check after reload changed the day");
        }
        Ok(outcome)
    }
}

impl CredentialCheck for Tracker {
    fn login(&mut self, username: &str, password: &str) -> bool {
        Tracker::login(self, username, password).is_ok()
    }

    fn register(&mut self, username: &str, password: &str) -> bool {
        Tracker::register(self, username, password).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::TransactionType;
    use crate::notify::NotificationCenter;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    struct Fixture {
        kv: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        notifications: Arc<NotificationCenter>,
        tracker: Tracker,
    }

    fn fixture() -> Fixture {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));
        let notifications = Arc::new(NotificationCenter::new());
        let tracker = Tracker::open(kv.clone(), clock.clone(), notifications.clone());
        Fixture {
            kv,
            clock,
            notifications,
            tracker,
        }
    }

    #[test]
    fn domain_calls_without_session_are_rejected() {
        let mut f = fixture();
        assert!(matches!(f.tracker.add_glass(), Err(TrackerError::NoSession)));
        assert!(matches!(f.tracker.toggle_workout(), Err(TrackerError::NoSession)));
        assert!(f.kv.get("water-storage").unwrap().is_none());
    }

    #[test]
    fn today_records_keep_their_id() {
        let mut f = fixture();
        f.tracker.register("aminah", "secret1").unwrap();
        let first = f.tracker.today_amalan().unwrap();
        let second = f.tracker.today_amalan().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(f.tracker.today_water().unwrap().id, f.tracker.today_water().unwrap().id);
    }

    #[test]
    fn rollover_fires_once_per_day() {
        let mut f = fixture();
        f.tracker.register("aminah", "secret1").unwrap();

        let first = f.tracker.check_rollover().unwrap();
        assert_eq!(
            first,
            RolloverOutcome::RolledOver {
                day: DateKey::from("2024-01-10"),
                rematerialized: true
            }
        );
        assert_eq!(f.tracker.check_rollover().unwrap(), RolloverOutcome::Current);
        assert_eq!(f.notifications.active().len(), 1);
        assert_eq!(f.tracker.workout_history(HistoryPeriod::Daily).unwrap().len(), 1);
        assert_eq!(f.kv.get(ROLLOVER_MARKER_KEY).unwrap().as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn rollover_keeps_history_for_stats() {
        let mut f = fixture();
        f.tracker.register("aminah", "secret1").unwrap();
        f.tracker.check_rollover().unwrap();
        f.tracker.add_glass().unwrap();
        f.tracker.toggle_workout().unwrap();

        f.clock.advance_days(1);
        let outcome = f.tracker.check_rollover().unwrap();
        assert!(matches!(outcome, RolloverOutcome::RolledOver { .. }));
        assert_eq!(f.tracker.water_history(HistoryPeriod::Daily).unwrap().len(), 2);
        assert_eq!(f.tracker.today_water().unwrap().current, 0);
        assert_eq!(f.notifications.active().len(), 2);
    }

    #[test]
    fn keep_today_policy_prunes_old_days() {
        let mut f = fixture();
        f.tracker = f.tracker.with_retention(RetentionPolicy::KeepToday);
        f.tracker.register("aminah", "secret1").unwrap();
        f.tracker.check_rollover().unwrap();
        f.tracker.add_glass().unwrap();

        f.clock.advance_days(1);
        f.tracker.check_rollover().unwrap();
        let history = f.tracker.water_history(HistoryPeriod::Daily).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, DateKey::from("2024-01-11"));
    }

    #[test]
    fn rollover_without_user_skips_materialization() {
        let mut f = fixture();
        let outcome = f.tracker.check_rollover().unwrap();
        assert_eq!(
            outcome,
            RolloverOutcome::RolledOver {
                day: DateKey::from("2024-01-10"),
                rematerialized: false
            }
        );
        assert!(f.kv.get("amalan-storage").unwrap().is_none());
    }

    #[test]
    fn wallet_balance_tracks_ledger() {
        let mut f = fixture();
        f.tracker.register("aminah", "secret1").unwrap();
        f.tracker
            .add_transaction(NewTransaction {
                kind: TransactionType::Income,
                amount: 300.0,
                description: "gift".to_string(),
                category: "Gift".to_string(),
            })
            .unwrap();
        let spend = f
            .tracker
            .add_transaction(NewTransaction {
                kind: TransactionType::Expense,
                amount: 120.0,
                description: "groceries".to_string(),
                category: "Food".to_string(),
            })
            .unwrap();
        assert_eq!(f.tracker.wallet().unwrap().balance, 180.0);

        f.tracker.delete_transaction(&spend.id).unwrap();
        assert_eq!(f.tracker.wallet().unwrap().balance, 300.0);
    }

    #[test]
    fn timestamps_follow_the_injected_clock() {
        let mut f = fixture();
        let profile = f.tracker.register("aminah", "secret1").unwrap();
        assert_eq!(profile.created_at, "2024-01-10T00:00:00+00:00");

        f.clock.advance_days(2);
        let wallet = f.tracker.update_target(500.0).unwrap();
        assert_eq!(wallet.last_updated, "2024-01-12T00:00:00+00:00");
    }

    #[test]
    fn credential_check_signs_in_through_the_tracker() {
        let mut f = fixture();
        assert!(CredentialCheck::register(&mut f.tracker, "aminah", "secret1"));
        assert!(!CredentialCheck::register(&mut f.tracker, "aminah", "secret1"));
        f.tracker.logout().unwrap();
        assert!(!CredentialCheck::login(&mut f.tracker, "aminah", "wrong!!"));
        assert!(CredentialCheck::login(&mut f.tracker, "aminah", "secret1"));
        assert!(f.tracker.current_user().is_some());
    }

    /// Rejects writes to one key while `failing` is set.
    struct FailingStore {
        inner: MemoryStore,
        key: &'static str,
        failing: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> TrackerResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> TrackerResult<()> {
            if key == self.key && self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(TrackerError::Storage("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn compare_and_swap(&self, key: &str, expected: Option<&str>, new: &str) -> TrackerResult<bool> {
            self.inner.compare_and_swap(key, expected, new)
        }
    }

    #[test]
    fn failed_reset_save_still_announces_the_day_once() {
        let kv = Arc::new(FailingStore {
            inner: MemoryStore::new(),
            key: "water-storage",
            failing: std::sync::atomic::AtomicBool::new(false),
        });
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));
        let notifications = Arc::new(NotificationCenter::new());
        let mut tracker = Tracker::open(kv.clone(), clock.clone(), notifications.clone())
            .with_retention(RetentionPolicy::KeepToday);
        tracker.register("aminah", "secret1").unwrap();
        tracker.check_rollover().unwrap();
        tracker.add_glass().unwrap();

        clock.advance_days(1);
        kv.failing.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(tracker.check_rollover(), Err(TrackerError::Storage(_))));
        assert_eq!(notifications.active().len(), 2);
        assert_eq!(tracker.rollover_state(), RolloverState::Current);

        kv.failing.store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(tracker.check_rollover().unwrap(), RolloverOutcome::Current);
        assert_eq!(notifications.active().len(), 2);
    }
}

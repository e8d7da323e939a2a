use crate::clock::{DateKey, DateRange};
use crate::config::RetentionPolicy;
use crate::errors::TrackerResult;
use crate::models::{DailyWater, WaterStats};
use crate::stats::{in_period, water_stats};
use crate::storage::KeyValueStore;
use crate::store::{new_record_id, no_migration, RecordStore};

pub const WATER_STORAGE_KEY: &str = "water-storage";
const WATER_SCHEMA_VERSION: u32 = 0;
pub const DAILY_GLASS_TARGET: u32 = 8;

#[derive(Debug, Clone)]
pub struct WaterTracker {
    store: RecordStore<DailyWater>,
}

impl Default for WaterTracker {
    fn default() -> Self {
        Self {
            store: RecordStore::new(WATER_STORAGE_KEY, WATER_SCHEMA_VERSION),
        }
    }
}

impl WaterTracker {
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        Self {
            store: RecordStore::load(kv, WATER_STORAGE_KEY, WATER_SCHEMA_VERSION, no_migration),
        }
    }

    pub fn flush(&mut self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        self.store.flush(kv)
    }

    pub fn records(&self) -> &[DailyWater] {
        self.store.records()
    }

    fn today_mut(&mut self, user_id: &str, today: &DateKey) -> &mut DailyWater {
        self.store.find_or_insert_with(
            |r| r.user_id == user_id && &r.date == today,
            || DailyWater {
                id: new_record_id(),
                user_id: user_id.to_string(),
                date: today.clone(),
                current: 0,
                target: DAILY_GLASS_TARGET,
            },
        )
    }

    pub fn get_today(&mut self, user_id: &str, today: &DateKey) -> DailyWater {
        self.today_mut(user_id, today).clone()
    }

    /// Adds one glass, never past the target.
    pub fn add_glass(&mut self, user_id: &str, today: &DateKey) -> DailyWater {
        self.adjust(user_id, today, |record| {
            record.current = record.current.saturating_add(1).min(record.target);
        })
    }

    /// Removes one glass, never below zero.
    pub fn remove_glass(&mut self, user_id: &str, today: &DateKey) -> DailyWater {
        self.adjust(user_id, today, |record| {
            record.current = record.current.saturating_sub(1);
        })
    }

    fn adjust(&mut self, user_id: &str, today: &DateKey, change: impl FnOnce(&mut DailyWater)) -> DailyWater {
        let record = self.today_mut(user_id, today);
        let before = record.current;
        change(record);
        let updated = record.clone();
        if updated.current != before {
            self.store.mark_dirty();
        }
        updated
    }

    pub fn reset_daily(&mut self, today: &DateKey, policy: RetentionPolicy) -> usize {
        match policy {
            RetentionPolicy::Retain => 0,
            RetentionPolicy::KeepToday => self.store.retain(|r| &r.date == today),
        }
    }

    pub fn history(&self, user_id: &str, range: Option<&DateRange>) -> Vec<DailyWater> {
        self.store
            .filter(|r| r.user_id == user_id && in_period(&r.date, range))
    }

    pub fn stats(&self, user_id: &str, range: Option<&DateRange>) -> WaterStats {
        water_stats(&self.history(user_id, range))
    }
}

use crate::catalog::AmalanFlag;
use crate::clock::{DateKey, DateRange};
use crate::config::RetentionPolicy;
use crate::errors::TrackerResult;
use crate::models::{AmalanFlags, AmalanStats, DailyAmalan};
use crate::stats::{amalan_stats, in_period};
use crate::storage::KeyValueStore;
use crate::store::{new_record_id, no_migration, RecordStore};

pub const AMALAN_STORAGE_KEY: &str = "amalan-storage";
const AMALAN_SCHEMA_VERSION: u32 = 0;

/// Daily religious-practice checklist, one record per user per day.
#[derive(Debug, Clone)]
pub struct AmalanTracker {
    store: RecordStore<DailyAmalan>,
}

impl Default for AmalanTracker {
    fn default() -> Self {
        Self {
            store: RecordStore::new(AMALAN_STORAGE_KEY, AMALAN_SCHEMA_VERSION),
        }
    }
}

impl AmalanTracker {
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        Self {
            store: RecordStore::load(kv, AMALAN_STORAGE_KEY, AMALAN_SCHEMA_VERSION, no_migration),
        }
    }

    pub fn flush(&mut self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        self.store.flush(kv)
    }

    pub fn records(&self) -> &[DailyAmalan] {
        self.store.records()
    }

    fn today_mut(&mut self, user_id: &str, today: &DateKey) -> &mut DailyAmalan {
        self.store.find_or_insert_with(
            |r| r.user_id == user_id && &r.date == today,
            || DailyAmalan {
                id: new_record_id(),
                user_id: user_id.to_string(),
                date: today.clone(),
                amalan: AmalanFlags::default(),
                completed_count: 0,
                total_count: AmalanFlag::ALL.len() as u32,
            },
        )
    }

    pub fn get_today(&mut self, user_id: &str, today: &DateKey) -> DailyAmalan {
        self.today_mut(user_id, today).clone()
    }

    /// The completed count is recomputed here and nowhere else.
    pub fn set_flag(&mut self, user_id: &str, today: &DateKey, flag: AmalanFlag, value: bool) -> DailyAmalan {
        let record = self.today_mut(user_id, today);
        record.amalan.set(flag, value);
        record.completed_count = record.amalan.completed();
        let updated = record.clone();
        self.store.mark_dirty();
        updated
    }

    pub fn reset_daily(&mut self, today: &DateKey, policy: RetentionPolicy) -> usize {
        match policy {
            RetentionPolicy::Retain => 0,
            RetentionPolicy::KeepToday => self.store.retain(|r| &r.date == today),
        }
    }

    pub fn history(&self, user_id: &str, range: Option<&DateRange>) -> Vec<DailyAmalan> {
        self.store
            .filter(|r| r.user_id == user_id && in_period(&r.date, range))
    }

    pub fn stats(&self, user_id: &str, range: Option<&DateRange>) -> AmalanStats {
        amalan_stats(&self.history(user_id, range))
    }
}

use crate::catalog::WorkoutType;
use crate::clock::{DateKey, DateRange};
use crate::config::RetentionPolicy;
use crate::errors::TrackerResult;
use crate::migrate::{migrate_workouts, WORKOUT_SCHEMA_VERSION};
use crate::models::{DailyWorkout, RecordedWorkoutType, WorkoutStats};
use crate::stats::{in_period, workout_stats};
use crate::storage::KeyValueStore;
use crate::store::{new_record_id, RecordStore};
use chrono::{Datelike, NaiveDate};

pub const WORKOUT_STORAGE_KEY: &str = "workout-storage";

#[derive(Debug, Clone)]
pub struct WorkoutTracker {
    store: RecordStore<DailyWorkout>,
}

impl Default for WorkoutTracker {
    fn default() -> Self {
        Self {
            store: RecordStore::new(WORKOUT_STORAGE_KEY, WORKOUT_SCHEMA_VERSION),
        }
    }
}

impl WorkoutTracker {
    /// Older schema versions are upgraded on the way in.
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        Self {
            store: RecordStore::load(kv, WORKOUT_STORAGE_KEY, WORKOUT_SCHEMA_VERSION, migrate_workouts),
        }
    }

    pub fn flush(&mut self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        self.store.flush(kv)
    }

    pub fn records(&self) -> &[DailyWorkout] {
        self.store.records()
    }

    fn today_mut(&mut self, user_id: &str, today: NaiveDate) -> &mut DailyWorkout {
        let key = DateKey::from_date(today);
        self.store.find_or_insert_with(
            |r| r.user_id == user_id && r.date == key,
            || {
                let kind = WorkoutType::for_weekday(today.weekday());
                DailyWorkout {
                    id: new_record_id(),
                    user_id: user_id.to_string(),
                    date: DateKey::from_date(today),
                    completed: false,
                    workout_type: RecordedWorkoutType::Current(kind),
                    duration: kind.details().duration,
                }
            },
        )
    }

    pub fn get_today(&mut self, user_id: &str, today: NaiveDate) -> DailyWorkout {
        self.today_mut(user_id, today).clone()
    }

    /// Flips today's completion. With no record yet, toggling means
    /// "mark done", so the record is created already completed.
    pub fn toggle(&mut self, user_id: &str, today: NaiveDate) -> DailyWorkout {
        let record = self.today_mut(user_id, today);
        record.completed = !record.completed;
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

    pub fn history(&self, user_id: &str, range: Option<&DateRange>) -> Vec<DailyWorkout> {
        self.store
            .filter(|r| r.user_id == user_id && in_period(&r.date, range))
    }

    pub fn stats(&self, user_id: &str, range: Option<&DateRange>, today: NaiveDate) -> WorkoutStats {
        workout_stats(&self.history(user_id, range), &self.history(user_id, None), today)
    }
}

//! Workout schema upgrades.
//!
//! Version 0 rotated through five exercise names (`pushup`, `situp`, `squat`,
//! `plank`, `jumping_jacks`). Version 1 derives the type from the weekday of
//! the record's date and takes the duration from that type's catalog entry.

use crate::catalog::WorkoutType;
use crate::clock::DateKey;
use crate::errors::{TrackerError, TrackerResult};
use chrono::Datelike;
use serde_json::Value;
use tracing::warn;

pub const WORKOUT_SCHEMA_VERSION: u32 = 1;

pub const LEGACY_WORKOUT_TYPES: [&str; 5] = ["pushup", "situp", "squat", "plank", "jumping_jacks"];

pub fn migrate_workouts(from_version: u32, records: Vec<Value>) -> TrackerResult<Vec<Value>> {
    match from_version {
        0 => records.into_iter().map(upgrade_v0_record).collect(),
        other => Err(TrackerError::Serialization(format!(
            "unknown workout schema version {other}"
        ))),
    }
}

fn upgrade_v0_record(mut record: Value) -> TrackerResult<Value> {
    let date = record
        .get("date")
        .and_then(Value::as_str)
        .map(DateKey::from)
        .and_then(|key| key.to_date())
        .ok_or_else(|| TrackerError::Serialization("workout record without a valid date".to_string()))?;

    let Some(fields) = record.as_object_mut() else {
        return Err(TrackerError::Serialization("workout record is not an object".to_string()));
    };

    let legacy = fields
        .get("workoutType")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !LEGACY_WORKOUT_TYPES.contains(&legacy.as_str()) {
        warn!(legacy = %legacy, "unexpected workout type in version 0 data, remapping anyway");
    }

    let kind = WorkoutType::for_weekday(date.weekday());
    fields.insert("workoutType".to_string(), Value::from(kind.as_str()));
    fields.insert("duration".to_string(), Value::from(kind.details().duration));
    Ok(record)
}

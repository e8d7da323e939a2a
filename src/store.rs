//! Insertion-ordered record lists persisted as versioned envelopes.

use crate::errors::{TrackerError, TrackerResult};
use crate::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub version: u32,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

/// Upgrades the raw records of an older envelope to the current schema.
pub type Migration = fn(from_version: u32, records: Vec<Value>) -> TrackerResult<Vec<Value>>;

pub fn no_migration(from_version: u32, _records: Vec<Value>) -> TrackerResult<Vec<Value>> {
    Err(TrackerError::Serialization(format!(
        "no migration from schema version {from_version}"
    )))
}

/// No uniqueness is enforced here; callers check for existing records first.
#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    key: &'static str,
    version: u32,
    records: Vec<T>,
    dirty: bool,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(key: &'static str, version: u32) -> Self {
        Self {
            key,
            version,
            records: Vec::new(),
            dirty: false,
        }
    }

    pub fn with_records(key: &'static str, version: u32, records: Vec<T>) -> Self {
        Self {
            key,
            version,
            records,
            dirty: false,
        }
    }

    /// Reads the blob under `key`, migrating older schema versions.
    /// Missing, corrupt, or unmigratable data yields an empty store.
    pub fn load(kv: &dyn KeyValueStore, key: &'static str, version: u32, migrate: Migration) -> Self {
        let raw = match kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(key, version),
            Err(err) => {
                error!(key, "failed to read store: {err}");
                return Self::new(key, version);
            }
        };

        match decode(&raw, version, migrate) {
            Ok((records, migrated)) => {
                let mut store = Self::with_records(key, version, records);
                // Write the upgraded schema back on the next flush.
                store.dirty = migrated;
                store
            }
            Err(err) => {
                error!(key, "failed to load store, starting empty: {err}");
                Self::new(key, version)
            }
        }
    }

    pub fn persist(&self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        let envelope = Envelope {
            version: self.version,
            records: self.records.clone(),
        };
        let payload = serde_json::to_string(&envelope)?;
        kv.set(self.key, &payload)
    }

    /// Persists only when something changed since the last flush.
    pub fn flush(&mut self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        if self.dirty {
            self.persist(kv)?;
            self.dirty = false;
        }
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn append(&mut self, record: T) {
        self.records.push(record);
        self.dirty = true;
    }

    /// Returns the first matching record, appending `create()` if none
    /// matches. Lookup and insert happen under one exclusive borrow, so no
    /// other caller can observe the gap between them.
    pub fn find_or_insert_with(
        &mut self,
        predicate: impl Fn(&T) -> bool,
        create: impl FnOnce() -> T,
    ) -> &mut T {
        let index = match self.records.iter().position(|record| predicate(record)) {
            Some(index) => index,
            None => {
                self.records.push(create());
                self.dirty = true;
                self.records.len() - 1
            }
        };
        &mut self.records[index]
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.records.iter().find(|record| predicate(record))
    }

    /// Applies `updater` to every matching record, returning how many matched.
    pub fn update_where(
        &mut self,
        predicate: impl Fn(&T) -> bool,
        mut updater: impl FnMut(&mut T),
    ) -> usize {
        let mut updated = 0;
        for record in self.records.iter_mut().filter(|record| predicate(record)) {
            updater(record);
            updated += 1;
        }
        if updated > 0 {
            self.dirty = true;
        }
        updated
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Keeps only matching records, returning how many were removed.
    pub fn retain(&mut self, predicate: impl Fn(&T) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|record| predicate(record));
        let removed = before - self.records.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }
}

fn decode<T: DeserializeOwned>(
    raw: &str,
    version: u32,
    migrate: Migration,
) -> TrackerResult<(Vec<T>, bool)> {
    let envelope: Envelope<Value> = serde_json::from_str(raw)?;
    let migrated = envelope.version != version;
    let records = if !migrated {
        envelope.records
    } else if envelope.version < version {
        info!(
            from = envelope.version,
            to = version,
            "migrating {} stored records",
            envelope.records.len()
        );
        migrate(envelope.version, envelope.records)?
    } else {
        return Err(TrackerError::Serialization(format!(
            "stored schema version {} is newer than supported {version}",
            envelope.version
        )));
    };

    let records = records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(TrackerError::from))
        .collect::<TrackerResult<Vec<T>>>()?;
    Ok((records, migrated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        user: String,
    }

    fn row(id: u32, user: &str) -> Row {
        Row {
            id,
            user: user.to_string(),
        }
    }

    #[test]
    fn persists_and_reloads_in_insertion_order() {
        let kv = MemoryStore::new();
        let mut store = RecordStore::new("rows", 0);
        store.append(row(2, "a"));
        store.append(row(1, "b"));
        store.persist(&kv).unwrap();

        let loaded: RecordStore<Row> = RecordStore::load(&kv, "rows", 0, no_migration);
        assert_eq!(loaded.records(), &[row(2, "a"), row(1, "b")]);
    }

    #[test]
    fn update_where_and_retain_report_counts() {
        let mut store = RecordStore::new("rows", 0);
        store.append(row(1, "a"));
        store.append(row(2, "a"));
        store.append(row(3, "b"));

        let updated = store.update_where(|r| r.user == "a", |r| r.id += 10);
        assert_eq!(updated, 2);
        assert_eq!(store.filter(|r| r.id > 10).len(), 2);

        assert_eq!(store.retain(|r| r.user == "b"), 2);
        assert_eq!(store.records(), &[row(3, "b")]);
    }

    #[test]
    fn find_or_insert_creates_once_and_tracks_dirtiness() {
        let kv = MemoryStore::new();
        let mut store = RecordStore::new("rows", 0);

        store.find_or_insert_with(|r: &Row| r.user == "a", || row(1, "a"));
        store.find_or_insert_with(|r: &Row| r.user == "a", || row(2, "a"));
        assert_eq!(store.records(), &[row(1, "a")]);
        assert!(store.is_dirty());

        store.flush(&kv).unwrap();
        assert!(!store.is_dirty());
        assert!(kv.get("rows").unwrap().is_some());

        store.find_or_insert_with(|r: &Row| r.user == "a", || row(3, "a"));
        assert!(!store.is_dirty());
    }

    #[test]
    fn corrupt_or_newer_data_loads_empty() {
        let kv = MemoryStore::new();
        kv.set("rows", "not json").unwrap();
        let store: RecordStore<Row> = RecordStore::load(&kv, "rows", 0, no_migration);
        assert!(store.records().is_empty());

        kv.set("rows", r#"{"version":5,"records":[{"id":1,"user":"a"}]}"#)
            .unwrap();
        let store: RecordStore<Row> = RecordStore::load(&kv, "rows", 0, no_migration);
        assert!(store.records().is_empty());
    }

    #[test]
    fn older_version_runs_migration() {
        fn bump(_from: u32, records: Vec<Value>) -> TrackerResult<Vec<Value>> {
            Ok(records
                .into_iter()
                .map(|mut r| {
                    r["user"] = Value::from("migrated");
                    r
                })
                .collect())
        }

        let kv = MemoryStore::new();
        kv.set("rows", r#"{"version":0,"records":[{"id":1,"user":"old"}]}"#)
            .unwrap();
        let mut store: RecordStore<Row> = RecordStore::load(&kv, "rows", 1, bump);
        assert_eq!(store.records(), &[row(1, "migrated")]);
        assert!(store.is_dirty());

        store.flush(&kv).unwrap();
        assert!(kv.get("rows").unwrap().unwrap().contains("\"version\":1"));
    }
}

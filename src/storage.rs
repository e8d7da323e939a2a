//! Durable string-keyed storage.
//!
//! Each tracked domain persists one JSON blob under a fixed key, the same way
//! a browser keeps one `localStorage` entry per store.

use crate::errors::{TrackerError, TrackerResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> TrackerResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> TrackerResult<()>;

    /// Writes `new` only if the current value equals `expected`
    /// (`None` meaning the key is absent). Returns whether the write happened.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> TrackerResult<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> TrackerResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| TrackerError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> TrackerResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> TrackerResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> TrackerResult<bool> {
        let mut entries = self.lock()?;
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), new.to_string());
        Ok(true)
    }
}

/// One `<key>.json` file per key inside a data directory.
///
/// Compare-and-swap is serialized within this process only; two processes
/// sharing the directory can still interleave.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> TrackerResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> TrackerResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(TrackerError::validation(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn read(&self, path: &Path) -> TrackerResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes a sibling `.json.tmp` file and renames it over `path`, so a
    /// reader sees either the old blob or the new one, never a partial write.
    fn write_replace(&self, path: &Path, value: &str) -> TrackerResult<()> {
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> TrackerResult<Option<String>> {
        let path = self.path_for(key)?;
        self.read(&path)
    }

    fn set(&self, key: &str, value: &str) -> TrackerResult<()> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TrackerError::Storage("file store lock poisoned".to_string()))?;
        self.write_replace(&path, value)?;
        debug!(key, "persisted {} bytes", value.len());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> TrackerResult<bool> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TrackerError::Storage("file store lock poisoned".to_string()))?;
        let current = self.read(&path)?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        self.write_replace(&path, new)?;
        Ok(true)
    }
}

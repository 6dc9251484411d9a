use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::model::history::History;

pub mod keys {
    pub const ROSTER: &str = "students";
    pub const HISTORY: &str = "history";
    pub const SETTINGS: &str = "settings";
    pub const USAGE: &str = "selection_count";
    pub const PRIVILEGE: &str = "membership_info";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// String values under logical keys.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore(HashMap<String, String>);

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.0.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<FileStore, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        fs::write(self.path(key)?, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)?) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}


/// Reads `key`, falling back to `default` when it is missing or unreadable.
pub fn load<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: Store + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(err) => {
            warn!(key, %err, "failed to read stored value, using default");
            return default;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, %err, "stored value is malformed, using default");
            default
        }
    }
}

pub fn save<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: Store + ?Sized,
{
    store.set(key, serde_json::to_string_pretty(value)?)
}

/// Drops the stored history key rather than writing an empty list.
pub fn clear_history<S: Store + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    store.remove(keys::HISTORY)
}

#[derive(Debug, Serialize)]
struct ExportedEntry<'a> {
    id: &'a str,
    name: &'a str,
    index: usize,
    timestamp: DateTime<Utc>,
}

/// History as a JSON array, most recent first, each row numbered from 1 and
/// stamped with `at`.
pub fn export_history(history: &History, at: DateTime<Utc>) -> Result<String, StoreError> {
    let rows: Vec<ExportedEntry> = history.iter()
        .enumerate()
        .map(|(index, entry)| ExportedEntry {
            id: &entry.id,
            name: &entry.name,
            index: index + 1,
            timestamp: at,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Entry;
    use crate::model::policy::Policy;

    #[test]
    fn load_falls_back_on_missing_and_malformed() {
        let mut store = MemoryStore::new();
        assert_eq!(load(&store, keys::SETTINGS, Policy::default()), Policy::default());

        store.set(keys::SETTINGS, "{not json".to_string()).unwrap();
        assert_eq!(load(&store, keys::SETTINGS, Policy::default()), Policy::default());

        let policy = Policy::default().with_selection_count(4);
        save(&mut store, keys::SETTINGS, &policy).unwrap();
        assert_eq!(load(&store, keys::SETTINGS, Policy::default()), policy);
    }

    #[test]
    fn clearing_history_removes_the_key() {
        let mut store = MemoryStore::new();
        save(&mut store, keys::HISTORY, &History::from(vec![Entry::new("S001", "Ann")])).unwrap();
        clear_history(&mut store).unwrap();
        assert_eq!(store.get(keys::HISTORY).unwrap(), None);
        clear_history(&mut store).unwrap();
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("state")).unwrap();
        assert_eq!(store.get(keys::ROSTER).unwrap(), None);

        store.set(keys::ROSTER, "[]".to_string()).unwrap();
        assert_eq!(store.get(keys::ROSTER).unwrap().as_deref(), Some("[]"));
        assert!(store.dir().join("students.json").exists());

        store.remove(keys::ROSTER).unwrap();
        store.remove(keys::ROSTER).unwrap();
        assert_eq!(store.get(keys::ROSTER).unwrap(), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("../escape"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn export_numbers_rows_from_one() {
        let history = History::from(vec![Entry::new("S002", "Bo"), Entry::new("S001", "Ann")]);
        let at = DateTime::parse_from_rfc3339("2025-03-01T08:00:00Z").unwrap().with_timezone(&Utc);
        let json: serde_json::Value = serde_json::from_str(&export_history(&history, at).unwrap()).unwrap();
        assert_eq!(json[0]["id"], "S002");
        assert_eq!(json[1]["index"], 2);
        assert_eq!(json[1]["timestamp"], "2025-03-01T08:00:00Z");
    }
}

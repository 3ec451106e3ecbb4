//! Prefixed key-value persistence for client-side state
//!
//! Every entry lives under the fixed `himafi_` prefix so `clear_all` can
//! wipe the site's state without touching anything else in the directory.
//! Failures never propagate: reads fall back to `None`, writes report
//! `false`, and the cause goes to the diagnostic log.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub const STORAGE_PREFIX: &str = "himafi_";

/// The site's well-known storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AuthToken,
    UserData,
    Theme,
    Language,
    Favorites,
    Notifications,
    LastVisit,
    SearchHistory,
    Filters,
}

impl StorageKey {
    pub const ALL: [StorageKey; 9] = [
        StorageKey::AuthToken,
        StorageKey::UserData,
        StorageKey::Theme,
        StorageKey::Language,
        StorageKey::Favorites,
        StorageKey::Notifications,
        StorageKey::LastVisit,
        StorageKey::SearchHistory,
        StorageKey::Filters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AuthToken => "auth_token",
            StorageKey::UserData => "user_data",
            StorageKey::Theme => "theme",
            StorageKey::Language => "language",
            StorageKey::Favorites => "favorites",
            StorageKey::Notifications => "notifications",
            StorageKey::LastVisit => "last_visit",
            StorageKey::SearchHistory => "search_history",
            StorageKey::Filters => "filters",
        }
    }
}

/// Durable store: one JSON file per key under the root directory.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Store rooted under the user's home directory (`~/.himafi`).
    pub fn new() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Self::with_root(home.join(".himafi"))
    }

    /// Store rooted at an explicit directory, created if missing.
    pub fn with_root(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create storage root: {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{STORAGE_PREFIX}{key}.json"))
    }

    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        self.get_raw(key.as_str())
    }

    pub fn get_raw<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(key, error = %err, "storage read failed");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "storage entry is not valid JSON");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: StorageKey, value: &T) -> bool {
        self.set_raw(key.as_str(), value)
    }

    pub fn set_raw<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(key, error = %err, "storage value is not serializable");
                return false;
            }
        };
        match fs::write(self.path_for(key), text) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "storage write failed");
                false
            }
        }
    }

    pub fn remove(&self, key: StorageKey) -> bool {
        self.remove_raw(key.as_str())
    }

    pub fn remove_raw(&self, key: &str) -> bool {
        let path = self.path_for(key);
        if !path.exists() {
            return true;
        }
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "storage remove failed");
                false
            }
        }
    }

    /// Remove every prefixed entry; files without the prefix are untouched.
    pub fn clear_all(&self) -> bool {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "storage root unreadable");
                return false;
            }
        };

        let mut ok = true;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(STORAGE_PREFIX) && name.ends_with(".json") {
                if let Err(err) = fs::remove_file(entry.path()) {
                    tracing::warn!(file = name, error = %err, "storage clear failed");
                    ok = false;
                }
            }
        }
        ok
    }
}

/// In-memory per-process analog of the durable store.
#[derive(Default)]
pub struct SessionStorage {
    values: Mutex<HashMap<String, Value>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let values = self.values.lock().unwrap();
        let value = values.get(key.as_str())?.clone();
        serde_json::from_value(value).ok()
    }

    pub fn set<T: Serialize>(&self, key: StorageKey, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.values
                    .lock()
                    .unwrap()
                    .insert(key.as_str().to_string(), value);
                true
            }
            Err(err) => {
                tracing::warn!(key = key.as_str(), error = %err, "session value is not serializable");
                false
            }
        }
    }

    pub fn remove(&self, key: StorageKey) -> bool {
        self.values.lock().unwrap().remove(key.as_str());
        true
    }

    pub fn clear_all(&self) {
        self.values.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_typed_values() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::with_root(dir.path()).unwrap();

        assert!(storage.set(StorageKey::Theme, &"dark".to_string()));
        assert_eq!(
            storage.get::<String>(StorageKey::Theme).as_deref(),
            Some("dark")
        );

        assert!(storage.set(StorageKey::Favorites, &vec!["op-1", "a-2"]));
        let favorites: Vec<String> = storage.get(StorageKey::Favorites).unwrap();
        assert_eq!(favorites, ["op-1", "a-2"]);
    }

    #[test]
    fn missing_and_corrupt_entries_read_as_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::with_root(dir.path()).unwrap();

        assert_eq!(storage.get::<String>(StorageKey::Language), None);

        fs::write(dir.path().join("himafi_language.json"), "{not json").unwrap();
        assert_eq!(storage.get::<String>(StorageKey::Language), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::with_root(dir.path()).unwrap();

        storage.set(StorageKey::Theme, &"light");
        assert!(storage.remove(StorageKey::Theme));
        assert!(storage.remove(StorageKey::Theme));
        assert_eq!(storage.get::<String>(StorageKey::Theme), None);
    }

    #[test]
    fn clear_all_only_touches_prefixed_files() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::with_root(dir.path()).unwrap();

        storage.set(StorageKey::Theme, &"dark");
        storage.set(StorageKey::Language, &"id");
        fs::write(dir.path().join("unrelated.json"), "{}").unwrap();

        assert!(storage.clear_all());
        assert_eq!(storage.get::<String>(StorageKey::Theme), None);
        assert!(dir.path().join("unrelated.json").exists());
    }

    #[test]
    fn session_storage_round_trip() {
        let session = SessionStorage::new();
        assert!(session.set(StorageKey::SearchHistory, &vec!["physics"]));
        let history: Vec<String> = session.get(StorageKey::SearchHistory).unwrap();
        assert_eq!(history, ["physics"]);

        session.clear_all();
        assert_eq!(session.get::<Vec<String>>(StorageKey::SearchHistory), None);
    }
}

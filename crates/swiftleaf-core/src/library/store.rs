//! Key-value persistence for the reader library.
//!
//! Values are stored as small TOML documents, one per logical key. Each value
//! is wrapped in a `value` table so lists and scalars serialize the same way
//! as structs.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const DOCUMENTS_KEY: &str = "saved-documents";
pub const GOAL_KEY: &str = "reading-goal";
pub const HISTORY_KEY: &str = "reading-history";

pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.toml` file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(anyhow!("invalid store key {key:?}"));
        }
        Ok(self.dir.join(format!("{key}.toml")))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let temp_path = path.with_extension(format!("toml.tmp-{}", std::process::id()));
        fs::write(&temp_path, value)
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        if fs::rename(&temp_path, &path).is_err() {
            fs::copy(&temp_path, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            let _ = fs::remove_file(&temp_path);
        }
        debug!(path = %path.display(), "Saved store entry");
        Ok(())
    }
}

#[derive(Serialize, serde::Deserialize)]
struct Envelope<T> {
    value: T,
}

/// Typed access to a [`KeyValueStore`]. Updates are serialized so concurrent
/// read-modify-write cycles do not lose writes.
pub struct Repository<K> {
    store: Arc<K>,
    write_lock: Arc<Mutex<()>>,
}

impl<K> Clone for Repository<K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<K: KeyValueStore> Repository<K> {
    pub fn new(store: K) -> Self {
        Self {
            store: Arc::new(store),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Stored value for `key`, or `default` when absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        let Some(raw) = self.store.load(key)? else {
            return Ok(default);
        };
        match toml::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) => Ok(envelope.value),
            Err(err) => {
                warn!(key, "Discarding unreadable store entry: {err}");
                Ok(default)
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("repository lock poisoned"))?;
        self.write(key, value)
    }

    /// Read-modify-write `key` under the repository lock.
    pub fn update<T, R>(&self, key: &str, default: T, updater: impl FnOnce(&mut T) -> R) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("repository lock poisoned"))?;
        let mut value = self.get(key, default)?;
        let out = updater(&mut value);
        self.write(key, &value)?;
        Ok(out)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let contents = toml::to_string(&Envelope { value })
            .with_context(|| format!("failed to serialize store entry {key}"))?;
        self.store.save(key, &contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        name: String,
        count: u32,
        note: Option<String>,
    }

    #[test]
    fn memory_repository_round_trips_lists() {
        let repo = Repository::new(MemoryStore::new());
        let entries = vec![
            Entry {
                name: "a".into(),
                count: 1,
                note: None,
            },
            Entry {
                name: "b".into(),
                count: 2,
                note: Some("hi".into()),
            },
        ];
        repo.set("entries", &entries).unwrap();

        let loaded: Vec<Entry> = repo.get("entries", Vec::new()).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn missing_or_corrupt_entry_yields_default() {
        let repo = Repository::new(MemoryStore::new());
        assert_eq!(repo.get("absent", 7u32).unwrap(), 7);

        repo.store().save("broken", "value = [").unwrap();
        assert_eq!(repo.get("broken", 3u32).unwrap(), 3);
    }

    #[test]
    fn update_applies_on_top_of_stored_value() {
        let repo = Repository::new(MemoryStore::new());
        repo.update("counter", 0u32, |n| *n += 2).unwrap();
        let seen = repo.update("counter", 0u32, |n| {
            *n += 3;
            *n
        });
        assert_eq!(seen.unwrap(), 5);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(FileStore::new(dir.path()));
        repo.update(HISTORY_KEY, Vec::<u32>::new(), |days| days.push(42))
            .unwrap();

        let reopened = Repository::new(FileStore::new(dir.path()));
        let days: Vec<u32> = reopened.get(HISTORY_KEY, Vec::new()).unwrap();
        assert_eq!(days, vec![42]);
        assert!(dir.path().join("reading-history.toml").exists());
        assert!(FileStore::new(dir.path()).load("unknown").unwrap().is_none());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.save("../escape", "x").is_err());
        assert!(store.load("").is_err());
    }
}

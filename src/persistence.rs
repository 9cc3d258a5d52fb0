use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use crate::config::DEFAULT_MARK_SIZE;
use crate::models::{LedgerRecord, LedgerSettings, Mark};

/// String key-value backend for the snapshot document.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read state from {}", path.display())),
        }
    }

    /// Writes a sibling temp file and renames it over the target, so a failed
    /// write leaves the previous document in place.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(value.as_bytes())?;
            file.sync_all()
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err)
                .with_context(|| format!("Failed to write state to {}", tmp.display()));
        }
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace state at {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove state at {}", path.display())),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.data.read().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.data.write().map_err(|_| anyhow!("memory store poisoned"))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.data.write().map_err(|_| anyhow!("memory store poisoned"))?;
        guard.remove(key);
        Ok(())
    }
}

/// Durable fields of a session, in the stored document layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSnapshot {
    pub uploaded_image: Option<String>,
    pub marks: Vec<Mark>,
    pub mark_size: f64,
    pub ledger_enabled: bool,
    pub ledger_records: Vec<LedgerRecord>,
    pub pending_records: Vec<LedgerRecord>,
    pub ledger_settings: LedgerSettings,
    pub chases_count: u64,
    pub bags_count: u64,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            uploaded_image: None,
            marks: Vec::new(),
            mark_size: DEFAULT_MARK_SIZE,
            ledger_enabled: false,
            ledger_records: Vec::new(),
            pending_records: Vec::new(),
            ledger_settings: LedgerSettings::default(),
            chases_count: 0,
            bags_count: 0,
        }
    }
}

/// Mirrors the snapshot into a store under one fixed key.
///
/// Store and parse failures are logged and swallowed: a failed load yields the
/// default snapshot, a failed save is skipped.
pub struct PersistenceMirror<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PersistenceMirror<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load(&self) -> PersistedSnapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => PersistedSnapshot::default(),
            Err(err) => {
                warn!("Ignoring saved state under '{}': {err:#}", self.key);
                PersistedSnapshot::default()
            }
        }
    }

    pub fn save(&self, snapshot: &PersistedSnapshot) -> bool {
        match Self::encode(snapshot) {
            Some(document) => self.write(&document),
            None => false,
        }
    }

    /// Serializes a snapshot into the stored document form.
    pub fn encode(snapshot: &PersistedSnapshot) -> Option<String> {
        match serde_json::to_string(snapshot) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!("Skipping state save: {err}");
                None
            }
        }
    }

    /// Stores a document produced by [`PersistenceMirror::encode`].
    pub fn write(&self, document: &str) -> bool {
        match self.store.set(&self.key, document) {
            Ok(()) => true,
            Err(err) => {
                warn!("Skipping state save under '{}': {err:#}", self.key);
                false
            }
        }
    }

    pub fn clear(&self) -> bool {
        match self.store.remove(&self.key) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to clear saved state under '{}': {err:#}", self.key);
                false
            }
        }
    }

    fn try_load(&self) -> Result<Option<PersistedSnapshot>> {
        let Some(contents) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let snapshot = serde_json::from_str(&contents).context("saved state is not valid")?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BorderColor, Position, RecordStatus};
    use tempfile::tempdir;

    const KEY: &str = "test-state";

    fn sample() -> PersistedSnapshot {
        PersistedSnapshot {
            uploaded_image: Some("data:image/png;base64,AAAA".into()),
            marks: vec![Mark {
                id: 7,
                x_percent: 12.5,
                y_percent: 40.0,
                size_units: 6.0,
                border_color: BorderColor::Red,
            }],
            mark_size: 6.0,
            ledger_enabled: true,
            ledger_records: vec![LedgerRecord {
                id: 2,
                name: "Ann".into(),
                number: "12".into(),
                position: Position::Left,
                created_at_ms: 2,
                status: RecordStatus::Hit,
            }],
            pending_records: vec![LedgerRecord {
                id: 3,
                name: "Bo".into(),
                number: "4".into(),
                position: Position::Right,
                created_at_ms: 3,
                status: RecordStatus::Pending,
            }],
            ledger_settings: LedgerSettings::default(),
            chases_count: 3,
            bags_count: 1,
        }
    }

    #[test]
    fn round_trip_through_fresh_mirror() {
        let dir = tempdir().unwrap();
        let snapshot = sample();
        PersistenceMirror::new(FileStore::new(dir.path()).unwrap(), KEY).save(&snapshot);

        let reopened = PersistenceMirror::new(FileStore::new(dir.path()).unwrap(), KEY);
        assert_eq!(reopened.load(), snapshot);
    }

    #[test]
    fn missing_or_malformed_state_loads_default() {
        let mirror = PersistenceMirror::new(MemoryStore::new(), KEY);
        assert_eq!(mirror.load(), PersistedSnapshot::default());

        mirror.store().set(KEY, "{not json").unwrap();
        assert_eq!(mirror.load(), PersistedSnapshot::default());
    }

    #[test]
    fn document_uses_camel_case_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        for field in [
            "uploadedImage",
            "marks",
            "markSize",
            "ledgerEnabled",
            "ledgerRecords",
            "pendingRecords",
            "ledgerSettings",
            "chasesCount",
            "bagsCount",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["ledgerRecords"][0]["position"], "L");
        assert_eq!(value["ledgerRecords"][0]["status"], "hit");
        assert_eq!(value["ledgerSettings"]["flashFrequencySec"], 10);
        assert_eq!(value["marks"][0]["xPercent"], 12.5);
    }

    #[test]
    fn clear_removes_key() {
        let dir = tempdir().unwrap();
        let mirror = PersistenceMirror::new(FileStore::new(dir.path()).unwrap(), KEY);
        mirror.save(&sample());
        assert!(mirror.clear());
        assert!(mirror.store().get(KEY).unwrap().is_none());
        assert!(mirror.clear());
        assert_eq!(mirror.load(), PersistedSnapshot::default());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let mirror = PersistenceMirror::new(MemoryStore::new(), KEY);
        mirror.store().set(KEY, r#"{"chasesCount":4}"#).unwrap();
        let loaded = mirror.load();
        assert_eq!(loaded.chases_count, 4);
        assert_eq!(loaded.mark_size, DEFAULT_MARK_SIZE);
    }

    #[test]
    fn failed_write_keeps_previous_document() {
        let dir = tempdir().unwrap();
        let mirror = PersistenceMirror::new(FileStore::new(dir.path()).unwrap(), KEY);
        let saved = sample();
        assert!(mirror.save(&saved));

        // A directory squatting on the temp path makes the next write fail.
        let tmp = dir.path().join(format!("{KEY}.json.tmp"));
        fs::create_dir(&tmp).unwrap();
        let mut newer = sample();
        newer.chases_count = 99;
        assert!(!mirror.save(&newer));
        assert_eq!(mirror.load(), saved);

        fs::remove_dir(&tmp).unwrap();
        assert!(mirror.save(&newer));
        assert_eq!(mirror.load().chases_count, 99);
        assert!(!tmp.exists());
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed [`LocalStore`].
//!
//! The whole store is one JSON document:
//!
//! ```json
//! {"collections": {"prompts": [...]}, "settings": {...}, "lastModified": "..."}
//! ```
//!
//! Every read goes to disk, so edits made to the file by hand are picked up
//! by the next sync. Writes replace the file atomically and stamp
//! `lastModified` with the current time.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use psync_core::{ClockSource, LocalStore, Record, Result, Settings, SystemClock};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Record>>,
    #[serde(default)]
    settings: Settings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_modified: Option<DateTime<Utc>>,
}

/// A local store persisted as a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    clock: Arc<dyn ClockSource>,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store at `path`. The file is created on first write.
    ///
    /// Fails if the file exists but is not a valid store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens the store at `path`, stamping writes with `clock`.
    pub fn open_with_clock(path: impl Into<PathBuf>, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let store = JsonFileStore { path: path.into(), clock, lock: Mutex::new(()) };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreFile> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, file: &StoreFile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(file)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(StoreFile) -> T) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(self.load()?))
    }

    fn update(&self, f: impl FnOnce(&mut StoreFile)) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = self.load()?;
        f(&mut file);
        self.save(&file)
    }
}

impl LocalStore for JsonFileStore {
    fn get(&self, collection: &str) -> Result<Vec<Record>> {
        self.read(|mut file| file.collections.remove(collection).unwrap_or_default())
    }

    fn set(&self, collection: &str, records: Vec<Record>) -> Result<()> {
        let now = self.clock.now();
        self.update(|file| {
            file.last_modified = Some(now);
            if records.is_empty() {
                file.collections.remove(collection);
            } else {
                file.collections.insert(collection.to_string(), records);
            }
        })
    }

    fn get_settings(&self) -> Result<Settings> {
        self.read(|file| file.settings)
    }

    fn set_settings(&self, settings: Settings) -> Result<()> {
        let now = self.clock.now();
        self.update(|file| {
            file.settings = settings;
            file.last_modified = Some(now);
        })
    }

    fn collections(&self) -> Result<Vec<String>> {
        self.read(|file| file.collections.into_keys().collect())
    }

    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.read(|file| file.last_modified)
    }

    fn set_last_modified(&self, at: DateTime<Utc>) -> Result<()> {
        self.update(|file| file.last_modified = Some(at))
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore").field("path", &self.path).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

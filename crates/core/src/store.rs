// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local store interface.
//!
//! The sync engine never touches persistence directly; it goes through
//! [`LocalStore`], a key/value view over named collections plus one settings
//! mapping. [`MemoryStore`] is the in-process implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::clock::ClockSource;
use crate::error::Result;
use crate::record::Record;
use crate::snapshot::{Collections, Settings, Snapshot, Source};

/// Storage the sync engine reads from and writes to.
pub trait LocalStore: Send + Sync {
    /// Returns all records of a collection, empty if it does not exist.
    fn get(&self, collection: &str) -> Result<Vec<Record>>;

    /// Replaces all records of a collection.
    ///
    /// Stores that track [`last_modified`](Self::last_modified) stamp it here.
    fn set(&self, collection: &str, records: Vec<Record>) -> Result<()>;

    /// Returns the settings mapping.
    fn get_settings(&self) -> Result<Settings>;

    /// Replaces the settings mapping.
    ///
    /// Settings carry no timestamps of their own, so a settings-only edit
    /// moves the snapshot time only if the store stamps it here.
    fn set_settings(&self, settings: Settings) -> Result<()>;

    /// Names of the collections currently held, beyond any configured ones.
    fn collections(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Time of the last mutation, if the store tracks it.
    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }

    /// Records the time of the last mutation.
    fn set_last_modified(&self, _at: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
}

/// Reads the store into a snapshot.
///
/// Covers every name in `collections` plus whatever the store reports. The
/// snapshot time is the later of the store's last mutation and the newest
/// record, or the Unix epoch for an empty store that tracks nothing.
pub fn read_snapshot(
    store: &dyn LocalStore,
    collections: &[String],
    source: Source,
) -> Result<Snapshot> {
    let mut records = Collections::new();
    for name in collection_names(store, collections)? {
        let list = store.get(&name)?;
        records.insert(name, list);
    }
    let settings = store.get_settings()?;

    let newest_record = records.values().flatten().map(|r| r.updated_at).max();
    let last_modified = match (store.last_modified()?, newest_record) {
        (Some(stamp), Some(record)) => stamp.max(record),
        (Some(at), None) | (None, Some(at)) => at,
        (None, None) => DateTime::UNIX_EPOCH,
    };

    Ok(Snapshot::new(source, last_modified, records, settings))
}

/// Writes a snapshot into the store.
///
/// Known collections the snapshot does not hold are emptied, so reading the
/// store back yields exactly the snapshot's content. The store's timestamp
/// ends at the snapshot's `lastModified`, overriding the stamps of the
/// individual writes.
pub fn apply_snapshot(
    store: &dyn LocalStore,
    snapshot: &Snapshot,
    collections: &[String],
) -> Result<()> {
    for name in collection_names(store, collections)? {
        if !snapshot.records().contains_key(&name) {
            store.set(&name, Vec::new())?;
        }
    }
    for (name, records) in snapshot.records() {
        store.set(name, records.clone())?;
    }
    store.set_settings(snapshot.settings().clone())?;
    store.set_last_modified(snapshot.last_modified())?;
    Ok(())
}

/// Configured collection names followed by any others the store reports.
fn collection_names(store: &dyn LocalStore, configured: &[String]) -> Result<Vec<String>> {
    let mut names = configured.to_vec();
    for name in store.collections()? {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<String, Vec<Record>>,
    settings: Settings,
    last_modified: Option<DateTime<Utc>>,
}

/// Thread-safe in-memory store.
///
/// A store built with a clock stamps `last_modified` on every write.
/// Without one, edits are dated by their records' `updatedAt` alone.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    clock: Option<Arc<dyn ClockSource>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { state: Mutex::new(MemoryState::default()), clock: None }
    }

    /// Creates an empty store that stamps writes with `clock`.
    pub fn with_clock(clock: Arc<dyn ClockSource>) -> Self {
        MemoryStore { state: Mutex::new(MemoryState::default()), clock: Some(clock) }
    }

    /// Creates a store holding a snapshot's content.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let store = Self::new();
        store.load(snapshot);
        store
    }

    /// Creates a store holding a snapshot's content, stamping later writes
    /// with `clock`.
    pub fn from_snapshot_with_clock(snapshot: &Snapshot, clock: Arc<dyn ClockSource>) -> Self {
        let store = Self::with_clock(clock);
        store.load(snapshot);
        store
    }

    fn load(&self, snapshot: &Snapshot) {
        let (collections, settings) = snapshot.clone().into_parts();
        *self.lock() = MemoryState {
            collections,
            settings,
            last_modified: Some(snapshot.last_modified()),
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, f: impl FnOnce(&mut MemoryState)) {
        let now = self.clock.as_ref().map(|clock| clock.now());
        let mut state = self.lock();
        f(&mut state);
        if now.is_some() {
            state.last_modified = now;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").field("state", &*self.lock()).finish_non_exhaustive()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, collection: &str) -> Result<Vec<Record>> {
        Ok(self.lock().collections.get(collection).cloned().unwrap_or_default())
    }

    fn set(&self, collection: &str, records: Vec<Record>) -> Result<()> {
        self.write(|state| {
            if records.is_empty() {
                state.collections.remove(collection);
            } else {
                state.collections.insert(collection.to_string(), records);
            }
        });
        Ok(())
    }

    fn get_settings(&self) -> Result<Settings> {
        Ok(self.lock().settings.clone())
    }

    fn set_settings(&self, settings: Settings) -> Result<()> {
        self.write(|state| state.settings = settings);
        Ok(())
    }

    fn collections(&self) -> Result<Vec<String>> {
        Ok(self.lock().collections.keys().cloned().collect())
    }

    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock().last_modified)
    }

    fn set_last_modified(&self, at: DateTime<Utc>) -> Result<()> {
        self.lock().last_modified = Some(at);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

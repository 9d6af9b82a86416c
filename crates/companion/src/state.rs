// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Companion state management.
//!
//! Holds the companion's current snapshot, optionally persisted to a JSON
//! file, and fans out change notifications to connected clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use psync_core::protocol::CompanionEvent;
use psync_core::{Result, Snapshot, Source};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// File the snapshot is persisted to inside the data directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Shared companion state.
#[derive(Clone)]
pub struct CompanionState {
    inner: Arc<CompanionStateInner>,
}

struct CompanionStateInner {
    snapshot: RwLock<Snapshot>,
    /// Notifies every connection of changes.
    broadcast_tx: broadcast::Sender<CompanionEvent>,
    /// Where to persist the snapshot, if anywhere.
    snapshot_path: Option<PathBuf>,
}

impl CompanionState {
    /// Creates state holding an empty snapshot, kept in memory only.
    pub fn in_memory(source: Source) -> Self {
        Self::with_snapshot(Snapshot::empty(source, Utc::now()), None)
    }

    /// Opens state persisted under `data_dir`, loading any saved snapshot.
    pub fn open(data_dir: &Path, source: Source) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(SNAPSHOT_FILE);
        let snapshot = if path.exists() {
            Snapshot::from_json(&std::fs::read_to_string(&path)?)?
        } else {
            Snapshot::empty(source, Utc::now())
        };
        Ok(Self::with_snapshot(snapshot, Some(path)))
    }

    fn with_snapshot(snapshot: Snapshot, snapshot_path: Option<PathBuf>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(64);
        CompanionState {
            inner: Arc::new(CompanionStateInner {
                snapshot: RwLock::new(snapshot),
                broadcast_tx,
                snapshot_path,
            }),
        }
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.read().await.clone()
    }

    /// Replaces the snapshot, persists it, and notifies every connection.
    ///
    /// Returns false, without notifying, if the content did not change.
    pub async fn replace(&self, snapshot: Snapshot) -> Result<bool> {
        let mut current = self.inner.snapshot.write().await;
        let changed = !current.content_equals(&snapshot);

        if let Some(path) = &self.inner.snapshot_path {
            std::fs::write(path, snapshot.to_json()?)?;
        }
        *current = snapshot.clone();
        drop(current);

        if changed {
            debug!(checksum = snapshot.checksum(), "snapshot replaced");
            let _ = self.inner.broadcast_tx.send(CompanionEvent::data_changed(snapshot));
        }
        Ok(changed)
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CompanionEvent> {
        self.inner.broadcast_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations.

pub mod push;
pub mod resolve;
pub mod status;
pub mod sync;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use psync_client::{SyncConfig, SyncOrchestrator};
use tracing::debug;

use crate::config::ConfigFile;
use crate::error::{Error, Result};
use crate::store::JsonFileStore;

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub sync: SyncConfig,
    pub store_path: PathBuf,
    pub connect_timeout: Duration,
}

impl Context {
    /// Loads the config file (or defaults) and applies command line overrides.
    pub fn load(config_path: Option<&Path>, url: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => ConfigFile::default_path()?,
        };
        debug!(path = %path.display(), "loading config");
        let mut file = ConfigFile::load(&path)?;
        if let Some(url) = url {
            file.sync.url = url.to_string();
        }

        Ok(Context {
            sync: file.to_sync_config()?,
            store_path: file.store_path()?,
            connect_timeout: file.connect_timeout(),
        })
    }

    pub fn open_store(&self) -> Result<Arc<JsonFileStore>> {
        Ok(Arc::new(JsonFileStore::open(&self.store_path)?))
    }

    /// Starts an orchestrator without waiting for the link.
    ///
    /// One-shot commands drive syncs themselves, so auto-sync is off unless
    /// `auto_sync` is set.
    pub fn start(&self, store: Arc<JsonFileStore>, auto_sync: Option<Duration>) -> SyncOrchestrator {
        let config = SyncConfig { auto_sync_interval: auto_sync, ..self.sync.clone() };
        SyncOrchestrator::connect(config, store)
    }

    /// Starts an orchestrator and waits for the companion to answer.
    pub async fn connect(&self, store: Arc<JsonFileStore>) -> Result<SyncOrchestrator> {
        let orchestrator = self.start(store, None);
        if orchestrator.wait_connected(self.connect_timeout).await.is_err() {
            orchestrator.shutdown().await;
            return Err(Error::unreachable(&self.sync.url));
        }
        Ok(orchestrator)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

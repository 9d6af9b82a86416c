// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command line configuration.
//!
//! Stored as TOML, by default in `<config dir>/psync/config.toml`:
//!
//! ```toml
//! store_path = "store.json"
//!
//! [sync]
//! url = "ws://127.0.0.1:9427"
//! request_timeout_secs = 10
//! reconnect_delay_secs = 5
//! connect_timeout_secs = 5
//! conflict_window_ms = 1000
//! auto_sync_interval_secs = 30   # 0 disables auto-sync
//! collections = ["prompts", "categories"]
//! source = "extension"
//! ```
//!
//! Every key is optional. A missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use psync_client::SyncConfig;
use psync_core::Source;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "psync";
const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "store.json";

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Local store location. Relative paths are resolved against the
    /// config file's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Companion link settings.
    pub sync: SyncSection,
}

/// The `[sync]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub url: String,
    pub request_timeout_secs: u64,
    pub reconnect_delay_secs: u64,
    /// How long one-shot commands wait for the first connection.
    pub connect_timeout_secs: u64,
    pub conflict_window_ms: u64,
    /// 0 = disabled.
    pub auto_sync_interval_secs: u64,
    pub collections: Vec<String>,
    pub source: Source,
}

impl Default for SyncSection {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        SyncSection {
            url: defaults.url,
            request_timeout_secs: defaults.request_timeout.as_secs(),
            reconnect_delay_secs: defaults.reconnect_delay.as_secs(),
            connect_timeout_secs: 5,
            conflict_window_ms: defaults.conflict_window.as_millis() as u64,
            auto_sync_interval_secs: defaults.auto_sync_interval.map_or(0, |d| d.as_secs()),
            collections: defaults.collections,
            source: defaults.source,
        }
    }
}

impl ConfigFile {
    /// Default config file location.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(Error::NoConfigDir)?;
        Ok(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config file at `path`, or defaults if it does not exist.
    ///
    /// A relative `store_path` is made absolute against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let mut config: ConfigFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        if let (Some(store), Some(base)) = (&config.store_path, path.parent()) {
            if store.is_relative() {
                config.store_path = Some(base.join(store));
            }
        }
        Ok(config)
    }

    /// Writes the config file, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Local store location, falling back to `<data dir>/psync/store.json`.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => {
                let dir = dirs::data_dir().ok_or(Error::NoConfigDir)?;
                Ok(dir.join(APP_DIR_NAME).join(STORE_FILE_NAME))
            }
        }
    }

    /// How long one-shot commands wait for the companion.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.connect_timeout_secs)
    }

    /// Validates the `[sync]` table and converts it to the library config.
    pub fn to_sync_config(&self) -> Result<SyncConfig> {
        let sync = &self.sync;
        if !sync.url.starts_with("ws://") && !sync.url.starts_with("wss://") {
            return Err(Error::Config(format!(
                "invalid url '{}'\n  hint: the companion url must start with ws:// or wss://",
                sync.url
            )));
        }
        if sync.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be at least 1".to_string()));
        }
        if sync.collections.is_empty() {
            return Err(Error::Config("collections must name at least one collection".to_string()));
        }

        Ok(SyncConfig {
            url: sync.url.clone(),
            request_timeout: Duration::from_secs(sync.request_timeout_secs),
            reconnect_delay: Duration::from_secs(sync.reconnect_delay_secs),
            conflict_window: Duration::from_millis(sync.conflict_window_ms),
            auto_sync_interval: match sync.auto_sync_interval_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            collections: sync.collections.clone(),
            source: sync.source,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

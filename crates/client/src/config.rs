// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration for the orchestrator.

use std::time::Duration;

use psync_core::{Source, DEFAULT_CONFLICT_WINDOW};

use crate::channel::{ChannelConfig, DEFAULT_RECONNECT_DELAY};
use crate::rpc::DEFAULT_REQUEST_TIMEOUT;

/// Default companion endpoint.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:9427";

/// Default auto-sync period.
pub const DEFAULT_AUTO_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a [`SyncOrchestrator`](crate::SyncOrchestrator).
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// WebSocket URL of the companion.
    pub url: String,
    /// How long a request waits for its response.
    pub request_timeout: Duration,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Two snapshots modified within this span of each other conflict.
    pub conflict_window: Duration,
    /// Auto-sync period, started on every connect. `None` disables it.
    pub auto_sync_interval: Option<Duration>,
    /// Collections read from the local store.
    pub collections: Vec<String>,
    /// Which side of the link this process is.
    pub source: Source,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            url: DEFAULT_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            conflict_window: DEFAULT_CONFLICT_WINDOW,
            auto_sync_interval: Some(DEFAULT_AUTO_SYNC_INTERVAL),
            collections: vec!["prompts".to_string(), "categories".to_string()],
            source: Source::Extension,
        }
    }
}

impl SyncConfig {
    /// Default configuration pointed at `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        SyncConfig { url: url.into(), ..Self::default() }
    }

    pub(crate) fn channel(&self) -> ChannelConfig {
        ChannelConfig { url: self.url.clone(), reconnect_delay: self.reconnect_delay }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors the `psync` command line can report.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("no config directory on this platform\n  hint: pass --config <path>")]
    NoConfigDir,

    #[error(
        "companion not reachable at {url}\n  hint: is psync-companion running? try 'psync-companion --bind {addr}'"
    )]
    Unreachable { url: String, addr: String },

    #[error("no conflict to resolve\n  hint: local and companion data already agree")]
    NothingToResolve,

    #[error(transparent)]
    Sync(#[from] psync_client::SyncError),

    #[error(transparent)]
    Core(#[from] psync_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Unreachable-companion error with a bind address hint derived from `url`.
    pub fn unreachable(url: &str) -> Self {
        let addr = url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(url)
            .trim_end_matches('/')
            .to_string();
        Error::Unreachable { url: url.to_string(), addr }
    }
}

/// A specialized Result type for the `psync` command line.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

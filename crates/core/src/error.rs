// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for psync-core operations.

use thiserror::Error;

/// All possible errors that can occur in psync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid merge strategy: '{0}'\n  hint: valid strategies are: local, remote, merge")]
    InvalidStrategy(String),

    #[error("invalid source: '{0}'\n  hint: valid sources are: desktop, extension")]
    InvalidSource(String),

    #[error("unknown method: '{0}'\n  hint: valid methods are: getData, setData, ping")]
    UnknownMethod(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for psync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error type for sync operations.

use std::time::Duration;

use thiserror::Error;

use crate::transport::TransportError;

/// All possible errors that can occur while syncing.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("not connected to companion")]
    NotConnected,

    #[error("request '{method}' timed out after {}ms", timeout.as_millis())]
    Timeout { method: String, timeout: Duration },

    #[error("transport error: {}", cause.as_deref().unwrap_or("connection lost"))]
    Transport { cause: Option<String> },

    #[error("a conflict is pending\n  hint: resolve it with local, remote or merge first")]
    ConflictUnresolved,

    #[error("conflict resolved locally but write-back failed: {0}")]
    MergeWriteBackFailed(#[source] Box<SyncError>),

    #[error("no conflict to resolve")]
    NoPendingConflict,

    #[error("companion error: {0}")]
    Remote(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] psync_core::Error),
}

impl SyncError {
    /// Creates a transport error with a known cause.
    pub fn transport(cause: impl Into<String>) -> Self {
        SyncError::Transport { cause: Some(cause.into()) }
    }

    /// Returns true for failures of the link rather than of the data.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::NotConnected | SyncError::Timeout { .. } | SyncError::Transport { .. }
        )
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        SyncError::transport(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

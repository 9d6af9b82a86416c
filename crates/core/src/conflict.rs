// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict detection between a local and a remote snapshot.
//!
//! Decision rules, in order:
//! 1. Equal checksums: nothing to do.
//! 2. `|local.lastModified - remote.lastModified|` below the window: both
//!    sides were edited at nearly the same instant, surface a conflict.
//! 3. Otherwise the remote snapshot is applied locally.
//!
//! The window is a heuristic. A genuinely sequential edit inside the window is
//! reported as a conflict, and with clock skew between processes an older
//! remote can overwrite a newer local edit.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::snapshot::Snapshot;

/// Default conflict window.
pub const DEFAULT_CONFLICT_WINDOW: Duration = Duration::from_millis(1000);

/// What to do with a remote snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Content-equal; nothing to do.
    NoOp,
    /// Diverged too close together to pick a side automatically.
    Conflict,
    /// Remote is treated as newer and replaces local state.
    ApplyRemote,
}

/// Classifies pairs of snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictDetector {
    window: Duration,
}

impl ConflictDetector {
    /// Creates a detector with the given conflict window.
    pub fn new(window: Duration) -> Self {
        ConflictDetector { window }
    }

    /// The conflict window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decides what to do with `remote` given the current `local` state.
    pub fn detect(&self, local: &Snapshot, remote: &Snapshot) -> Outcome {
        if local.content_equals(remote) {
            return Outcome::NoOp;
        }

        let delta_ms = (local.last_modified() - remote.last_modified())
            .num_milliseconds()
            .unsigned_abs();
        if u128::from(delta_ms) < self.window.as_millis() {
            Outcome::Conflict
        } else {
            Outcome::ApplyRemote
        }
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_WINDOW)
    }
}

/// A pending divergence awaiting resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    /// State of this process when the conflict was detected.
    pub local: Snapshot,
    /// State reported by the companion.
    pub remote: Snapshot,
    /// When the conflict was detected.
    pub detected_at: DateTime<Utc>,
}

impl Conflict {
    pub fn new(local: Snapshot, remote: Snapshot, detected_at: DateTime<Utc>) -> Self {
        Conflict { local, remote, detected_at }
    }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;

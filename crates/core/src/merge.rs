// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution.
//!
//! Strategies:
//! - `local`: keep the local snapshot as-is
//! - `remote`: take the remote snapshot as-is
//! - `merge`: reconcile record by record
//!
//! Merge rules:
//! - Records: union by id per collection; when both sides hold an id, the copy
//!   with the strictly newer `updatedAt` wins and ties keep local
//! - Records present on one side only are always kept (absence never deletes)
//! - Settings: taken wholesale from the snapshot with the newer
//!   `lastModified`, ties keep local
//! - The result is stamped with the resolution time
//!
//! Merging is deterministic: the same inputs always give the same output.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::Conflict;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::snapshot::{Collections, Snapshot};

/// How to resolve a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Keep local state and push it to the companion.
    Local,
    /// Accept the companion's state.
    Remote,
    /// Record-level reconciliation.
    Merge,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Local => "local",
            Strategy::Remote => "remote",
            Strategy::Merge => "merge",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Strategy::Local),
            "remote" => Ok(Strategy::Remote),
            "merge" => Ok(Strategy::Merge),
            _ => Err(Error::InvalidStrategy(s.to_string())),
        }
    }
}

/// Resolves a conflict into a single snapshot.
///
/// `now` stamps merged snapshots; `local` and `remote` return their side
/// unchanged.
pub fn resolve(conflict: &Conflict, strategy: Strategy, now: DateTime<Utc>) -> Snapshot {
    match strategy {
        Strategy::Local => conflict.local.clone(),
        Strategy::Remote => conflict.remote.clone(),
        Strategy::Merge => merge_snapshots(&conflict.local, &conflict.remote, now),
    }
}

/// Reconciles two snapshots record by record.
///
/// The result is attributed to the local snapshot's source.
pub fn merge_snapshots(local: &Snapshot, remote: &Snapshot, now: DateTime<Utc>) -> Snapshot {
    let mut records = Collections::new();
    for name in local.records().keys().chain(remote.records().keys()) {
        if records.contains_key(name) {
            continue;
        }
        let merged = merge_records(local.collection(name), remote.collection(name));
        records.insert(name.clone(), merged);
    }

    let settings = if remote.last_modified() > local.last_modified() {
        remote.settings().clone()
    } else {
        local.settings().clone()
    };

    Snapshot::new(local.source(), now, records, settings)
}

/// Unions two record lists by id.
///
/// Output order is local order followed by remote-only records in remote
/// order. A remote copy replaces the local one in place only if it is
/// strictly newer.
pub fn merge_records(local: &[Record], remote: &[Record]) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(local.len() + remote.len());

    for record in local.iter().chain(remote) {
        match index.get(record.id.as_str()) {
            Some(&pos) => {
                if record.is_newer_than(&merged[pos]) {
                    merged[pos] = record.clone();
                }
            }
            None => {
                index.insert(record.id.as_str(), merged.len());
                merged.push(record.clone());
            }
        }
    }

    merged
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;

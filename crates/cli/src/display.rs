// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable and JSON renderings of sync state.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use psync_client::{SyncEvent, SyncOutcome, SyncState, SyncStatus};
use psync_core::{Conflict, Snapshot};
use serde::Serialize;

const CONFLICT_HINT: &str = "hint: run 'psync resolve <local|remote|merge>' to settle it";

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn record_count(snapshot: &Snapshot) -> usize {
    snapshot.records().values().map(Vec::len).sum()
}

/// One-line summary of a snapshot's content.
pub fn snapshot_summary(snapshot: &Snapshot) -> String {
    let records = record_count(snapshot);
    let collections = snapshot.records().len();
    let settings = snapshot.settings().len();
    format!(
        "{} record{} in {} collection{}, {} setting{}, modified {}",
        records,
        if records == 1 { "" } else { "s" },
        collections,
        if collections == 1 { "" } else { "s" },
        settings,
        if settings == 1 { "" } else { "s" },
        timestamp(snapshot.last_modified()),
    )
}

/// What a sync did, as a sentence.
pub fn outcome_message(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Unchanged => "Already in sync",
        SyncOutcome::AppliedRemote => "Applied companion data",
        SyncOutcome::Conflict => "Conflict detected",
    }
}

/// Both sides of a conflict plus how to settle it.
pub fn format_conflict(conflict: &Conflict) -> String {
    let gap = (conflict.local.last_modified() - conflict.remote.last_modified())
        .num_milliseconds()
        .abs();
    format!(
        "  local:  {}\n  remote: {}\n  edited {} ms apart\n{}",
        snapshot_summary(&conflict.local),
        snapshot_summary(&conflict.remote),
        gap,
        CONFLICT_HINT,
    )
}

/// One line per event, for `psync watch`.
pub fn format_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Connected => "connected".to_string(),
        SyncEvent::Disconnected { cause: None } => "disconnected".to_string(),
        SyncEvent::Disconnected { cause: Some(cause) } => format!("disconnected: {}", cause),
        SyncEvent::DataChanged { snapshot } => {
            format!("local data replaced: {}", snapshot_summary(snapshot))
        }
        SyncEvent::ConflictDetected { conflict } => {
            format!("conflict detected\n{}", format_conflict(conflict))
        }
        SyncEvent::DataSynced { at } => format!("in sync at {}", timestamp(*at)),
        SyncEvent::Error { operation, message } => format!("error ({}): {}", operation, message),
    }
}

/// Everything `psync status` reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport<'a> {
    pub url: &'a str,
    pub state: SyncState,
    #[serde(flatten)]
    pub status: &'a SyncStatus,
    pub store_path: &'a Path,
    pub local: LocalSummary,
}

/// Counts describing the local store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSummary {
    pub collections: BTreeMap<String, usize>,
    pub settings: usize,
    pub last_modified: DateTime<Utc>,
    pub checksum: String,
}

impl LocalSummary {
    pub fn of(snapshot: &Snapshot) -> Self {
        LocalSummary {
            collections: snapshot
                .records()
                .iter()
                .map(|(name, records)| (name.clone(), records.len()))
                .collect(),
            settings: snapshot.settings().len(),
            last_modified: snapshot.last_modified(),
            checksum: snapshot.checksum().to_string(),
        }
    }
}

impl StatusReport<'_> {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Companion: {} ({})\n", self.url, self.state));
        if let Some(at) = self.status.last_sync_timestamp {
            out.push_str(&format!("Last sync: {}\n", timestamp(at)));
        }
        if self.status.has_conflicts {
            out.push_str(&format!("Conflict:  pending\n{}\n", CONFLICT_HINT));
        }
        if let Some(error) = &self.status.last_error {
            out.push_str(&format!("Error:     {}\n", error));
        }
        out.push_str(&format!("Store:     {}\n", self.store_path.display()));
        for (name, count) in &self.local.collections {
            out.push_str(&format!("  {}: {}\n", name, count));
        }
        out.push_str(&format!("  settings: {}\n", self.local.settings));
        out.push_str(&format!("  modified: {}\n", timestamp(self.local.last_modified)));
        out
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;

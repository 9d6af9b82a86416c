// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use psync_client::Operation;
use psync_core::{Collections, Record, Settings, Source};
use serde_json::json;
use similar_asserts::assert_eq;
use yare::parameterized;

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

fn snapshot(ms: i64, prompts: usize, settings: usize) -> Snapshot {
    let mut records = Collections::new();
    records.insert(
        "prompts".to_string(),
        (0..prompts).map(|i| Record::new(format!("p{i}"), at(ms))).collect(),
    );
    let settings: Settings = (0..settings).map(|i| (format!("k{i}"), json!(i))).collect();
    Snapshot::new(Source::Desktop, at(ms), records, settings)
}

#[parameterized(
    plural = { 3, 2, "3 records in 1 collection, 2 settings" },
    singular = { 1, 1, "1 record in 1 collection, 1 setting" },
    empty = { 0, 0, "0 records in 0 collections, 0 settings" },
)]
fn summary_counts(prompts: usize, settings: usize, expected: &str) {
    let summary = snapshot_summary(&snapshot(0, prompts, settings));
    assert!(summary.starts_with(expected), "{summary}");
    assert!(summary.ends_with("modified 1970-01-01T00:00:00.000Z"), "{summary}");
}

#[test]
fn conflict_shows_gap_and_hint() {
    let conflict = Conflict::new(snapshot(1_200, 2, 0), snapshot(1_000, 1, 0), at(5_000));
    let text = format_conflict(&conflict);
    assert!(text.contains("local:  2 records"));
    assert!(text.contains("remote: 1 record "));
    assert!(text.contains("edited 200 ms apart"));
    assert!(text.contains("psync resolve"));
}

#[parameterized(
    connected = { SyncEvent::Connected, "connected" },
    clean_close = { SyncEvent::Disconnected { cause: None }, "disconnected" },
    lost = { SyncEvent::Disconnected { cause: Some("reset".into()) }, "disconnected: reset" },
    synced = { SyncEvent::DataSynced { at: at(1_500) }, "in sync at 1970-01-01T00:00:01.500Z" },
    error = {
        SyncEvent::Error { operation: Operation::AutoSync, message: "timed out".into() },
        "error (auto-sync): timed out"
    },
)]
fn event_lines(event: SyncEvent, expected: &str) {
    super::assert_eq!(format_event(&event), expected);
}

#[test]
fn status_text_lists_store_contents() {
    let local = snapshot(2_000, 2, 1);
    let status = SyncStatus {
        connected: true,
        last_sync_timestamp: Some(at(3_000)),
        has_conflicts: true,
        last_error: Some("boom".into()),
    };
    let report = StatusReport {
        url: "ws://127.0.0.1:9427",
        state: SyncState::ConflictPending,
        status: &status,
        store_path: Path::new("/tmp/store.json"),
        local: LocalSummary::of(&local),
    };

    let text = report.to_text();
    assert!(text.starts_with("Companion: ws://127.0.0.1:9427 (conflict pending)\n"));
    assert!(text.contains("Last sync: 1970-01-01T00:00:03.000Z"));
    assert!(text.contains("Conflict:  pending"));
    assert!(text.contains("Error:     boom"));
    assert!(text.contains("Store:     /tmp/store.json"));
    assert!(text.contains("  prompts: 2\n"));
    assert!(text.contains("  settings: 1\n"));
}

#[test]
fn status_json_flattens_sync_status() {
    let local = snapshot(2_000, 1, 0);
    let status = SyncStatus::default();
    let report = StatusReport {
        url: "ws://h:1",
        state: SyncState::Disconnected,
        status: &status,
        store_path: Path::new("s.json"),
        local: LocalSummary::of(&local),
    };

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["url"], json!("ws://h:1"));
    assert_eq!(value["state"], json!("disconnected"));
    assert_eq!(value["connected"], json!(false));
    assert_eq!(value["hasConflicts"], json!(false));
    assert_eq!(value["lastSyncTimestamp"], json!(null));
    assert_eq!(value["storePath"], json!("s.json"));
    assert_eq!(value["local"]["collections"]["prompts"], json!(1));
    assert_eq!(value["local"]["checksum"], json!(local.checksum()));
}

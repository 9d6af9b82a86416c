// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::record::Record;
use crate::snapshot::{Collections, Settings, Source};
use yare::parameterized;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

fn with_title(source: Source, last_modified_ms: i64, title: &str) -> Snapshot {
    let mut records = Collections::new();
    records.insert(
        "prompts".into(),
        vec![Record::new("p1", at(last_modified_ms)).with_field("title", title)],
    );
    Snapshot::new(source, at(last_modified_ms), records, Settings::new())
}

#[parameterized(
    same_instant = { 0 },
    far_apart = { 60_000 },
    just_under_window = { 999 },
)]
fn equal_content_is_noop_regardless_of_time(delta_ms: i64) {
    let detector = ConflictDetector::default();
    let local = with_title(Source::Extension, 10_000, "A");
    let remote = with_title(Source::Desktop, 10_000, "A").with_last_modified(at(10_000 + delta_ms));
    assert_eq!(detector.detect(&local, &remote), Outcome::NoOp);
}

#[parameterized(
    zero = { 0 },
    remote_later = { 200 },
    remote_earlier = { -200 },
    edge_below = { 999 },
    edge_below_negative = { -999 },
)]
fn diverged_within_window_is_conflict(delta_ms: i64) {
    let detector = ConflictDetector::default();
    let local = with_title(Source::Extension, 10_000, "A");
    let remote = with_title(Source::Desktop, 10_000 + delta_ms, "B");
    assert_eq!(detector.detect(&local, &remote), Outcome::Conflict);
}

#[parameterized(
    edge = { 1_000 },
    edge_negative = { -1_000 },
    remote_much_later = { 5_000 },
    remote_much_earlier = { -10_000 },
)]
fn diverged_outside_window_applies_remote(delta_ms: i64) {
    let detector = ConflictDetector::default();
    let local = with_title(Source::Extension, 10_000, "A");
    let remote = with_title(Source::Desktop, 10_000 + delta_ms, "B");
    assert_eq!(detector.detect(&local, &remote), Outcome::ApplyRemote);
}

#[test]
fn custom_window() {
    let detector = ConflictDetector::new(Duration::from_secs(10));
    let local = with_title(Source::Extension, 10_000, "A");
    let remote = with_title(Source::Desktop, 15_000, "B");
    assert_eq!(detector.window(), Duration::from_secs(10));
    assert_eq!(detector.detect(&local, &remote), Outcome::Conflict);
}

#[test]
fn zero_window_never_conflicts() {
    let detector = ConflictDetector::new(Duration::ZERO);
    let local = with_title(Source::Extension, 10_000, "A");
    let remote = with_title(Source::Desktop, 10_000, "B");
    assert_eq!(detector.detect(&local, &remote), Outcome::ApplyRemote);
}

#[test]
fn conflict_keeps_both_sides() {
    let local = with_title(Source::Extension, 10_000, "A");
    let remote = with_title(Source::Desktop, 10_200, "B");
    let conflict = Conflict::new(local.clone(), remote.clone(), at(11_000));
    assert_eq!(conflict.local, local);
    assert_eq!(conflict.remote, remote);
    assert_eq!(conflict.detected_at, at(11_000));
}

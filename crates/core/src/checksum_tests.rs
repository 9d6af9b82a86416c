// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::record::Record;
use chrono::{DateTime, Utc};
use serde_json::json;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

fn content() -> (Collections, Settings) {
    let mut records = Collections::new();
    records.insert(
        "prompts".into(),
        vec![
            Record::new("p1", at(1_000)).with_field("title", "A").with_field("content", "Hi {{name}}"),
            Record::new("p2", at(2_000)).with_field("title", "B"),
        ],
    );
    records.insert(
        "categories".into(),
        vec![Record::new("c1", at(500)).with_field("name", "Writing")],
    );
    let mut settings = Settings::new();
    settings.insert("theme".into(), json!("dark"));
    settings.insert("autoSync".into(), json!(true));
    (records, settings)
}

#[test]
fn fnv1a_known_vectors() {
    let mut empty = Fnv1a::new();
    empty.update(b"");
    assert_eq!(empty.finish(), 0xcbf2_9ce4_8422_2325);

    let mut a = Fnv1a::new();
    a.update(b"a");
    assert_eq!(a.finish(), 0xaf63_dc4c_8601_ec8c);

    let mut foobar = Fnv1a::new();
    foobar.update(b"foobar");
    assert_eq!(foobar.finish(), 0x8594_4171_f739_67e8);
}

#[test]
fn checksum_is_sixteen_hex_digits() {
    let (records, settings) = content();
    let digest = compute(&records, &settings);
    assert_eq!(digest.len(), 16);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn checksum_is_stable() {
    let (records, settings) = content();
    assert_eq!(compute(&records, &settings), compute(&records, &settings));

    let (again_records, again_settings) = content();
    assert_eq!(compute(&records, &settings), compute(&again_records, &again_settings));
}

#[test]
fn checksum_changes_on_record_field_edit() {
    let (records, settings) = content();
    let before = compute(&records, &settings);

    let mut edited = records.clone();
    edited.get_mut("prompts").unwrap()[0].fields.insert("title".into(), json!("A!"));
    assert_ne!(before, compute(&edited, &settings));
}

#[test]
fn checksum_changes_on_record_timestamp_edit() {
    let (records, settings) = content();
    let before = compute(&records, &settings);

    let mut edited = records.clone();
    edited.get_mut("prompts").unwrap()[1].updated_at = at(2_001);
    assert_ne!(before, compute(&edited, &settings));
}

#[test]
fn checksum_changes_on_settings_edit() {
    let (records, settings) = content();
    let before = compute(&records, &settings);

    let mut edited = settings.clone();
    edited.insert("theme".into(), json!("light"));
    assert_ne!(before, compute(&records, &edited));

    let mut added = settings.clone();
    added.insert("language".into(), json!("en"));
    assert_ne!(before, compute(&records, &added));
}

#[test]
fn checksum_changes_on_reorder() {
    let (records, settings) = content();
    let before = compute(&records, &settings);

    let mut reordered = records.clone();
    reordered.get_mut("prompts").unwrap().reverse();
    assert_ne!(before, compute(&reordered, &settings));
}

#[test]
fn checksum_changes_on_record_removal() {
    let (records, settings) = content();
    let before = compute(&records, &settings);

    let mut removed = records.clone();
    removed.get_mut("prompts").unwrap().pop();
    assert_ne!(before, compute(&removed, &settings));
}

struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("not representable"))
    }
}

#[test]
fn serialization_failure_still_digests() {
    let failed = digest(&Unserializable);
    assert_eq!(failed, digest(&Unserializable));
    assert_ne!(failed, Fnv1a::new().finish());
    assert_ne!(failed, digest(&json!({})));
}

#[test]
fn digest_matches_hashing_the_json_text() {
    let (records, settings) = content();
    let input = ChecksumInput { records: &records, settings: &settings };
    let mut expected = Fnv1a::new();
    expected.update(serde_json::to_string(&input).unwrap().as_bytes());
    assert_eq!(digest(&input), expected.finish());
}

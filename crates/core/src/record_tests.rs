// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

#[test]
fn record_fields_are_flattened_on_the_wire() {
    let record = Record::new("p1", at(1_000)).with_field("title", "Greeting");
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["id"], "p1");
    assert_eq!(value["title"], "Greeting");
    assert!(value.get("fields").is_none());
    assert!(value.get("updatedAt").is_some());
}

#[test]
fn record_parses_unknown_fields_into_fields() {
    let value = json!({
        "id": "p1",
        "updatedAt": "2026-01-01T00:00:00Z",
        "title": "Summarize",
        "tags": ["work"],
    });
    let record: Record = serde_json::from_value(value).unwrap();

    assert_eq!(record.id, "p1");
    assert_eq!(record.str_field("title"), Some("Summarize"));
    assert_eq!(record.field("tags"), Some(&json!(["work"])));
    assert_eq!(record.fields.len(), 2);
}

#[test]
fn record_newer_is_strict() {
    let old = Record::new("p1", at(1_000));
    let new = Record::new("p1", at(2_000));
    let same = Record::new("p1", at(1_000));

    assert!(new.is_newer_than(&old));
    assert!(!old.is_newer_than(&new));
    assert!(!same.is_newer_than(&old));
}

#[test]
fn record_missing_id_is_rejected() {
    let value = json!({ "updatedAt": "2026-01-01T00:00:00Z", "title": "x" });
    assert!(serde_json::from_value::<Record>(value).is_err());
}

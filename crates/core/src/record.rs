// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! A single synchronizable entity: a prompt template, a category, etc.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record within a snapshot collection.
///
/// Identity is the `id`; two records with the same id in different snapshots
/// are versions of the same entity. Everything other than `id` and
/// `updatedAt` lives in `fields` and is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable unique identifier within its collection.
    pub id: String,
    /// When this record was last modified.
    pub updated_at: DateTime<Utc>,
    /// Arbitrary typed fields (title, content, categoryId, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with no fields.
    pub fn new(id: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Record { id: id.into(), updated_at, fields: Map::new() }
    }

    /// Sets a field, returning the record.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns a field value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a field value if it is a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Returns true if this record was modified strictly after `other`.
    pub fn is_newer_than(&self, other: &Record) -> bool {
        self.updated_at > other.updated_at
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

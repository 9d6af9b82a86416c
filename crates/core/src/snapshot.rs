// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The versioned, checksummed view of the full synchronizable state.
//!
//! A [`Snapshot`] is immutable once built. Its checksum is computed in every
//! constructor, including deserialization, so a checksum carried on the wire
//! is never trusted: a peer that sends a stale digest gets it replaced.
//!
//! Empty collections are not part of a snapshot's content. They are dropped
//! on construction so that `{"prompts": []}` and `{}` compare equal.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checksum;
use crate::error::{Error, Result};
use crate::record::Record;

/// Schema version written into every snapshot.
pub const FORMAT_VERSION: &str = "1.0";

/// Records grouped by collection name ("prompts", "categories", ...).
///
/// Collection order is by name; record order within a collection is preserved.
pub type Collections = BTreeMap<String, Vec<Record>>;

/// The flat settings mapping.
pub type Settings = BTreeMap<String, Value>;

/// Which process produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The companion desktop process.
    Desktop,
    /// The browser-resident client.
    Extension,
}

impl Source {
    /// Returns the string representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Desktop => "desktop",
            Source::Extension => "extension",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "desktop" => Ok(Source::Desktop),
            "extension" => Ok(Source::Extension),
            _ => Err(Error::InvalidSource(s.to_string())),
        }
    }
}

/// Provenance and digest of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Which process produced the snapshot.
    pub source: Source,
    /// Digest over `records` and `settings` only.
    pub checksum: String,
}

/// Full synchronizable state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireSnapshot")]
pub struct Snapshot {
    format_version: String,
    last_modified: DateTime<Utc>,
    records: Collections,
    settings: Settings,
    metadata: SnapshotMetadata,
}

impl Snapshot {
    /// Builds a snapshot and computes its checksum.
    pub fn new(
        source: Source,
        last_modified: DateTime<Utc>,
        records: Collections,
        settings: Settings,
    ) -> Self {
        Self::build(FORMAT_VERSION.to_string(), source, last_modified, records, settings)
    }

    /// Builds a snapshot with no records and no settings.
    pub fn empty(source: Source, last_modified: DateTime<Utc>) -> Self {
        Self::new(source, last_modified, Collections::new(), Settings::new())
    }

    fn build(
        format_version: String,
        source: Source,
        last_modified: DateTime<Utc>,
        mut records: Collections,
        settings: Settings,
    ) -> Self {
        records.retain(|_, list| !list.is_empty());
        let checksum = checksum::compute(&records, &settings);
        Snapshot {
            format_version,
            last_modified,
            records,
            settings,
            metadata: SnapshotMetadata { source, checksum },
        }
    }

    /// Schema version of this snapshot.
    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    /// Time of the mutation that produced this snapshot.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// All collections.
    pub fn records(&self) -> &Collections {
        &self.records
    }

    /// Records of one collection, empty if the collection is absent.
    pub fn collection(&self, name: &str) -> &[Record] {
        self.records.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Finds a record by collection and id.
    pub fn find(&self, collection: &str, id: &str) -> Option<&Record> {
        self.collection(collection).iter().find(|r| r.id == id)
    }

    /// The settings mapping.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Provenance and digest.
    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    /// Which process produced this snapshot.
    pub fn source(&self) -> Source {
        self.metadata.source
    }

    /// Content digest.
    pub fn checksum(&self) -> &str {
        &self.metadata.checksum
    }

    /// Returns true if both snapshots hold the same records and settings.
    ///
    /// Provenance and `lastModified` are ignored.
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.checksum() == other.checksum()
    }

    /// Returns the same content attributed to another process.
    pub fn with_source(mut self, source: Source) -> Self {
        self.metadata.source = source;
        self
    }

    /// Returns the same content stamped with another modification time.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Consumes the snapshot, returning its content.
    pub fn into_parts(self) -> (Collections, Settings) {
        (self.records, self.settings)
    }

    /// Serializes the snapshot to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes a snapshot from JSON, recomputing its checksum.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// The permissive on-wire shape.
///
/// Unknown fields are ignored and the carried checksum is discarded.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    #[serde(default = "default_format_version")]
    format_version: String,
    last_modified: DateTime<Utc>,
    #[serde(default)]
    records: Collections,
    #[serde(default)]
    settings: Settings,
    metadata: WireMetadata,
}

#[derive(Deserialize)]
struct WireMetadata {
    source: Source,
}

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

impl From<WireSnapshot> for Snapshot {
    fn from(wire: WireSnapshot) -> Self {
        Snapshot::build(
            wire.format_version,
            wire.metadata.source,
            wire.last_modified,
            wire.records,
            wire.settings,
        )
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

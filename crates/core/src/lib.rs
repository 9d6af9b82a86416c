// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! psync-core: Shared library for the promptsync engine
//!
//! This crate provides the snapshot model, change detection, conflict
//! detection and merge rules used by both the `psync` client and the
//! `psync-companion` process, plus the wire protocol they speak.

pub mod checksum;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod record;
pub mod snapshot;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use conflict::{Conflict, ConflictDetector, Outcome, DEFAULT_CONFLICT_WINDOW};
pub use error::{Error, Result};
pub use merge::{resolve, Strategy};
pub use record::Record;
pub use snapshot::{Collections, Settings, Snapshot, SnapshotMetadata, Source, FORMAT_VERSION};
pub use store::{LocalStore, MemoryStore};

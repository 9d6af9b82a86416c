// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Content digest for change detection.
//!
//! The digest is 64-bit FNV-1a over the JSON text of `{records, settings}`,
//! rendered as 16 lowercase hex digits. Entries are not reordered before
//! hashing, so moving a record within its collection changes the digest.
//!
//! This is a non-cryptographic change detector. Collisions are possible, and
//! it must never be used to authenticate content.

use std::io;

use serde::Serialize;

use crate::snapshot::{Collections, Settings};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Streaming 64-bit FNV-1a hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a {
    state: u64,
}

impl Fnv1a {
    pub fn new() -> Self {
        Fnv1a { state: FNV_OFFSET_BASIS }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn finish(&self) -> u64 {
        self.state
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for Fnv1a {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct ChecksumInput<'a> {
    records: &'a Collections,
    settings: &'a Settings,
}

/// Computes the digest of a snapshot's content.
pub fn compute(records: &Collections, settings: &Settings) -> String {
    format!("{:016x}", digest(&ChecksumInput { records, settings }))
}

/// FNV-1a over the compact JSON of `value`.
///
/// Snapshot content always serializes: the hasher never fails a write and
/// every map key is a string. A value that does fail has the error text
/// hashed after whatever was written, so its digest stays deterministic.
fn digest<T: Serialize>(value: &T) -> u64 {
    let mut hasher = Fnv1a::new();
    if let Err(e) = serde_json::to_writer(&mut hasher, value) {
        hasher.update(e.to_string().as_bytes());
    }
    hasher.finish()
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;

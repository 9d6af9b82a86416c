// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "ws://127.0.0.1:9427", "127.0.0.1:9427" },
    trailing_slash = { "ws://localhost:9000/", "localhost:9000" },
    secure = { "wss://sync.example:443", "sync.example:443" },
    bare = { "127.0.0.1:1", "127.0.0.1:1" },
)]
fn unreachable_hint_names_bind_address(url: &str, addr: &str) {
    let msg = Error::unreachable(url).to_string();
    assert!(msg.contains(url), "{msg}");
    assert!(msg.contains(&format!("--bind {addr}")), "{msg}");
}

#[test]
fn nothing_to_resolve_has_hint() {
    let msg = Error::NothingToResolve.to_string();
    assert!(msg.contains("no conflict"));
    assert!(msg.contains("hint:"));
}

#[test]
fn sync_error_is_transparent() {
    let err: Error = psync_client::SyncError::NotConnected.into();
    assert_eq!(err.to_string(), psync_client::SyncError::NotConnected.to_string());
}

#[test]
fn core_error_converts() {
    let err: Error = psync_core::Error::InvalidStrategy("both".into()).into();
    assert!(err.to_string().contains("invalid merge strategy"));
}

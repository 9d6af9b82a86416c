// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    strategy = { Error::InvalidStrategy("newest".into()), "newest" },
    source = { Error::InvalidSource("phone".into()), "phone" },
    method = { Error::UnknownMethod("getAll".into()), "getAll" },
    store = { Error::Store("quota exceeded".into()), "quota exceeded" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn error_invalid_strategy_lists_valid_values() {
    let msg = Error::InvalidStrategy("x".into()).to_string();
    assert!(msg.contains("local, remote, merge"));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<()>("invalid").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

#[test]
fn system_clock_is_near_now() {
    let before = Utc::now();
    let now = SystemClock.now();
    let after = Utc::now();
    assert!(now >= before && now <= after);
}

#[test]
fn manual_clock_is_frozen() {
    let clock = ManualClock::new(at(1_000));
    assert_eq!(clock.now(), at(1_000));
    assert_eq!(clock.now(), at(1_000));
}

#[test]
fn manual_clock_set_and_advance() {
    let clock = ManualClock::new(at(1_000));
    clock.advance(Duration::milliseconds(250));
    assert_eq!(clock.now(), at(1_250));

    clock.set(at(500));
    assert_eq!(clock.now(), at(500));
}

#[test]
fn clock_source_by_reference() {
    fn read<C: ClockSource>(clock: C) -> DateTime<Utc> {
        clock.now()
    }
    let clock = ManualClock::new(at(42));
    assert_eq!(read(&clock), at(42));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_monotonic_and_wall_time() {
    let clock = FakeClock::new();
    let start = clock.now();
    let epoch = clock.epoch_ms();

    clock.advance(Duration::from_millis(1500));

    assert_eq!(clock.now() - start, Duration::from_millis(1500));
    assert_eq!(clock.epoch_ms() - epoch, 1500);
}

#[test]
fn fake_clock_clones_share_offset() {
    let clock = FakeClock::new();
    let other = clock.clone();

    clock.advance(Duration::from_secs(7));

    assert_eq!(other.now(), clock.now());
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}

#[test]
fn fake_clock_timestamp_is_fractional_seconds() {
    let clock = FakeClock::new();
    let before = clock.timestamp();

    clock.advance(Duration::from_millis(250));

    let delta = clock.timestamp() - before;
    assert!((delta - 0.25).abs() < 1e-9);
}

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
    assert!(clock.timestamp() > 0.0);
}

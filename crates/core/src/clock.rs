// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source abstraction.
//!
//! Production code uses `SystemClock`; tests drive timers deterministically
//! with `FakeClock`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Provides the current time to the master.
pub trait Clock: Clone + Send + 'static {
    /// Monotonic instant for timer deadlines and activation stamps.
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the unix epoch.
    fn epoch_ms(&self) -> u64;

    /// Wall-clock seconds since the unix epoch, fractional.
    ///
    /// Used for RPC timestamps and fault records.
    fn timestamp(&self) -> f64;
}

/// System time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn timestamp(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Deterministic clock for tests.
///
/// `advance` moves both the monotonic and the wall clock; clones share the
/// same offset.
#[derive(Debug, Clone)]
pub struct FakeClock {
    base: Instant,
    epoch_base_ms: u64,
    offset: Arc<Mutex<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            epoch_base_ms: 1_700_000_000_000,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_base_ms + self.offset.lock().as_millis() as u64
    }

    fn timestamp(&self) -> f64 {
        self.epoch_ms() as f64 / 1000.0
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

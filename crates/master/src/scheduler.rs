// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-slave timer table.
//!
//! The event loop sweeps expired timers via `fired`; a fired timer is
//! removed before its handler runs, so "still armed" distinguishes external
//! cancellation from expiry downstream.

use lwm_core::SlaveId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Kinds of per-slave timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Idle lifetime of a secured slave.
    Ttl,
    /// Deadline for the hello after a launch request.
    Activate,
    /// Retry delay for transiently failed launches.
    Relaunch,
}

#[derive(Debug, Clone)]
struct Timer {
    deadline: Instant,
    period: Duration,
    /// Remaining time captured by `freeze`; frozen timers never fire.
    frozen: Option<Duration>,
}

/// Timer table keyed by slave and kind.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<(SlaveId, TimerKind), Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer `period` from `now`, replacing any previous one.
    pub fn set(&mut self, slave: SlaveId, kind: TimerKind, period: Duration, now: Instant) {
        self.timers.insert(
            (slave, kind),
            Timer {
                deadline: now + period,
                period,
                frozen: None,
            },
        );
    }

    /// Cancel a timer; a cancelled timer never fires.
    pub fn cancel(&mut self, slave: SlaveId, kind: TimerKind) {
        self.timers.remove(&(slave, kind));
    }

    /// Cancel every timer belonging to `slave`.
    pub fn cancel_all(&mut self, slave: SlaveId) {
        self.timers.retain(|(s, _), _| *s != slave);
    }

    pub fn is_armed(&self, slave: SlaveId, kind: TimerKind) -> bool {
        self.timers.contains_key(&(slave, kind))
    }

    /// Restart the timer for a full period from `now`, unfreezing it.
    pub fn reset(&mut self, slave: SlaveId, kind: TimerKind, now: Instant) {
        if let Some(t) = self.timers.get_mut(&(slave, kind)) {
            t.deadline = now + t.period;
            t.frozen = None;
        }
    }

    /// Time remaining until expiry.
    pub fn pending(&self, slave: SlaveId, kind: TimerKind, now: Instant) -> Option<Duration> {
        self.timers.get(&(slave, kind)).map(|t| match t.frozen {
            Some(remaining) => remaining,
            None => t.deadline.saturating_duration_since(now),
        })
    }

    /// Suspend the timer, capturing its remaining time.
    pub fn freeze(&mut self, slave: SlaveId, kind: TimerKind, now: Instant) {
        if let Some(t) = self.timers.get_mut(&(slave, kind)) {
            if t.frozen.is_none() {
                t.frozen = Some(t.deadline.saturating_duration_since(now));
            }
        }
    }

    /// Resume a frozen timer with its captured remaining time.
    pub fn thaw(&mut self, slave: SlaveId, kind: TimerKind, now: Instant) {
        if let Some(t) = self.timers.get_mut(&(slave, kind)) {
            if let Some(remaining) = t.frozen.take() {
                t.deadline = now + remaining;
            }
        }
    }

    /// Push the deadline out so the full `target` remains from `now`.
    pub fn extend_to(&mut self, slave: SlaveId, kind: TimerKind, target: Duration, now: Instant) {
        if let Some(t) = self.timers.get_mut(&(slave, kind)) {
            t.deadline = now + target;
        }
    }

    /// Remove and return every unfrozen timer that has expired, earliest
    /// deadline first.
    pub fn fired(&mut self, now: Instant) -> Vec<(SlaveId, TimerKind)> {
        let mut due: Vec<(Instant, SlaveId, TimerKind)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.frozen.is_none() && t.deadline <= now)
            .map(|((slave, kind), t)| (t.deadline, *slave, *kind))
            .collect();
        due.sort();

        let mut fired = Vec::with_capacity(due.len());
        for (_, slave, kind) in due {
            self.timers.remove(&(slave, kind));
            fired.push((slave, kind));
        }
        fired
    }

    /// Earliest unfrozen deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .values()
            .filter(|t| t.frozen.is_none())
            .map(|t| t.deadline)
            .min()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

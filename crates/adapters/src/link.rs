// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound pause/resume requests to workers.

use lwm_core::{Pid, SlaveId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("no route to worker {0}")]
    NoRoute(SlaveId),
}

/// Request channel to a worker.
///
/// Requests are fire-and-forget here; replies are delivered out-of-band
/// through the master loop (`on_pause_reply` / `on_resume_reply`).
pub trait WorkerLink {
    fn request_pause(
        &mut self,
        slave: SlaveId,
        pid: Option<Pid>,
        timestamp: f64,
    ) -> Result<(), LinkError>;

    fn request_resume(
        &mut self,
        slave: SlaveId,
        pid: Option<Pid>,
        timestamp: f64,
    ) -> Result<(), LinkError>;

    /// Stop liveness pings while the worker is paused.
    fn ping_freeze(&mut self, slave: SlaveId);

    /// Restart liveness pings when the worker resumes.
    fn ping_thaw(&mut self, slave: SlaveId);
}

/// Link with no transport attached; logs and drops every request.
#[derive(Debug, Default)]
pub struct NoopLink;

impl WorkerLink for NoopLink {
    fn request_pause(
        &mut self,
        slave: SlaveId,
        pid: Option<Pid>,
        timestamp: f64,
    ) -> Result<(), LinkError> {
        tracing::debug!(%slave, ?pid, timestamp, "pause request dropped (no transport)");
        Ok(())
    }

    fn request_resume(
        &mut self,
        slave: SlaveId,
        pid: Option<Pid>,
        timestamp: f64,
    ) -> Result<(), LinkError> {
        tracing::debug!(%slave, ?pid, timestamp, "resume request dropped (no transport)");
        Ok(())
    }

    fn ping_freeze(&mut self, slave: SlaveId) {
        tracing::debug!(%slave, "ping freeze dropped (no transport)");
    }

    fn ping_thaw(&mut self, slave: SlaveId) {
        tracing::debug!(%slave, "ping thaw dropped (no transport)");
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded link call
    #[derive(Debug, Clone, PartialEq)]
    pub enum LinkCall {
        Pause {
            slave: SlaveId,
            timestamp: f64,
        },
        Resume {
            slave: SlaveId,
            timestamp: f64,
        },
        PingFreeze(SlaveId),
        PingThaw(SlaveId),
    }

    /// Fake worker link recording every request.
    #[derive(Clone, Default)]
    pub struct FakeLink {
        calls: Arc<Mutex<Vec<LinkCall>>>,
        unroutable: Arc<Mutex<Vec<SlaveId>>>,
    }

    impl FakeLink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<LinkCall> {
            self.calls.lock().clone()
        }

        /// Make requests for `slave` fail with `NoRoute`.
        pub fn mark_unroutable(&self, slave: SlaveId) {
            self.unroutable.lock().push(slave);
        }

        fn route(&self, slave: SlaveId) -> Result<(), LinkError> {
            if self.unroutable.lock().contains(&slave) {
                Err(LinkError::NoRoute(slave))
            } else {
                Ok(())
            }
        }
    }

    impl WorkerLink for FakeLink {
        fn request_pause(
            &mut self,
            slave: SlaveId,
            _pid: Option<Pid>,
            timestamp: f64,
        ) -> Result<(), LinkError> {
            self.route(slave)?;
            self.calls.lock().push(LinkCall::Pause { slave, timestamp });
            Ok(())
        }

        fn request_resume(
            &mut self,
            slave: SlaveId,
            _pid: Option<Pid>,
            timestamp: f64,
        ) -> Result<(), LinkError> {
            self.route(slave)?;
            self.calls
                .lock()
                .push(LinkCall::Resume { slave, timestamp });
            Ok(())
        }

        fn ping_freeze(&mut self, slave: SlaveId) {
            self.calls.lock().push(LinkCall::PingFreeze(slave));
        }

        fn ping_thaw(&mut self, slave: SlaveId) {
            self.calls.lock().push(LinkCall::PingThaw(slave));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLink, LinkCall};

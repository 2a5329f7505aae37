// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slave lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a worker process record.
///
/// A freshly created record starts `Terminated`; the launch request moves it
/// to `RequestToLaunch`, and the worker's hello lands it in `Resumed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaveState {
    /// No process is attached; the record may persist for its instances.
    #[default]
    Terminated,
    /// Launch requested; waiting for the worker's hello.
    RequestToLaunch,
    /// Running and serving requests.
    Resumed,
    /// Running but paused by the display monitor.
    Paused,
    /// Pause request sent; waiting for the reply.
    RequestToPause,
    /// Resume request sent; waiting for the reply.
    RequestToResume,
    /// Termination requested; the process may still be exiting.
    RequestToTerminate,
    Error,
}

impl SlaveState {
    /// Every state except `Terminated` and `RequestToTerminate` counts as
    /// activated.
    pub fn is_activated(self) -> bool {
        !matches!(self, SlaveState::Terminated | SlaveState::RequestToTerminate)
    }
}

impl fmt::Display for SlaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlaveState::Terminated => "Terminated",
            SlaveState::RequestToLaunch => "RequestToLaunch",
            SlaveState::Resumed => "Resumed",
            SlaveState::Paused => "Paused",
            SlaveState::RequestToPause => "RequestToPause",
            SlaveState::RequestToResume => "RequestToResume",
            SlaveState::RequestToTerminate => "RequestToTerminate",
            SlaveState::Error => "Error",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launcher request payload and outcome classification.

use crate::id::{Pid, SlaveName};

/// Request payload handed to the launcher when spawning a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEnvelope {
    pub name: SlaveName,
    pub secured: bool,
    pub abi: String,
}

impl LaunchEnvelope {
    /// Environment representation passed to the spawned service.
    pub fn to_env(&self) -> Vec<(String, String)> {
        vec![
            ("LWM_SLAVE_NAME".to_string(), self.name.as_str().to_string()),
            (
                "LWM_SLAVE_SECURED".to_string(),
                if self.secured { "true" } else { "false" }.to_string(),
            ),
            ("LWM_SLAVE_ABI".to_string(), self.abi.clone()),
        ]
    }
}

/// Coarse launcher result classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// Worker spawned with the given pid.
    Launched(Pid),
    /// The service hosts the worker in-process; no separate pid.
    Local,
    /// Permanent failure; the activation deadline surfaces the fault.
    Hard(LaunchFailure),
    /// Failure worth retrying after the relaunch delay.
    Transient(LaunchFailure),
}

/// Launcher failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchFailure {
    // hard
    NoLaunchpad,
    IllegalAccess,
    InvalidArgument,
    NotInitialized,
    Error,
    // transient
    Timeout,
    Comm,
    Terminating,
    Canceled,
}

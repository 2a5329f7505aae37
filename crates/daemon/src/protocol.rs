// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound daemon events.
//!
//! One JSON object per line on the control socket, tagged by `type`.
//! Serializes with `{"type": "event_name", ...fields}` format.

use lwm_core::{Pid, SlaveName};
use serde::{Deserialize, Serialize};

/// Events the master loop consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MasterEvent {
    /// A worker announced itself.
    Hello { name: SlaveName, pid: Pid },

    /// The launch service reported which record a fresh process belongs to.
    Launched { pkgname: String, pid: Pid },

    /// Reply to a pause request; 0 means success, absent means no reply.
    PauseReply {
        name: SlaveName,
        #[serde(default)]
        ret: Option<i32>,
    },

    /// Reply to a resume request; 0 means success, absent means no reply.
    ResumeReply {
        name: SlaveName,
        #[serde(default)]
        ret: Option<i32>,
    },

    /// A worker process exited.
    Dead { pid: Pid },

    /// A package function call went in flight on a worker.
    Call {
        name: SlaveName,
        pkgname: String,
        filename: String,
        funcname: String,
    },

    /// The matching return for an earlier call.
    Ret {
        name: SlaveName,
        pkgname: String,
        filename: String,
        funcname: String,
    },

    /// A worker self-reported a fault inside a package.
    FaultReport {
        name: SlaveName,
        pkgname: String,
        filename: String,
        funcname: String,
    },

    /// The display went inactive; pause all workers.
    ActivityPaused,

    /// The display became active; resume all workers.
    ActivityResumed,

    /// Stop the daemon.
    Shutdown,
}

impl MasterEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MasterEvent::Hello { .. } => "hello",
            MasterEvent::Launched { .. } => "launched",
            MasterEvent::PauseReply { .. } => "pause_reply",
            MasterEvent::ResumeReply { .. } => "resume_reply",
            MasterEvent::Dead { .. } => "dead",
            MasterEvent::Call { .. } => "call",
            MasterEvent::Ret { .. } => "ret",
            MasterEvent::FaultReport { .. } => "fault_report",
            MasterEvent::ActivityPaused => "activity_paused",
            MasterEvent::ActivityResumed => "activity_resumed",
            MasterEvent::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

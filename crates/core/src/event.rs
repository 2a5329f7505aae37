// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observer events and the fault notice payload.

use serde::{Deserialize, Serialize};

/// Observable per-slave lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlaveEvent {
    /// The worker said hello and is serving.
    Activate,
    /// The worker is gone; observers may vote to reactivate.
    Deactivate,
    /// The record is being destroyed.
    Delete,
    /// A launch deadline expired or flap suppression kicked in.
    Fault,
    Pause,
    Resume,
}

/// What an observer wants done with its registration after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverVerdict {
    /// Stay registered.
    Keep,
    /// Deregister this observer.
    Remove,
    /// Stay registered and vote to reactivate the slave.
    ///
    /// Only counted for `Deactivate` observers.
    Reactivate,
}

/// `fault_package` notification sent to clients, without acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultNotice {
    pub pkgname: String,
    pub filename: String,
    pub funcname: String,
}

impl FaultNotice {
    pub fn new(
        pkgname: impl Into<String>,
        filename: impl Into<String>,
        funcname: impl Into<String>,
    ) -> Self {
        Self {
            pkgname: pkgname.into(),
            filename: filename.into(),
            funcname: funcname.into(),
        }
    }
}

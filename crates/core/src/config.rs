// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master configuration constants.

use std::path::PathBuf;
use std::time::Duration;

/// Tunables governing slave lifetimes, launch deadlines, and placement load.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterConfig {
    /// Idle lifetime of a secured slave.
    pub slave_ttl: Duration,
    /// Deadline for the worker's hello after a launch request.
    pub slave_activate_time: Duration,
    /// Delay before retrying a transiently failed launch request.
    pub slave_relaunch_time: Duration,
    /// Retry budget for transient launch failures.
    pub slave_relaunch_count: u32,
    /// Package cap per default-ABI slave, and the critical-fault threshold.
    pub slave_max_load: u32,
    /// Deaths faster than this after activation count as critical faults.
    pub minimum_reactivation_time: Duration,
    /// ABI of the common runtime; placement caps load only for this ABI.
    pub default_abi: String,
    /// Skip the launcher entirely; workers are started by hand.
    pub debug_mode: bool,
    /// Directory where workers leave per-pid crash logs.
    pub slave_log_path: PathBuf,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            slave_ttl: Duration::from_secs(30),
            slave_activate_time: Duration::from_secs(30),
            slave_relaunch_time: Duration::from_secs(3),
            slave_relaunch_count: 3,
            slave_max_load: 30,
            minimum_reactivation_time: Duration::from_secs(10),
            default_abi: "c".to_string(),
            debug_mode: false,
            slave_log_path: PathBuf::from("/tmp/lwm/log"),
        }
    }
}

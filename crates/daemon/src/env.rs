// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration from the environment.
//!
//! Every master tunable can be overridden with an `LWM_*` variable;
//! unparsable values are logged and ignored.

use lwm_core::MasterConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Paths and master tunables for one daemon instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub master: MasterConfig,
    /// Unix socket the event listener binds.
    pub socket_path: PathBuf,
    /// Directory for the daemon's own log files.
    pub log_dir: PathBuf,
}

impl DaemonConfig {
    /// Load configuration, overriding defaults from `LWM_*` variables.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Testable loader taking an environment lookup function.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut master = MasterConfig::default();

        if let Some(v) = secs(&get, "LWM_SLAVE_TTL") {
            master.slave_ttl = v;
        }
        if let Some(v) = secs(&get, "LWM_SLAVE_ACTIVATE_TIME") {
            master.slave_activate_time = v;
        }
        if let Some(v) = secs(&get, "LWM_SLAVE_RELAUNCH_TIME") {
            master.slave_relaunch_time = v;
        }
        if let Some(v) = parsed(&get, "LWM_SLAVE_RELAUNCH_COUNT") {
            master.slave_relaunch_count = v;
        }
        if let Some(v) = parsed(&get, "LWM_SLAVE_MAX_LOAD") {
            master.slave_max_load = v;
        }
        if let Some(v) = secs(&get, "LWM_MINIMUM_REACTIVATION_TIME") {
            master.minimum_reactivation_time = v;
        }
        if let Some(v) = get("LWM_DEFAULT_ABI") {
            master.default_abi = v;
        }
        if let Some(v) = get("LWM_DEBUG_MODE") {
            master.debug_mode = matches!(v.trim(), "1" | "true" | "yes");
        }
        if let Some(v) = get("LWM_SLAVE_LOG_PATH") {
            master.slave_log_path = PathBuf::from(v);
        }

        let state_dir = get("LWM_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/lwm"));

        Self {
            master,
            socket_path: get("LWM_SOCKET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("lwmd.sock")),
            log_dir: get("LWM_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("logs")),
        }
    }
}

fn parsed<T: FromStr>(get: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, raw, "ignoring unparsable value");
            None
        }
    }
}

fn secs(get: impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    parsed::<f64>(get, key)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(Duration::from_secs_f64)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

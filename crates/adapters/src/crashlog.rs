// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pid worker crash logs.
//!
//! A worker that dies inside a live-widget leaves `<dir>/slave.<pid>` whose
//! first line names the library it was executing: `liblive-<pkgname>.so`.

use lwm_core::Pid;
use parking_lot::Mutex;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LIB_PREFIX: &str = "liblive-";
const LIB_SUFFIX: &str = ".so";

/// Reader for the crash-log directory.
pub struct CrashLog {
    dir: PathBuf,
    // Filesystem helpers may be driven from a blocking helper thread;
    // reads and purges take this scoped lock.
    lock: Mutex<()>,
}

impl CrashLog {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, pid: Pid) -> PathBuf {
        self.dir.join(format!("slave.{pid}"))
    }

    /// Extract the blamed package from a worker's crash log, consuming the
    /// file on success.
    ///
    /// The first line must match `liblive-<pkgname>.so` exactly; anything
    /// else leaves the file in place and returns `None`.
    pub fn read_blamed_package(&self, pid: Pid) -> Option<String> {
        let _guard = self.lock.lock();
        let path = self.path_for(pid);

        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no crash log found");
                return None;
            }
        };

        let mut line = String::new();
        if BufReader::new(file).read_line(&mut line).is_err() || line.is_empty() {
            warn!(path = %path.display(), "crash log is unreadable");
            return None;
        }
        let line = line.trim_end_matches(['\r', '\n']);

        let Some(rest) = line.strip_prefix(LIB_PREFIX) else {
            warn!(path = %path.display(), "crash log does not name a live-widget library");
            return None;
        };
        let Some(pkgname) = rest.strip_suffix(LIB_SUFFIX) else {
            warn!(path = %path.display(), "crash log extension is not matched");
            return None;
        };
        if pkgname.is_empty() {
            return None;
        }

        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to unlink crash log");
        }
        Some(pkgname.to_string())
    }

    /// Remove the crash log for `pid`, if present.
    pub fn purge(&self, pid: Pid) {
        let _guard = self.lock.lock();
        let path = self.path_for(pid);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove crash log");
            }
        }
    }
}

#[cfg(test)]
#[path = "crashlog_tests.rs"]
mod tests;

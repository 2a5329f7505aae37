// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process launching and termination.

use lwm_core::{LaunchEnvelope, LaunchFailure, LaunchStatus, Pid};
use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors from terminating a worker process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminateError {
    #[error("no such process: {0}")]
    NoProcess(Pid),
    #[error("terminate failed: {0}")]
    Signal(String),
}

/// Launches worker services by package name and terminates them by pid.
///
/// The spawn mechanism is opaque to the master; only the coarse status
/// classes of `LaunchStatus` matter.
pub trait Launcher {
    fn launch(&mut self, service: &str, envelope: &LaunchEnvelope) -> LaunchStatus;
    fn terminate(&mut self, pid: Pid) -> Result<(), TerminateError>;
}

/// Spawns the service binary directly, passing the launch envelope through
/// the environment, and terminates with SIGTERM.
#[derive(Debug, Default)]
pub struct ServiceLauncher;

impl ServiceLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ServiceLauncher {
    fn launch(&mut self, service: &str, envelope: &LaunchEnvelope) -> LaunchStatus {
        let mut cmd = Command::new(service);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for (key, value) in envelope.to_env() {
            cmd.env(key, value);
        }

        match cmd.spawn() {
            Ok(child) => LaunchStatus::Launched(child.id() as Pid),
            Err(e) => {
                tracing::error!(service, error = %e, "failed to spawn worker service");
                match e.kind() {
                    io::ErrorKind::NotFound => LaunchStatus::Hard(LaunchFailure::NoLaunchpad),
                    io::ErrorKind::PermissionDenied => {
                        LaunchStatus::Hard(LaunchFailure::IllegalAccess)
                    }
                    io::ErrorKind::InvalidInput => {
                        LaunchStatus::Hard(LaunchFailure::InvalidArgument)
                    }
                    io::ErrorKind::TimedOut => LaunchStatus::Transient(LaunchFailure::Timeout),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
                        LaunchStatus::Transient(LaunchFailure::Comm)
                    }
                    _ => LaunchStatus::Transient(LaunchFailure::Comm),
                }
            }
        }
    }

    fn terminate(&mut self, pid: Pid) -> Result<(), TerminateError> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid as NixPid;

        kill(NixPid::from_raw(pid), Signal::SIGTERM).map_err(|errno| match errno {
            nix::errno::Errno::ESRCH => TerminateError::NoProcess(pid),
            other => TerminateError::Signal(other.to_string()),
        })
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeLauncherState {
        script: VecDeque<LaunchStatus>,
        launches: Vec<(String, LaunchEnvelope)>,
        terminated: Vec<Pid>,
        fail_terminate: bool,
        next_pid: Pid,
    }

    /// Fake launcher that records calls and replays scripted outcomes.
    ///
    /// Without a script, every launch succeeds with a fresh pid.
    #[derive(Clone, Default)]
    pub struct FakeLauncher {
        inner: Arc<Mutex<FakeLauncherState>>,
    }

    impl FakeLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the outcome of the next launch call (FIFO).
        pub fn push_status(&self, status: LaunchStatus) {
            self.inner.lock().script.push_back(status);
        }

        /// Make every `terminate` fail with a signal error.
        pub fn fail_terminate(&self, fail: bool) {
            self.inner.lock().fail_terminate = fail;
        }

        pub fn launches(&self) -> Vec<(String, LaunchEnvelope)> {
            self.inner.lock().launches.clone()
        }

        pub fn terminated(&self) -> Vec<Pid> {
            self.inner.lock().terminated.clone()
        }
    }

    impl Launcher for FakeLauncher {
        fn launch(&mut self, service: &str, envelope: &LaunchEnvelope) -> LaunchStatus {
            let mut inner = self.inner.lock();
            inner.launches.push((service.to_string(), envelope.clone()));
            match inner.script.pop_front() {
                Some(status) => status,
                None => {
                    inner.next_pid += 1;
                    LaunchStatus::Launched(1000 + inner.next_pid)
                }
            }
        }

        fn terminate(&mut self, pid: Pid) -> Result<(), TerminateError> {
            let mut inner = self.inner.lock();
            inner.terminated.push(pid);
            if inner.fail_terminate {
                Err(TerminateError::Signal("scripted failure".to_string()))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLauncher;

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;

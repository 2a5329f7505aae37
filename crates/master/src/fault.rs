// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fault attribution for worker deaths.
//!
//! Every outbound package call is bracketed by `func_call`/`func_ret`. When
//! a worker dies, `check` decides which package to blame, in three tiers:
//! crash-log evidence, the secured-slave shortcut, then the topmost
//! in-flight call.

use crate::error::MasterError;
use lwm_adapters::{ClientNotify, CrashLog, FaultRecord, PackageStore};
use lwm_core::{FaultNotice, Pid, SlaveId, SlaveName};
use tracing::{debug, error, warn};

/// One unresolved package function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultCall {
    pub slave: SlaveId,
    pub pkgname: String,
    pub filename: String,
    pub funcname: String,
    pub timestamp: f64,
}

/// Tracks in-flight package calls and commits blame when a worker dies.
#[derive(Default)]
pub struct FaultManager {
    /// Insertion-ordered; reverse iteration yields LIFO.
    calls: Vec<FaultCall>,
    fault_mark_count: i32,
}

impl FaultManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unmatched call/ret markers outstanding; a coarse "fault in progress"
    /// indicator.
    pub fn fault_in_progress(&self) -> i32 {
        self.fault_mark_count
    }

    /// Outstanding call records (oldest first).
    pub fn calls(&self) -> &[FaultCall] {
        &self.calls
    }

    /// Record an outbound package call on `slave`.
    pub fn func_call(
        &mut self,
        slave: SlaveId,
        pkgname: &str,
        filename: &str,
        funcname: &str,
        timestamp: f64,
    ) {
        self.calls.push(FaultCall {
            slave,
            pkgname: pkgname.to_string(),
            filename: filename.to_string(),
            funcname: funcname.to_string(),
            timestamp,
        });
        self.fault_mark_count += 1;
    }

    /// Remove the oldest record matching the call quadruple.
    pub fn func_ret(
        &mut self,
        slave: SlaveId,
        pkgname: &str,
        filename: &str,
        funcname: &str,
    ) -> Result<(), MasterError> {
        let position = self.calls.iter().position(|c| {
            c.slave == slave
                && c.pkgname == pkgname
                && c.filename == filename
                && c.funcname == funcname
        });
        match position {
            Some(i) => {
                self.calls.remove(i);
                self.fault_mark_count -= 1;
                Ok(())
            }
            None => Err(MasterError::NotExist),
        }
    }

    /// Record a worker-reported fault against `pkgname` and notify clients.
    #[allow(clippy::too_many_arguments)]
    pub fn mark_fault<P: PackageStore, N: ClientNotify>(
        &mut self,
        packages: &mut P,
        notify: &mut N,
        name: &SlaveName,
        pid: Option<Pid>,
        pkgname: &str,
        filename: &str,
        funcname: &str,
        timestamp: f64,
    ) -> Result<(), MasterError> {
        let record = FaultRecord {
            timestamp,
            filename: filename.to_string(),
            funcname: funcname.to_string(),
        };
        packages.set_fault(pkgname, &record).map_err(|e| match e {
            lwm_adapters::PackageError::NotExist(_) => MasterError::NotExist,
            lwm_adapters::PackageError::Fault => MasterError::Fault,
        })?;

        dump_fault(name, pid, pkgname, filename, funcname);
        notify.broadcast(&FaultNotice::new(pkgname, filename, funcname));
        self.fault_mark_count += 1;
        Ok(())
    }

    /// Three-tier blame attribution for a dead worker.
    ///
    /// Afterwards no call record references `slave`, the crash log for its
    /// pid is gone, and the fault-mark counter is reset.
    #[allow(clippy::too_many_arguments)]
    pub fn check<P: PackageStore, N: ClientNotify>(
        &mut self,
        packages: &mut P,
        notify: &mut N,
        crashlog: &CrashLog,
        slave: SlaveId,
        name: &SlaveName,
        pid: Option<Pid>,
        timestamp: f64,
    ) {
        // First tier: the crash log names the library the worker died in.
        if let Some(p) = pid {
            if let Some(pkgname) = crashlog.read_blamed_package(p) {
                if packages
                    .set_fault(&pkgname, &FaultRecord::bare(timestamp))
                    .is_ok()
                {
                    dump_fault(name, pid, &pkgname, "", "");
                    notify.broadcast(&FaultNotice::new(&pkgname, "", ""));
                    self.settle(slave, crashlog, pid);
                    return;
                }
                warn!(pkgname, "crash log names an unknown package");
            }
        }

        // Second tier: a secured slave hosts exactly one package, so the
        // death is unambiguous.
        if let Some(pkgname) = packages.find_by_secured_slave(slave) {
            if packages
                .set_fault(&pkgname, &FaultRecord::bare(timestamp))
                .is_ok()
            {
                dump_fault(name, pid, &pkgname, "", "");
                notify.broadcast(&FaultNotice::new(&pkgname, "", ""));
                self.settle(slave, crashlog, pid);
                return;
            }
        }

        // Last tier: the topmost in-flight call takes the blame (LIFO);
        // the rest are transitively implicated.
        let mut blamed = false;
        for call in self.calls.iter().rev().filter(|c| c.slave == slave) {
            if !blamed {
                let record = FaultRecord {
                    timestamp: call.timestamp,
                    filename: call.filename.clone(),
                    funcname: call.funcname.clone(),
                };
                if packages.set_fault(&call.pkgname, &record).is_ok() {
                    notify.broadcast(&FaultNotice::new(
                        &call.pkgname,
                        &call.filename,
                        &call.funcname,
                    ));
                    blamed = true;
                } else {
                    error!(pkgname = %call.pkgname, "failed to find the package of a blamed call");
                }
            } else {
                debug!(pkgname = %call.pkgname, funcname = %call.funcname, "treated as a false log");
                dump_fault(name, pid, &call.pkgname, &call.filename, &call.funcname);
            }
        }

        self.settle(slave, crashlog, pid);
    }

    fn settle(&mut self, slave: SlaveId, crashlog: &CrashLog, pid: Option<Pid>) {
        self.calls.retain(|c| c.slave != slave);
        self.fault_mark_count = 0;
        if let Some(p) = pid {
            crashlog.purge(p);
        }
    }
}

fn dump_fault(name: &SlaveName, pid: Option<Pid>, pkgname: &str, filename: &str, funcname: &str) {
    error!(
        target: "critical",
        slave = %name,
        pid = pid.unwrap_or(-1),
        pkgname,
        filename,
        funcname,
        "fault committed"
    );
}

#[cfg(test)]
#[path = "fault_tests.rs"]
mod tests;

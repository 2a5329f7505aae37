// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The master event loop.
//!
//! Single-threaded: inbound events, timer expirations, and every observer
//! callback run here sequentially. The loop sleeps until the next timer
//! deadline or the next inbound event, whichever comes first.

use crate::protocol::MasterEvent;
use lwm_adapters::{ActivityMonitor, ClientNotify, Launcher, PackageStore, WorkerLink};
use lwm_core::{Clock, SlaveId, SlaveName};
use lwm_master::{Master, MasterError};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Drive the master until `Shutdown` arrives or the channel closes.
pub async fn run<L, W, N, P, X, C>(
    master: &mut Master<L, W, N, P, X, C>,
    events: &mut mpsc::Receiver<MasterEvent>,
) where
    L: Launcher,
    W: WorkerLink,
    N: ClientNotify,
    P: PackageStore,
    X: ActivityMonitor,
    C: Clock,
{
    loop {
        let deadline = master.next_deadline();
        tokio::select! {
            event = events.recv() => {
                match event {
                    None => {
                        info!("event channel closed; stopping");
                        return;
                    }
                    Some(MasterEvent::Shutdown) => {
                        info!("shutdown requested");
                        return;
                    }
                    Some(event) => dispatch(master, event),
                }
            }
            _ = timer_gate(deadline) => {
                master.tick();
            }
        }
    }
}

async fn timer_gate(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn dispatch<L, W, N, P, X, C>(master: &mut Master<L, W, N, P, X, C>, event: MasterEvent)
where
    L: Launcher,
    W: WorkerLink,
    N: ClientNotify,
    P: PackageStore,
    X: ActivityMonitor,
    C: Clock,
{
    match event {
        MasterEvent::Hello { name, pid } => {
            if let Err(e) = master.on_hello(&name, pid) {
                warn!(slave = %name, pid, error = %e, "hello for an unknown slave");
            }
        }
        MasterEvent::Launched { pkgname, pid } => {
            if master.attach_by_pkgname(&pkgname, pid).is_none() {
                warn!(pkgname, pid, "no pending slave for the launched service");
            }
        }
        MasterEvent::PauseReply { name, ret } => {
            with_slave(master, &name, |master, id| master.on_pause_reply(id, ret));
        }
        MasterEvent::ResumeReply { name, ret } => {
            with_slave(master, &name, |master, id| master.on_resume_reply(id, ret));
        }
        MasterEvent::Dead { pid } => {
            if master.on_dead(pid).is_none() {
                // Either the record was released during settlement or the
                // pid was never ours; both are fine.
                info!(pid, "worker exit settled");
            }
        }
        MasterEvent::Call {
            name,
            pkgname,
            filename,
            funcname,
        } => {
            with_slave(master, &name, |master, id| {
                master.func_call(id, &pkgname, &filename, &funcname);
            });
        }
        MasterEvent::Ret {
            name,
            pkgname,
            filename,
            funcname,
        } => {
            with_slave(master, &name, |master, id| {
                if master.func_ret(id, &pkgname, &filename, &funcname)
                    == Err(MasterError::NotExist)
                {
                    warn!(slave = %name, pkgname, funcname, "return without a matching call");
                }
            });
        }
        MasterEvent::FaultReport {
            name,
            pkgname,
            filename,
            funcname,
        } => {
            with_slave(master, &name, |master, id| {
                if let Err(e) = master.mark_fault(id, &pkgname, &filename, &funcname) {
                    warn!(slave = %name, pkgname, error = %e, "could not record the reported fault");
                }
            });
        }
        MasterEvent::ActivityPaused => master.pause_all(),
        MasterEvent::ActivityResumed => master.resume_all(),
        // Handled by the loop before dispatch
        MasterEvent::Shutdown => {}
    }
}

fn with_slave<L, W, N, P, X, C>(
    master: &mut Master<L, W, N, P, X, C>,
    name: &SlaveName,
    f: impl FnOnce(&mut Master<L, W, N, P, X, C>, SlaveId),
) where
    L: Launcher,
    W: WorkerLink,
    N: ClientNotify,
    P: PackageStore,
    X: ActivityMonitor,
    C: Clock,
{
    match master.find_by_name(name) {
        Some(id) => f(master, id),
        None => warn!(slave = %name, "event for an unknown slave"),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

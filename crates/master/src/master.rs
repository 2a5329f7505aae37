// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slave lifecycle operations.
//!
//! Everything here runs on one event loop: state transitions, timer
//! handlers, RPC reply handlers, and observer invocations are totally
//! ordered per slave. Observers must not block.

use crate::error::MasterError;
use crate::fault::FaultManager;
use crate::registry::SlaveRegistry;
use crate::scheduler::{Scheduler, TimerKind};
use crate::slave::{SlaveNode, SlaveObserver};
use lwm_adapters::{
    ActivityMonitor, ClientNotify, CrashLog, Launcher, PackageStore, WorkerLink,
};
use lwm_core::{
    ClientId, Clock, FaultNotice, LaunchEnvelope, LaunchStatus, MasterConfig, Pid, SlaveEvent,
    SlaveId, SlaveName, SlaveState,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Adapter bundle the master drives.
pub struct MasterDeps<L, W, N, P, X> {
    pub launcher: L,
    pub link: W,
    pub notify: N,
    pub packages: P,
    pub activity: X,
}

/// The provider master: slave registry, placement, timers, and the fault
/// manager, owned together so lifecycle operations can reach all of them.
pub struct Master<L, W, N, P, X, C> {
    config: MasterConfig,
    clock: C,
    deps: MasterDeps<L, W, N, P, X>,
    crashlog: CrashLog,
    registry: SlaveRegistry,
    scheduler: Scheduler,
    faults: FaultManager,
}

impl<L, W, N, P, X, C> Master<L, W, N, P, X, C>
where
    L: Launcher,
    W: WorkerLink,
    N: ClientNotify,
    P: PackageStore,
    X: ActivityMonitor,
    C: Clock,
{
    pub fn new(config: MasterConfig, deps: MasterDeps<L, W, N, P, X>, clock: C) -> Self {
        let crashlog = CrashLog::new(config.slave_log_path.clone());
        Self {
            config,
            clock,
            deps,
            crashlog,
            registry: SlaveRegistry::new(),
            scheduler: Scheduler::new(),
            faults: FaultManager::new(),
        }
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn registry(&self) -> &SlaveRegistry {
        &self.registry
    }

    pub fn faults(&self) -> &FaultManager {
        &self.faults
    }

    pub fn deps(&self) -> &MasterDeps<L, W, N, P, X> {
        &self.deps
    }

    pub fn deps_mut(&mut self) -> &mut MasterDeps<L, W, N, P, X> {
        &mut self.deps
    }

    // ── creation & reference counting ──────────────────────────────────────

    /// Create a slave record, or return the existing one with the same name.
    ///
    /// When the name matches an existing record whose secured flag differs,
    /// the existing value wins.
    pub fn create(
        &mut self,
        name: &SlaveName,
        secured: bool,
        abi: &str,
        pkgname: &str,
        network: bool,
    ) -> SlaveId {
        if let Some(id) = self.registry.find_by_name(name) {
            if self
                .registry
                .get(id)
                .is_some_and(|s| s.is_secured() != secured)
            {
                warn!(slave = %name, "creating slave's secured flag does not match the existing record");
            }
            return id;
        }

        let relaunch_count = self.config.slave_relaunch_count;
        let id = self.registry.insert(|id| {
            SlaveNode::new(id, name.clone(), secured, abi, pkgname, network, relaunch_count)
        });
        self.ref_slave(id);
        debug!(slave = %name, %id, secured, abi, network, "slave record created");
        id
    }

    fn ref_slave(&mut self, id: SlaveId) {
        if let Some(slave) = self.registry.get_mut(id) {
            slave.refcnt += 1;
        }
    }

    /// Drop one reference; the record is destroyed at zero.
    ///
    /// Returns `None` once the record is gone (or was never there).
    pub fn unref_slave(&mut self, id: SlaveId) -> Option<SlaveId> {
        let slave = self.registry.get_mut(id)?;
        if slave.refcnt == 0 {
            error!(%id, "slave refcnt is not valid");
            return None;
        }
        slave.refcnt -= 1;
        if slave.refcnt == 0 {
            self.destroy(id);
            return None;
        }
        Some(id)
    }

    fn destroy(&mut self, id: SlaveId) {
        match self.registry.get(id) {
            Some(slave) if slave.pid().is_some() => {
                // Destruction is only legal once the process is detached.
                error!(slave = %slave.name(), "slave is not deactivated; refusing to destroy");
                return;
            }
            Some(_) => {}
            None => return,
        }

        if let Some(mut slave) = self.registry.remove(id) {
            slave.invoke_observers(SlaveEvent::Delete);
            self.scheduler.cancel_all(id);
            debug!(slave = %slave.name(), %id, "slave record destroyed");
        }
    }

    /// Register an observer for `event` on a slave.
    pub fn add_observer(
        &mut self,
        id: SlaveId,
        event: SlaveEvent,
        observer: SlaveObserver,
    ) -> Result<(), MasterError> {
        let slave = self.registry.get_mut(id).ok_or(MasterError::NotExist)?;
        slave.add_observer(event, observer);
        Ok(())
    }

    // ── activation ─────────────────────────────────────────────────────────

    /// Launch the worker for a slave record.
    ///
    /// Returns `Already` if the slave has a process or a pending launch; a
    /// slave caught while terminating is flagged for reactivation instead.
    pub fn activate(&mut self, id: SlaveId) -> Result<(), MasterError> {
        let (name, state, pid, secured, abi, pkgname) = {
            let slave = self.registry.get(id).ok_or(MasterError::NotExist)?;
            (
                slave.name().clone(),
                slave.state(),
                slave.pid(),
                slave.is_secured(),
                slave.abi().to_string(),
                slave.pkgname().to_string(),
            )
        };

        if pid.is_some() {
            if state == SlaveState::RequestToTerminate {
                // Bring it back as soon as the pending exit lands.
                if let Some(slave) = self.registry.get_mut(id) {
                    slave.reactivate_slave = true;
                }
            }
            return Err(MasterError::Already);
        }
        if state == SlaveState::RequestToLaunch {
            debug!(slave = %name, "launch already requested; the launcher has not answered yet");
            return Err(MasterError::Already);
        }
        if matches!(
            state,
            SlaveState::Resumed
                | SlaveState::Paused
                | SlaveState::RequestToPause
                | SlaveState::RequestToResume
        ) {
            // Activated without a pid: an in-process worker is already serving.
            return Err(MasterError::Already);
        }

        if self.config.debug_mode {
            debug!(slave = %name, secured, abi, "debug mode: worker is launched by hand");
        } else {
            if let Some(slave) = self.registry.get_mut(id) {
                slave.relaunch_count = self.config.slave_relaunch_count;
            }

            let envelope = LaunchEnvelope {
                name: name.clone(),
                secured,
                abi,
            };
            let now = self.clock.now();
            match self.deps.launcher.launch(&pkgname, &envelope) {
                LaunchStatus::Hard(reason) => {
                    // pid stays absent; the activation deadline surfaces the fault
                    error!(target: "critical", slave = %name, ?reason, "failed to launch a new worker");
                }
                LaunchStatus::Transient(reason) => {
                    warn!(target: "critical", slave = %name, ?reason, "launch failed transiently; retrying soon");
                    self.scheduler.set(
                        id,
                        TimerKind::Relaunch,
                        self.config.slave_relaunch_time,
                        now,
                    );
                }
                LaunchStatus::Launched(pid) => {
                    debug!(slave = %name, service = %pkgname, pid, "worker launched");
                    if let Some(slave) = self.registry.get_mut(id) {
                        slave.pid = Some(pid);
                    }
                }
                LaunchStatus::Local => {
                    debug!(slave = %name, service = %pkgname, "worker runs in-process; waiting for its hello");
                }
            }
            self.scheduler.set(
                id,
                TimerKind::Activate,
                self.config.slave_activate_time,
                now,
            );
        }

        if let Some(slave) = self.registry.get_mut(id) {
            slave.state = SlaveState::RequestToLaunch;
        }
        // Keep the record alive while a process may be attached to it;
        // balanced in `deactivated`.
        self.ref_slave(id);
        Ok(())
    }

    /// The worker said hello.
    pub fn activated(&mut self, id: SlaveId) -> Result<(), MasterError> {
        let secured = {
            let slave = self.registry.get_mut(id).ok_or(MasterError::NotExist)?;
            slave.state = SlaveState::Resumed;
            slave.is_secured()
        };

        self.scheduler.cancel(id, TimerKind::Activate);
        self.scheduler.cancel(id, TimerKind::Relaunch);

        if self.deps.activity.is_paused() {
            debug!(%id, "display is inactive; pausing the fresh worker");
            let _ = self.pause(id);
        }

        if secured {
            debug!(%id, ttl = ?self.config.slave_ttl, "arming the idle lifetime of a secured slave");
            self.scheduler
                .set(id, TimerKind::Ttl, self.config.slave_ttl, self.clock.now());
        }

        let now = self.clock.now();
        if let Some(slave) = self.registry.get_mut(id) {
            // Stamp before the observers run; flap suppression reads this.
            slave.activated_at = Some(now);
            slave.reactivate_slave = false;
            slave.reactivate_instances = false;
            slave.invoke_observers(SlaveEvent::Activate);
        }

        Ok(())
    }

    // ── pause / resume ─────────────────────────────────────────────────────

    pub fn pause(&mut self, id: SlaveId) -> Result<(), MasterError> {
        let (state, pid) = {
            let slave = self.registry.get(id).ok_or(MasterError::NotExist)?;
            (slave.state(), slave.pid())
        };
        match state {
            SlaveState::RequestToLaunch
            | SlaveState::RequestToTerminate
            | SlaveState::Terminated => Err(MasterError::Invalid),
            SlaveState::Paused | SlaveState::RequestToPause => Ok(()),
            _ => {
                let timestamp = self.clock.timestamp();
                if let Some(slave) = self.registry.get_mut(id) {
                    slave.state = SlaveState::RequestToPause;
                }
                self.deps
                    .link
                    .request_pause(id, pid, timestamp)
                    .map_err(|e| {
                        error!(%id, error = %e, "failed to send the pause request");
                        MasterError::Fault
                    })
            }
        }
    }

    pub fn resume(&mut self, id: SlaveId) -> Result<(), MasterError> {
        let (state, pid) = {
            let slave = self.registry.get(id).ok_or(MasterError::NotExist)?;
            (slave.state(), slave.pid())
        };
        match state {
            SlaveState::RequestToLaunch
            | SlaveState::RequestToTerminate
            | SlaveState::Terminated => Err(MasterError::Invalid),
            SlaveState::Resumed | SlaveState::RequestToResume => Ok(()),
            _ => {
                let timestamp = self.clock.timestamp();
                if let Some(slave) = self.registry.get_mut(id) {
                    slave.state = SlaveState::RequestToResume;
                }
                self.deps
                    .link
                    .request_resume(id, pid, timestamp)
                    .map_err(|e| {
                        error!(%id, error = %e, "failed to send the resume request");
                        MasterError::Fault
                    })
            }
        }
    }

    /// Worker reply to a pause request. `None` means no reply arrived.
    ///
    /// Failures are not re-queued; the slave settles on the opposite steady
    /// state as a conservative default.
    pub fn on_pause_reply(&mut self, id: SlaveId, reply: Option<i32>) {
        let Some(slave) = self.registry.get_mut(id) else {
            return;
        };
        if slave.state == SlaveState::RequestToTerminate {
            debug!(%id, "slave is terminating; ignoring the pause reply");
            return;
        }
        match reply {
            Some(0) => {
                slave.state = SlaveState::Paused;
                self.deps.link.ping_freeze(id);
                slave.invoke_observers(SlaveEvent::Pause);
            }
            Some(ret) => {
                warn!(%id, ret, "worker rejected the pause request");
                slave.state = SlaveState::Resumed;
            }
            None => {
                error!(%id, "no reply to the pause request");
                slave.state = SlaveState::Resumed;
            }
        }
    }

    /// Worker reply to a resume request. `None` means no reply arrived.
    pub fn on_resume_reply(&mut self, id: SlaveId, reply: Option<i32>) {
        let Some(slave) = self.registry.get_mut(id) else {
            return;
        };
        if slave.state == SlaveState::RequestToTerminate {
            debug!(%id, "slave is terminating; ignoring the resume reply");
            return;
        }
        match reply {
            Some(0) => {
                slave.state = SlaveState::Resumed;
                self.deps.link.ping_thaw(id);
                slave.invoke_observers(SlaveEvent::Resume);
            }
            Some(ret) => {
                warn!(%id, ret, "worker rejected the resume request");
                slave.state = SlaveState::Paused;
            }
            None => {
                error!(%id, "no reply to the resume request");
                slave.state = SlaveState::Paused;
            }
        }
    }

    /// Pause every slave (display went inactive).
    pub fn pause_all(&mut self) {
        for id in self.registry.ids() {
            let _ = self.pause(id);
        }
    }

    /// Resume every slave (display became active).
    pub fn resume_all(&mut self) {
        for id in self.registry.ids() {
            let _ = self.resume(id);
        }
    }

    // ── deactivation ───────────────────────────────────────────────────────

    /// Ask the worker to terminate.
    ///
    /// An inactive slave with no instances is released instead. Returns
    /// `None` once the record is destroyed.
    pub fn deactivate(&mut self, id: SlaveId) -> Option<SlaveId> {
        let (activated, loaded_instances, pid, name) = {
            let slave = self.registry.get(id)?;
            (
                slave.is_activated(),
                slave.loaded_instances(),
                slave.pid(),
                slave.name().clone(),
            )
        };

        if !activated {
            warn!(slave = %name, "slave is already deactivated");
            if loaded_instances == 0 {
                return self.unref_slave(id);
            }
            return Some(id);
        }

        if let Some(slave) = self.registry.get_mut(id) {
            slave.state = SlaveState::RequestToTerminate;
        }

        if let Some(pid) = pid.filter(|p| *p > 0) {
            debug!(slave = %name, pid, "terminating worker");
            if let Err(e) = self.deps.launcher.terminate(pid) {
                error!(slave = %name, pid, error = %e, "terminate failed");
                return self.deactivated(id);
            }
        }

        Some(id)
    }

    /// The worker process is gone; settle the record.
    ///
    /// Drops the activate-balance reference, and possibly a second one when
    /// no instances remain — callers observe destruction through the `None`
    /// return.
    pub fn deactivated(&mut self, id: SlaveId) -> Option<SlaveId> {
        {
            let slave = self.registry.get_mut(id)?;
            slave.pid = None;
            slave.state = SlaveState::Terminated;
        }
        self.scheduler.cancel(id, TimerKind::Ttl);
        self.scheduler.cancel(id, TimerKind::Activate);
        self.scheduler.cancel(id, TimerKind::Relaunch);

        let votes = self
            .registry
            .get_mut(id)
            .map(|s| s.invoke_observers(SlaveEvent::Deactivate))
            .unwrap_or(0);

        let id = self.unref_slave(id)?;

        let (reactivate, no_instances) = {
            let slave = self.registry.get(id)?;
            (
                votes > 0 && slave.need_to_reactivate(),
                slave.loaded_instances() == 0,
            )
        };

        if reactivate {
            debug!(%id, "need to reactivate the slave");
            match self.activate(id) {
                Ok(()) | Err(MasterError::Already) => {}
                Err(e) => error!(%id, error = %e, "failed to reactivate the slave"),
            }
            Some(id)
        } else if no_instances {
            // No process and nothing placed on it: release the record.
            self.unref_slave(id)
        } else {
            Some(id)
        }
    }

    /// The worker died without being asked to.
    ///
    /// Runs blame attribution, then flap suppression, then the normal
    /// `deactivated` settlement.
    pub fn deactivated_by_fault(&mut self, id: SlaveId) -> Option<SlaveId> {
        let (activated, loaded_instances, name, pid) = {
            let slave = self.registry.get(id)?;
            (
                slave.is_activated(),
                slave.loaded_instances(),
                slave.name().clone(),
                slave.pid(),
            )
        };

        if !activated {
            debug!(slave = %name, "deactivation already in progress");
            if loaded_instances == 0 {
                return self.unref_slave(id);
            }
            return Some(id);
        }

        if let Some(slave) = self.registry.get_mut(id) {
            slave.fault_count += 1;
        }

        let timestamp = self.clock.timestamp();
        self.faults.check(
            &mut self.deps.packages,
            &mut self.deps.notify,
            &self.crashlog,
            id,
            &name,
            pid,
            timestamp,
        );

        if let Some(pid) = pid.filter(|p| *p > 0) {
            debug!(slave = %name, pid, "terminating the faulted worker");
            if let Err(e) = self.deps.launcher.terminate(pid) {
                error!(slave = %name, pid, error = %e, "terminate failed");
            }
        }

        let mut reactivate = true;
        let mut reactivate_instances = true;

        let now = self.clock.now();
        let within_window = self
            .registry
            .get(id)
            .and_then(|s| s.activated_at())
            .map(|at| now.duration_since(at) < self.config.minimum_reactivation_time)
            .unwrap_or(false);

        if within_window {
            if let Some(slave) = self.registry.get_mut(id) {
                slave.critical_fault_count += 1;
                if slave.loaded_instances == 0
                    || slave.critical_fault_count >= self.config.slave_max_load
                {
                    error!(
                        slave = %name,
                        "deaths are too fast and frequent; stopping auto reactivation"
                    );
                    reactivate = false;
                    reactivate_instances = false;
                    slave.critical_fault_count = 0;
                    // Fault observers may inspect the slave before settlement.
                    slave.invoke_observers(SlaveEvent::Fault);
                }
            }
        } else if let Some(slave) = self.registry.get_mut(id) {
            slave.critical_fault_count = 0;
        }

        if let Some(slave) = self.registry.get_mut(id) {
            slave.reactivate_slave = reactivate;
            slave.reactivate_instances = reactivate_instances;
        }

        self.deactivated(id)
    }

    /// A worker exit notice arrived for `pid`.
    ///
    /// Routes requested terminations to `deactivated` and everything else
    /// to the fault path.
    pub fn on_dead(&mut self, pid: Pid) -> Option<SlaveId> {
        let id = self.registry.find_by_pid(pid)?;
        let state = self.registry.get(id)?.state();
        if state == SlaveState::RequestToTerminate {
            debug!(pid, "worker exited on request");
            self.deactivated(id)
        } else {
            warn!(pid, state = %state, "worker died unexpectedly");
            self.deactivated_by_fault(id)
        }
    }

    /// A worker announced itself by name.
    pub fn on_hello(&mut self, name: &SlaveName, pid: Pid) -> Result<SlaveId, MasterError> {
        let id = self
            .registry
            .find_by_name(name)
            .ok_or(MasterError::NotExist)?;
        if let Some(slave) = self.registry.get_mut(id) {
            if slave.pid.is_none() {
                debug!(slave = %name, pid, "attaching the announced pid");
                slave.pid = Some(pid);
            }
        }
        self.activated(id)?;
        Ok(id)
    }

    /// The launcher reported which service a fresh process belongs to;
    /// reattach it to the pending record.
    pub fn attach_by_pkgname(&mut self, pkgname: &str, pid: Pid) -> Option<SlaveId> {
        let id = self.registry.find_by_pkgname(pkgname)?;
        if let Some(slave) = self.registry.get_mut(id) {
            debug!(slave = %slave.name(), pid, "pid updated from the launch report");
            slave.pid = Some(pid);
        }
        Some(id)
    }

    /// Update the recorded pid of a slave.
    pub fn set_pid(&mut self, id: SlaveId, pid: Pid) -> Result<(), MasterError> {
        let slave = self.registry.get_mut(id).ok_or(MasterError::Invalid)?;
        debug!(slave = %slave.name(), old = ?slave.pid, new = pid, "slave pid updated");
        slave.pid = Some(pid);
        Ok(())
    }

    // ── timers ─────────────────────────────────────────────────────────────

    /// Earliest timer deadline, for the event loop.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Sweep expired timers and run their handlers.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        for (id, kind) in self.scheduler.fired(now) {
            self.on_timer(id, kind);
        }
    }

    fn on_timer(&mut self, id: SlaveId, kind: TimerKind) {
        match kind {
            TimerKind::Ttl => self.ttl_expired(id),
            TimerKind::Activate => self.activate_expired(id),
            TimerKind::Relaunch => self.relaunch_due(id),
        }
    }

    fn ttl_expired(&mut self, id: SlaveId) {
        // The scheduler entry is gone by now, so `expired_ttl` reads false
        // for this deactivation: downstream can tell TTL expiry from a fault.
        let Some(slave) = self.registry.get_mut(id) else {
            return;
        };
        info!(slave = %slave.name(), "secured slave idled out");
        slave.reactivate_slave = false;
        slave.reactivate_instances = true;
        if self.deactivate(id).is_none() {
            debug!(%id, "slave record destroyed");
        }
    }

    fn activate_expired(&mut self, id: SlaveId) {
        self.scheduler.cancel(id, TimerKind::Relaunch);
        error!(
            target: "critical",
            %id,
            deadline = ?self.config.slave_activate_time,
            "worker did not activate in time"
        );
        self.launch_deadline_fault(id);
    }

    fn relaunch_due(&mut self, id: SlaveId) {
        let (name, relaunch_count, secured, abi, pkgname) = {
            let Some(slave) = self.registry.get(id) else {
                return;
            };
            (
                slave.name().clone(),
                slave.relaunch_count,
                slave.is_secured(),
                slave.abi().to_string(),
                slave.pkgname().to_string(),
            )
        };

        if !self.scheduler.is_armed(id, TimerKind::Activate) {
            error!(slave = %name, "activation deadline is not armed; treating as a launch fault");
            self.launch_deadline_fault(id);
            return;
        }

        if relaunch_count == 0 {
            error!(target: "critical", slave = %name, "relaunch budget exhausted");
            self.scheduler.cancel(id, TimerKind::Activate);
            self.launch_deadline_fault(id);
            return;
        }

        let envelope = LaunchEnvelope {
            name: name.clone(),
            secured,
            abi,
        };
        let now = self.clock.now();
        match self.deps.launcher.launch(&pkgname, &envelope) {
            LaunchStatus::Hard(reason) => {
                error!(target: "critical", slave = %name, ?reason, "failed to relaunch the worker");
                self.scheduler.cancel(id, TimerKind::Activate);
                self.launch_deadline_fault(id);
            }
            LaunchStatus::Transient(reason) => {
                if let Some(slave) = self.registry.get_mut(id) {
                    slave.relaunch_count -= 1;
                    slave.pid = None;
                    warn!(
                        target: "critical",
                        slave = %name,
                        ?reason,
                        remaining = slave.relaunch_count,
                        "relaunch failed transiently; trying again"
                    );
                }
                self.scheduler.reset(id, TimerKind::Activate, now);
                self.scheduler.set(
                    id,
                    TimerKind::Relaunch,
                    self.config.slave_relaunch_time,
                    now,
                );
            }
            LaunchStatus::Launched(pid) => {
                debug!(slave = %name, service = %pkgname, pid, "worker relaunched");
                if let Some(slave) = self.registry.get_mut(id) {
                    slave.pid = Some(pid);
                }
                self.scheduler.reset(id, TimerKind::Activate, now);
            }
            LaunchStatus::Local => {
                debug!(slave = %name, service = %pkgname, "worker runs in-process");
                self.scheduler.reset(id, TimerKind::Activate, now);
            }
        }
    }

    /// Shared "never said hello" path: count the fault, drop the
    /// reactivation intent, kill the process if any, settle the record.
    fn launch_deadline_fault(&mut self, id: SlaveId) {
        let (name, pid) = {
            let Some(slave) = self.registry.get_mut(id) else {
                return;
            };
            slave.fault_count += 1;
            slave.invoke_observers(SlaveEvent::Fault);
            slave.reactivate_slave = false;
            slave.reactivate_instances = false;
            (slave.name().clone(), slave.pid())
        };

        if let Some(pid) = pid.filter(|p| *p > 0) {
            debug!(slave = %name, pid, "terminating the unresponsive worker");
            if let Err(e) = self.deps.launcher.terminate(pid) {
                error!(slave = %name, pid, error = %e, "terminate failed");
            }
        }

        self.deactivated(id);
    }

    // ── TTL operations ─────────────────────────────────────────────────────

    /// Extend a secured slave's idle lifetime to the full TTL from now.
    pub fn give_more_ttl(&mut self, id: SlaveId) -> Result<(), MasterError> {
        self.require_secured_ttl(id)?;
        let now = self.clock.now();
        self.scheduler
            .extend_to(id, TimerKind::Ttl, self.config.slave_ttl, now);
        Ok(())
    }

    /// Suspend the idle lifetime (while the worker is busy on our behalf).
    pub fn freeze_ttl(&mut self, id: SlaveId) -> Result<(), MasterError> {
        self.require_secured_ttl(id)?;
        let now = self.clock.now();
        self.scheduler.freeze(id, TimerKind::Ttl, now);
        Ok(())
    }

    /// Resume the idle lifetime, granting a full TTL from now.
    pub fn thaw_ttl(&mut self, id: SlaveId) -> Result<(), MasterError> {
        self.require_secured_ttl(id)?;
        let now = self.clock.now();
        self.scheduler.thaw(id, TimerKind::Ttl, now);
        self.scheduler
            .extend_to(id, TimerKind::Ttl, self.config.slave_ttl, now);
        Ok(())
    }

    /// Remaining idle lifetime; zero when no TTL timer is armed.
    pub fn ttl(&self, id: SlaveId) -> Duration {
        self.scheduler
            .pending(id, TimerKind::Ttl, self.clock.now())
            .unwrap_or_default()
    }

    /// Whether the slave still has an armed TTL timer.
    ///
    /// During a TTL-triggered deactivation the timer is already gone, so
    /// this reads false; during a fault it is still armed.
    pub fn expired_ttl(&self, id: SlaveId) -> bool {
        self.registry
            .get(id)
            .is_some_and(|s| s.is_secured() && self.scheduler.is_armed(id, TimerKind::Ttl))
    }

    fn require_secured_ttl(&self, id: SlaveId) -> Result<(), MasterError> {
        let slave = self.registry.get(id).ok_or(MasterError::NotExist)?;
        if !slave.is_secured() || !self.scheduler.is_armed(id, TimerKind::Ttl) {
            return Err(MasterError::Invalid);
        }
        Ok(())
    }

    // ── placement accounting ───────────────────────────────────────────────

    pub fn load_package(&mut self, id: SlaveId) {
        if let Some(slave) = self.registry.get_mut(id) {
            if slave.is_secured() && slave.loaded_packages >= 1 {
                warn!(slave = %slave.name(), "secured slave already hosts a package");
            }
            slave.loaded_packages += 1;
        }
    }

    pub fn unload_package(&mut self, id: SlaveId) {
        match self.registry.get_mut(id) {
            Some(slave) if slave.loaded_packages > 0 => slave.loaded_packages -= 1,
            _ => warn!(%id, "slave loaded package count is not correct"),
        }
    }

    pub fn load_instance(&mut self, id: SlaveId) {
        if let Some(slave) = self.registry.get_mut(id) {
            slave.loaded_instances += 1;
            debug!(slave = %slave.name(), instances = slave.loaded_instances, "instance loaded");
        }
    }

    /// Drop one instance; an activated slave left with none is deactivated.
    pub fn unload_instance(&mut self, id: SlaveId) -> Option<SlaveId> {
        let (instances, activated) = {
            let slave = self.registry.get_mut(id)?;
            if slave.loaded_instances == 0 {
                warn!(%id, "slave loaded instance count is not correct");
                return Some(id);
            }
            slave.loaded_instances -= 1;
            debug!(slave = %slave.name(), instances = slave.loaded_instances, "instance unloaded");
            (slave.loaded_instances, slave.is_activated())
        };

        if instances == 0 && activated {
            if let Some(slave) = self.registry.get_mut(id) {
                slave.reactivate_slave = false;
                slave.reactivate_instances = false;
            }
            return self.deactivate(id);
        }
        Some(id)
    }

    // ── placement ──────────────────────────────────────────────────────────

    /// Select an existing compatible worker for a new package.
    pub fn find_available(&self, abi: &str, secured: bool, network: bool) -> Option<SlaveId> {
        self.registry.find_available(
            abi,
            secured,
            network,
            &self.config.default_abi,
            self.config.slave_max_load,
        )
    }

    pub fn find_by_name(&self, name: &SlaveName) -> Option<SlaveId> {
        self.registry.find_by_name(name)
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<SlaveId> {
        self.registry.find_by_pid(pid)
    }

    // ── quiesce ────────────────────────────────────────────────────────────

    /// Deactivate every slave, stamping the given reactivation intent.
    ///
    /// Nestable: only the outermost call acts. Returns the number of slaves
    /// touched.
    pub fn deactivate_all(&mut self, reactivate: bool, reactivate_instances: bool) -> usize {
        self.registry.deactivate_all_refcnt += 1;
        if self.registry.deactivate_all_refcnt > 1 {
            return 0;
        }
        debug!("deactivate all");

        let mut count = 0;
        for id in self.registry.ids() {
            if let Some(slave) = self.registry.get_mut(id) {
                slave.reactivate_instances = reactivate_instances;
                slave.reactivate_slave = reactivate;
            } else {
                continue;
            }
            self.deactivate(id);
            count += 1;
        }
        count
    }

    /// Undo one level of `deactivate_all`; the outermost call reactivates
    /// every slave.
    pub fn activate_all(&mut self) -> usize {
        self.registry.deactivate_all_refcnt =
            self.registry.deactivate_all_refcnt.saturating_sub(1);
        if self.registry.deactivate_all_refcnt > 0 {
            return 0;
        }
        debug!("activate all");

        let mut count = 0;
        for id in self.registry.ids() {
            let _ = self.activate(id);
            count += 1;
        }
        count
    }

    // ── fault bookkeeping ──────────────────────────────────────────────────

    /// Record an outbound package call on a worker.
    pub fn func_call(&mut self, id: SlaveId, pkgname: &str, filename: &str, funcname: &str) {
        let timestamp = self.clock.timestamp();
        self.faults.func_call(id, pkgname, filename, funcname, timestamp);
    }

    /// Record the matching return of an earlier call.
    pub fn func_ret(
        &mut self,
        id: SlaveId,
        pkgname: &str,
        filename: &str,
        funcname: &str,
    ) -> Result<(), MasterError> {
        self.faults.func_ret(id, pkgname, filename, funcname)
    }

    /// Outstanding fault markers.
    pub fn fault_in_progress(&self) -> i32 {
        self.faults.fault_in_progress()
    }

    /// A worker self-reported a fault in `pkgname`.
    pub fn mark_fault(
        &mut self,
        id: SlaveId,
        pkgname: &str,
        filename: &str,
        funcname: &str,
    ) -> Result<(), MasterError> {
        let (name, pid) = {
            let slave = self.registry.get(id).ok_or(MasterError::NotExist)?;
            (slave.name().clone(), slave.pid())
        };
        let timestamp = self.clock.timestamp();
        self.faults.mark_fault(
            &mut self.deps.packages,
            &mut self.deps.notify,
            &name,
            pid,
            pkgname,
            filename,
            funcname,
            timestamp,
        )
    }

    /// Send a fault notice to one client.
    pub fn unicast_fault(&mut self, client: &ClientId, notice: &FaultNotice) {
        self.deps.notify.unicast(client, notice);
    }
}

#[cfg(test)]
#[path = "master_tests.rs"]
mod tests;

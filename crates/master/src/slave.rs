// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slave records and their per-event observers.

use lwm_core::{ObserverVerdict, Pid, SlaveEvent, SlaveId, SlaveName, SlaveState};
use std::time::Instant;

/// Observer callback: inspects the slave and returns what to do with the
/// registration.
pub type SlaveObserver = Box<dyn FnMut(&SlaveNode) -> ObserverVerdict + Send>;

/// Per-event observer lists.
///
/// Registration prepends and invocation walks front to back, so observers
/// run in reverse registration order:
///
/// ```text
/// add(CALLBACK_01); add(CALLBACK_02); add(CALLBACK_03);
/// // invocation: CALLBACK_03, CALLBACK_02, CALLBACK_01
/// ```
#[derive(Default)]
pub(crate) struct ObserverSet {
    activate: Vec<SlaveObserver>,
    deactivate: Vec<SlaveObserver>,
    delete: Vec<SlaveObserver>,
    fault: Vec<SlaveObserver>,
    pause: Vec<SlaveObserver>,
    resume: Vec<SlaveObserver>,
}

impl ObserverSet {
    fn list_mut(&mut self, event: SlaveEvent) -> &mut Vec<SlaveObserver> {
        match event {
            SlaveEvent::Activate => &mut self.activate,
            SlaveEvent::Deactivate => &mut self.deactivate,
            SlaveEvent::Delete => &mut self.delete,
            SlaveEvent::Fault => &mut self.fault,
            SlaveEvent::Pause => &mut self.pause,
            SlaveEvent::Resume => &mut self.resume,
        }
    }

    pub fn add(&mut self, event: SlaveEvent, observer: SlaveObserver) {
        self.list_mut(event).insert(0, observer);
    }

    fn take(&mut self, event: SlaveEvent) -> Vec<SlaveObserver> {
        std::mem::take(self.list_mut(event))
    }

    fn restore(&mut self, event: SlaveEvent, mut kept: Vec<SlaveObserver>) {
        let list = self.list_mut(event);
        // registrations that arrived while the list was detached stay newest-first
        let mut fresh = std::mem::take(list);
        fresh.append(&mut kept);
        *list = fresh;
    }
}

/// A worker process record.
///
/// Owned by the registry; all mutation funnels through the master's
/// lifecycle operations. Destruction happens only when the reference count
/// reaches zero, and only after the pid has been cleared.
pub struct SlaveNode {
    id: SlaveId,
    name: SlaveName,
    abi: String,
    pkgname: String,
    secured: bool,
    network: bool,

    pub(crate) refcnt: u32,
    pub(crate) state: SlaveState,
    pub(crate) pid: Option<Pid>,
    pub(crate) rpc_handle: Option<i32>,

    pub(crate) fault_count: u32,
    pub(crate) critical_fault_count: u32,

    pub(crate) loaded_packages: u32,
    pub(crate) loaded_instances: u32,

    pub(crate) reactivate_slave: bool,
    pub(crate) reactivate_instances: bool,

    pub(crate) relaunch_count: u32,
    pub(crate) activated_at: Option<Instant>,

    pub(crate) observers: ObserverSet,
}

impl SlaveNode {
    pub(crate) fn new(
        id: SlaveId,
        name: SlaveName,
        secured: bool,
        abi: &str,
        pkgname: &str,
        network: bool,
        relaunch_count: u32,
    ) -> Self {
        Self {
            id,
            name,
            abi: abi.to_string(),
            pkgname: pkgname.to_string(),
            secured,
            network,
            refcnt: 0,
            state: SlaveState::Terminated,
            pid: None,
            rpc_handle: None,
            fault_count: 0,
            critical_fault_count: 0,
            loaded_packages: 0,
            loaded_instances: 0,
            reactivate_slave: false,
            reactivate_instances: false,
            relaunch_count,
            activated_at: None,
            observers: ObserverSet::default(),
        }
    }

    pub fn id(&self) -> SlaveId {
        self.id
    }

    pub fn name(&self) -> &SlaveName {
        &self.name
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    /// Name of the service the launcher spawns for this slave.
    pub fn pkgname(&self) -> &str {
        &self.pkgname
    }

    pub fn is_secured(&self) -> bool {
        self.secured
    }

    pub fn network(&self) -> bool {
        self.network
    }

    pub fn set_network(&mut self, network: bool) {
        self.network = network;
    }

    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn state(&self) -> SlaveState {
        self.state
    }

    pub fn is_activated(&self) -> bool {
        self.state.is_activated()
    }

    pub fn refcnt(&self) -> u32 {
        self.refcnt
    }

    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    pub fn critical_fault_count(&self) -> u32 {
        self.critical_fault_count
    }

    pub fn loaded_packages(&self) -> u32 {
        self.loaded_packages
    }

    pub fn loaded_instances(&self) -> u32 {
        self.loaded_instances
    }

    pub fn need_to_reactivate(&self) -> bool {
        self.reactivate_slave
    }

    pub fn need_to_reactivate_instances(&self) -> bool {
        self.reactivate_instances
    }

    pub fn set_reactivation(&mut self, flag: bool) {
        self.reactivate_slave = flag;
    }

    pub fn set_reactivate_instances(&mut self, flag: bool) {
        self.reactivate_instances = flag;
    }

    pub fn activated_at(&self) -> Option<Instant> {
        self.activated_at
    }

    pub fn rpc_handle(&self) -> Option<i32> {
        self.rpc_handle
    }

    pub fn set_rpc_handle(&mut self, handle: i32) {
        self.rpc_handle = Some(handle);
    }

    /// Register an observer for `event`.
    pub fn add_observer(&mut self, event: SlaveEvent, observer: SlaveObserver) {
        self.observers.add(event, observer);
    }

    /// Invoke the observers registered for `event`.
    ///
    /// Returns the number of `Reactivate` votes. Observers returning
    /// `Remove` are dropped from the list.
    pub(crate) fn invoke_observers(&mut self, event: SlaveEvent) -> u32 {
        let list = self.observers.take(event);
        let mut votes = 0;
        let mut kept = Vec::with_capacity(list.len());
        for mut observer in list {
            match observer(&*self) {
                ObserverVerdict::Keep => kept.push(observer),
                ObserverVerdict::Remove => {}
                ObserverVerdict::Reactivate => {
                    votes += 1;
                    kept.push(observer);
                }
            }
        }
        self.observers.restore(event, kept);
        votes
    }
}

impl std::fmt::Debug for SlaveNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlaveNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("pid", &self.pid)
            .field("refcnt", &self.refcnt)
            .field("secured", &self.secured)
            .field("loaded_packages", &self.loaded_packages)
            .field("loaded_instances", &self.loaded_instances)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "slave_tests.rs"]
mod tests;

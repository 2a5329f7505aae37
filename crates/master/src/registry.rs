// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Insertion-ordered slave registry with placement lookups.

use crate::slave::SlaveNode;
use lwm_core::{Pid, SlaveId, SlaveName, SlaveState};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Owns every slave record. Scans run in insertion order.
#[derive(Default)]
pub struct SlaveRegistry {
    slaves: HashMap<SlaveId, SlaveNode>,
    order: Vec<SlaveId>,
    next_id: u64,
    /// Nesting depth of `deactivate_all`; only the outermost pair acts.
    pub(crate) deactivate_all_refcnt: u32,
}

impl SlaveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, build: impl FnOnce(SlaveId) -> SlaveNode) -> SlaveId {
        self.next_id += 1;
        let id = SlaveId(self.next_id);
        self.slaves.insert(id, build(id));
        self.order.push(id);
        id
    }

    pub(crate) fn remove(&mut self, id: SlaveId) -> Option<SlaveNode> {
        self.order.retain(|s| *s != id);
        self.slaves.remove(&id)
    }

    pub fn get(&self, id: SlaveId) -> Option<&SlaveNode> {
        self.slaves.get(&id)
    }

    pub fn get_mut(&mut self, id: SlaveId) -> Option<&mut SlaveNode> {
        self.slaves.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All slave ids in insertion order.
    pub fn ids(&self) -> Vec<SlaveId> {
        self.order.clone()
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SlaveNode> {
        self.order.iter().filter_map(|id| self.slaves.get(id))
    }

    pub fn find_by_name(&self, name: &SlaveName) -> Option<SlaveId> {
        self.iter().find(|s| s.name() == name).map(|s| s.id())
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<SlaveId> {
        self.iter().find(|s| s.pid() == Some(pid)).map(|s| s.id())
    }

    pub fn find_by_rpc_handle(&self, handle: i32) -> Option<SlaveId> {
        if handle <= 0 {
            warn!(handle, "invalid RPC handle");
            return None;
        }
        self.iter()
            .find(|s| s.rpc_handle() == Some(handle))
            .map(|s| s.id())
    }

    /// Find a record for `pkgname` that has no process attached yet.
    ///
    /// Used to reattach a just-spawned worker to its pending record.
    pub fn find_by_pkgname(&self, pkgname: &str) -> Option<SlaveId> {
        self.iter()
            .find(|s| s.pkgname() == pkgname && s.pid().is_none())
            .map(|s| s.id())
    }

    /// Select an existing worker that can host one more package.
    ///
    /// Returns `None` when no compatible worker exists; the caller is
    /// expected to create and activate a fresh one.
    pub fn find_available(
        &self,
        abi: &str,
        secured: bool,
        network: bool,
        default_abi: &str,
        max_load: u32,
    ) -> Option<SlaveId> {
        for slave in self.iter() {
            if slave.is_secured() != secured {
                continue;
            }

            if slave.state() == SlaveState::RequestToTerminate && slave.loaded_instances() == 0 {
                // The record will be released as soon as the exit lands;
                // not reusable.
                continue;
            }

            if !slave.abi().eq_ignore_ascii_case(abi) {
                continue;
            }

            if slave.is_secured() {
                if slave.loaded_packages() == 0 {
                    debug!(slave = %slave.name(), "found an empty secured slave");
                    return Some(slave.id());
                }
            } else if slave.network() == network {
                debug!(
                    slave = %slave.name(),
                    loaded_packages = slave.loaded_packages(),
                    network = slave.network(),
                    "placement candidate"
                );
                if abi.eq_ignore_ascii_case(default_abi) {
                    if slave.loaded_packages() < max_load {
                        return Some(slave.id());
                    }
                } else {
                    return Some(slave.id());
                }
            }
        }

        None
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

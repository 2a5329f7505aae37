// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for the master specs.

use lwm_adapters::{FakeActivity, FakeLauncher, FakeLink, FakeNotify, MemoryPackageStore};
use lwm_core::{FakeClock, MasterConfig, Pid, SlaveId, SlaveName, SlaveState};
use lwm_master::{Master, MasterDeps, SlaveNode};

pub type SpecMaster =
    Master<FakeLauncher, FakeLink, FakeNotify, MemoryPackageStore, FakeActivity, FakeClock>;

pub struct Harness {
    pub master: SpecMaster,
    pub launcher: FakeLauncher,
    pub link: FakeLink,
    pub notify: FakeNotify,
    pub clock: FakeClock,
    dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
    harness_with(MasterConfig::default())
}

pub fn harness_with(mut config: MasterConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    config.slave_log_path = dir.path().to_path_buf();

    let launcher = FakeLauncher::new();
    let link = FakeLink::new();
    let notify = FakeNotify::new();
    let clock = FakeClock::new();

    let mut packages = MemoryPackageStore::new();
    for pkg in ["live-c", "p", "live-clock", "live-weather"] {
        packages.insert(pkg);
    }

    let master = Master::new(
        config,
        MasterDeps {
            launcher: launcher.clone(),
            link: link.clone(),
            notify: notify.clone(),
            packages,
            activity: FakeActivity::new(),
        },
        clock.clone(),
    );

    Harness {
        master,
        launcher,
        link,
        notify,
        clock,
        dir,
    }
}

impl Harness {
    /// `A = (name="s1", secured=false, abi="c", pkgname="live-c", network=0)`
    pub fn create_a(&mut self) -> SlaveId {
        self.master
            .create(&SlaveName::new("s1"), false, "c", "live-c", false)
    }

    /// `B = (name="s2", secured=true, abi="c", pkgname="live-c", network=0)`
    pub fn create_b(&mut self) -> SlaveId {
        self.master
            .create(&SlaveName::new("s2"), true, "c", "live-c", false)
    }

    /// Create, launch, and deliver the hello for a worker.
    pub fn spawn(&mut self, name: &str, secured: bool) -> SlaveId {
        let id = self
            .master
            .create(&SlaveName::new(name), secured, "c", "live-c", false);
        self.master.activate(id).unwrap();
        self.master.activated(id).unwrap();
        id
    }

    pub fn node(&self, id: SlaveId) -> &SlaveNode {
        self.master.registry().get(id).unwrap()
    }

    pub fn state(&self, id: SlaveId) -> SlaveState {
        self.node(id).state()
    }

    pub fn pid(&self, id: SlaveId) -> Pid {
        self.node(id).pid().unwrap()
    }

    /// Drop a crash log for `pid` as a dying worker would.
    pub fn write_crashlog(&self, pid: Pid, first_line: &str) {
        std::fs::write(self.dir.path().join(format!("slave.{pid}")), first_line).unwrap();
    }
}

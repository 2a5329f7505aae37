// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lwm_adapters::{FakeActivity, FakeLauncher, FakeLink, FakeNotify, MemoryPackageStore};
use lwm_core::{FakeClock, MasterConfig, SlaveState};
use lwm_master::MasterDeps;

type TestMaster =
    Master<FakeLauncher, FakeLink, FakeNotify, MemoryPackageStore, FakeActivity, FakeClock>;

fn test_master(dir: &tempfile::TempDir) -> (TestMaster, FakeNotify) {
    let config = MasterConfig {
        slave_log_path: dir.path().to_path_buf(),
        ..MasterConfig::default()
    };
    let notify = FakeNotify::new();
    let mut packages = MemoryPackageStore::new();
    packages.insert("live-c");
    let master = Master::new(
        config,
        MasterDeps {
            launcher: FakeLauncher::new(),
            link: FakeLink::new(),
            notify: notify.clone(),
            packages,
            activity: FakeActivity::new(),
        },
        FakeClock::new(),
    );
    (master, notify)
}

#[tokio::test(flavor = "current_thread")]
async fn loop_dispatches_events_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let (mut master, _notify) = test_master(&dir);
    let id = master.create(&SlaveName::new("s1"), false, "c", "live-c", false);
    master.activate(id).unwrap();

    let (tx, mut rx) = mpsc::channel(16);
    let name = SlaveName::new("s1");
    tx.send(MasterEvent::Hello { name, pid: 900 })
        .await
        .unwrap();
    tx.send(MasterEvent::Shutdown).await.unwrap();

    run(&mut master, &mut rx).await;

    let slave = master.registry().get(id).unwrap();
    assert_eq!(slave.state(), SlaveState::Resumed);
}

#[tokio::test(flavor = "current_thread")]
async fn loop_stops_when_all_senders_drop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut master, _notify) = test_master(&dir);

    let (tx, mut rx) = mpsc::channel::<MasterEvent>(1);
    drop(tx);

    run(&mut master, &mut rx).await;
}

#[tokio::test(flavor = "current_thread")]
async fn dead_event_routes_through_blame_attribution() {
    let dir = tempfile::tempdir().unwrap();
    let (mut master, notify) = test_master(&dir);
    let id = master.create(&SlaveName::new("s1"), false, "c", "live-c", false);
    master.activate(id).unwrap();
    master.activated(id).unwrap();
    master.load_instance(id);
    let pid = master.registry().get(id).unwrap().pid().unwrap();

    let name = SlaveName::new("s1");
    let (tx, mut rx) = mpsc::channel(16);
    tx.send(MasterEvent::Call {
        name: name.clone(),
        pkgname: "live-c".to_string(),
        filename: "f.c".to_string(),
        funcname: "g".to_string(),
    })
    .await
    .unwrap();
    tx.send(MasterEvent::Dead { pid }).await.unwrap();
    tx.send(MasterEvent::Shutdown).await.unwrap();

    run(&mut master, &mut rx).await;

    let broadcasts = notify.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].pkgname, "live-c");
    assert_eq!(broadcasts[0].funcname, "g");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn loop_fires_due_timers_while_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (mut master, _notify) = test_master(&dir);
    let id = master.create(&SlaveName::new("s2"), true, "c", "live-c", false);
    master.activate(id).unwrap();
    master.activated(id).unwrap();
    master.load_instance(id);

    // The secured slave's TTL is armed; march the fake clock past it so the
    // first sweep finds the timer due.
    let ttl = master.config().slave_ttl;
    master.clock().advance(ttl + std::time::Duration::from_secs(1));

    let (tx, mut rx) = mpsc::channel(16);
    tokio::spawn(async move {
        // Lands after the loop's own timer gate (paused time auto-advances
        // to the earliest sleeper first), so the sweep has already run.
        tokio::time::sleep(ttl * 2).await;
        let _ = tx.send(MasterEvent::Shutdown).await;
    });

    run(&mut master, &mut rx).await;

    let slave = master.registry().get(id).unwrap();
    assert_eq!(slave.state(), SlaveState::RequestToTerminate);
}

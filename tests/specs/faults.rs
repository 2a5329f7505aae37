// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blame attribution and flap suppression.

use crate::prelude::*;
use lwm_core::{MasterConfig, SlaveState};
use std::time::Duration;

#[test]
fn matched_call_brackets_leave_no_fault_mark() {
    let mut h = harness();
    let a = h.spawn("s1", false);

    h.master.func_call(a, "p", "f.c", "g");
    h.master.func_call(a, "p", "f.c", "h");
    assert_eq!(h.master.fault_in_progress(), 2);

    h.master.func_ret(a, "p", "f.c", "g").unwrap();
    h.master.func_ret(a, "p", "f.c", "h").unwrap();
    assert_eq!(h.master.fault_in_progress(), 0);
}

#[test]
fn a_dead_worker_is_blamed_by_its_topmost_call() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    h.master.load_instance(a);
    let pid = h.pid(a);

    h.master.func_call(a, "p", "f.c", "g");
    h.master.func_call(a, "p", "f.c", "h");

    h.clock
        .advance(h.master.config().minimum_reactivation_time + Duration::from_secs(1));
    h.master.on_dead(pid);

    let broadcasts = h.notify.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].pkgname, "p");
    assert_eq!(broadcasts[0].filename, "f.c");
    assert_eq!(broadcasts[0].funcname, "h");
    assert!(h.master.faults().calls().is_empty());
}

#[test]
fn crash_log_evidence_beats_the_call_stack() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    h.master.load_instance(a);
    let pid = h.pid(a);

    h.master.func_call(a, "p", "f.c", "g");
    h.write_crashlog(pid, "liblive-live-clock.so\n");

    h.clock
        .advance(h.master.config().minimum_reactivation_time + Duration::from_secs(1));
    h.master.on_dead(pid);

    let broadcasts = h.notify.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].pkgname, "live-clock");
    assert_eq!(broadcasts[0].filename, "");
    assert!(h.master.faults().calls().is_empty());
}

#[test]
fn a_secured_worker_is_blamed_by_its_assignment() {
    let mut h = harness();
    let b = h.spawn("s2", true);
    h.master.load_instance(b);
    let pid = h.pid(b);
    h.master.deps_mut().packages.assign_secured(b, "live-weather");

    h.clock
        .advance(h.master.config().minimum_reactivation_time + Duration::from_secs(1));
    h.master.on_dead(pid);

    let broadcasts = h.notify.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].pkgname, "live-weather");
}

#[test]
fn one_fast_death_keeps_the_reactivation_intent() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    h.master.load_instance(a);
    let pid = h.pid(a);

    h.clock
        .advance(h.master.config().minimum_reactivation_time / 2);
    h.master.on_dead(pid);

    assert_eq!(h.node(a).critical_fault_count(), 1);
    assert!(h.node(a).need_to_reactivate());
    assert!(h.node(a).need_to_reactivate_instances());
}

#[test]
fn repeated_fast_deaths_cross_the_threshold_and_stop_reactivation() {
    let mut h = harness_with(MasterConfig {
        slave_max_load: 2,
        ..MasterConfig::default()
    });
    let a = h.spawn("s1", false);
    h.master.load_instance(a);
    h.master
        .add_observer(
            a,
            lwm_core::SlaveEvent::Deactivate,
            Box::new(|_| lwm_core::ObserverVerdict::Reactivate),
        )
        .unwrap();

    // First fast death: counter at max_load - 1, reactivation proceeds
    let pid = h.pid(a);
    h.clock
        .advance(h.master.config().minimum_reactivation_time / 2);
    h.master.on_dead(pid);
    assert_eq!(h.node(a).critical_fault_count(), 1);
    assert_eq!(h.state(a), SlaveState::RequestToLaunch);

    // The replacement says hello, then dies fast as well
    h.master.activated(a).unwrap();
    let pid = h.pid(a);
    h.clock
        .advance(h.master.config().minimum_reactivation_time / 2);
    h.master.on_dead(pid);

    assert!(!h.node(a).need_to_reactivate());
    assert!(!h.node(a).need_to_reactivate_instances());
    assert_eq!(h.node(a).critical_fault_count(), 0);
    assert_eq!(h.state(a), SlaveState::Terminated, "no further relaunch");
}

#[test]
fn calls_of_other_workers_survive_a_death() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    let b = h.spawn("other", false);
    h.master.load_instance(a);
    let pid = h.pid(a);

    h.master.func_call(a, "p", "f.c", "g");
    h.master.func_call(b, "live-clock", "c.c", "tick");

    h.clock
        .advance(h.master.config().minimum_reactivation_time + Duration::from_secs(1));
    h.master.on_dead(pid);

    let calls = h.master.faults().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].slave, b);
}

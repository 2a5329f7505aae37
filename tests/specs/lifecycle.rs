// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch, activation, pause/resume, and TTL behavior.

use crate::prelude::*;
use lwm_core::{MasterConfig, ObserverVerdict, SlaveEvent, SlaveState};
use lwm_master::MasterError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn a_fresh_worker_walks_launch_to_resumed() {
    let mut h = harness();
    let a = h.create_a();
    let activations = Arc::new(AtomicU32::new(0));

    h.master.activate(a).unwrap();
    assert_eq!(h.state(a), SlaveState::RequestToLaunch);
    assert_eq!(h.node(a).refcnt(), 2);

    let count = Arc::clone(&activations);
    h.master
        .add_observer(
            a,
            SlaveEvent::Activate,
            Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                ObserverVerdict::Keep
            }),
        )
        .unwrap();

    h.master.activated(a).unwrap();
    assert_eq!(h.state(a), SlaveState::Resumed);
    assert_eq!(activations.load(Ordering::SeqCst), 1);
}

#[test]
fn activation_balances_deactivation_on_the_refcount() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    h.master.load_instance(a);

    assert_eq!(h.node(a).refcnt(), 2);

    let pid = h.pid(a);
    h.master.deactivate(a);
    h.master.on_dead(pid);

    // One activate completion, one deactivated completion
    assert_eq!(h.node(a).refcnt(), 1);
    assert_eq!(h.state(a), SlaveState::Terminated);
}

#[test]
fn resume_is_idempotent_in_resumed_states() {
    let mut h = harness();
    let a = h.spawn("s1", false);

    assert_eq!(h.master.resume(a), Ok(()));
    assert!(h.link.calls().is_empty(), "no packet for a resumed slave");

    h.master.pause(a).unwrap();
    h.master.resume(a).unwrap();
    assert_eq!(h.master.resume(a), Ok(()));
    let resumes = h
        .link
        .calls()
        .iter()
        .filter(|c| matches!(c, lwm_adapters::LinkCall::Resume { .. }))
        .count();
    assert_eq!(resumes, 1, "the second resume sends nothing");
}

#[test]
fn pause_is_idempotent_in_paused_states() {
    let mut h = harness();
    let a = h.spawn("s1", false);

    h.master.pause(a).unwrap();
    assert_eq!(h.master.pause(a), Ok(()));
    let pauses = h
        .link
        .calls()
        .iter()
        .filter(|c| matches!(c, lwm_adapters::LinkCall::Pause { .. }))
        .count();
    assert_eq!(pauses, 1);
}

#[test]
fn secured_slaves_idle_out_after_their_ttl() {
    let mut h = harness();
    let b = h.create_b();
    h.master.activate(b).unwrap();
    h.master.activated(b).unwrap();
    h.master.load_instance(b);

    let pid = h.pid(b);
    h.clock
        .advance(h.master.config().slave_ttl + Duration::from_secs(1));
    h.master.tick();
    h.master.on_dead(pid);

    assert_eq!(h.state(b), SlaveState::Terminated);
    assert!(!h.node(b).need_to_reactivate());
    assert!(h.node(b).need_to_reactivate_instances());
}

#[test]
fn give_more_ttl_is_strictly_monotonic_up_to_the_full_lifetime() {
    let mut h = harness();
    let b = h.create_b();
    h.master.activate(b).unwrap();
    h.master.activated(b).unwrap();

    let full = h.master.config().slave_ttl;
    h.clock.advance(Duration::from_secs(10));
    let before = h.master.ttl(b);

    h.master.give_more_ttl(b).unwrap();
    let after = h.master.ttl(b);

    assert!(after > before, "remaining lifetime must increase");
    assert_eq!(after, full, "and saturates at the full TTL");

    // Extending again right away cannot exceed the cap
    h.master.give_more_ttl(b).unwrap();
    assert_eq!(h.master.ttl(b), full);
}

#[test]
fn activate_during_termination_is_remembered() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    h.master.load_instance(a);
    h.master
        .add_observer(
            a,
            SlaveEvent::Deactivate,
            Box::new(|_| ObserverVerdict::Reactivate),
        )
        .unwrap();

    h.master.deactivate(a);
    assert_eq!(h.master.activate(a), Err(MasterError::Already));
    assert!(h.node(a).need_to_reactivate());

    let pid = h.pid(a);
    h.master.on_dead(pid);

    assert_eq!(h.state(a), SlaveState::RequestToLaunch);
    assert_eq!(h.launcher.launches().len(), 2);
}

#[test]
fn debug_mode_workers_arrive_by_hello() {
    let mut h = harness_with(MasterConfig {
        debug_mode: true,
        ..MasterConfig::default()
    });
    let a = h.create_a();
    h.master.activate(a).unwrap();
    assert!(h.launcher.launches().is_empty());

    h.master
        .on_hello(&lwm_core::SlaveName::new("s1"), 777)
        .unwrap();
    assert_eq!(h.state(a), SlaveState::Resumed);
    assert_eq!(h.node(a).pid(), Some(777));
}

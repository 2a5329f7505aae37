// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nested deactivate-all / activate-all behavior.

use crate::prelude::*;
use lwm_core::SlaveState;

#[test]
fn nested_quiesce_only_acts_at_the_outermost_pair() {
    let mut h = harness();
    let a = h.spawn("a", false);
    let b = h.spawn("b", false);
    h.master.load_instance(a);
    h.master.load_instance(b);

    // k = 2 nested deactivations: only the first touches the slaves
    assert_eq!(h.master.deactivate_all(true, true), 2);
    assert_eq!(h.master.deactivate_all(true, true), 0);
    assert_eq!(h.state(a), SlaveState::RequestToTerminate);
    assert_eq!(h.state(b), SlaveState::RequestToTerminate);

    for id in [a, b] {
        let pid = h.pid(id);
        h.master.on_dead(pid);
        assert_eq!(h.state(id), SlaveState::Terminated);
    }

    // Unwinding: the inner release is a no-op, the outer one relaunches
    assert_eq!(h.master.activate_all(), 0);
    assert_eq!(h.state(a), SlaveState::Terminated);
    assert_eq!(h.master.activate_all(), 2);

    // Both workers come back up; hellos restore the prior steady state
    for id in [a, b] {
        assert_eq!(h.state(id), SlaveState::RequestToLaunch);
        h.master.activated(id).unwrap();
        assert_eq!(h.state(id), SlaveState::Resumed);
    }
}

#[test]
fn quiesce_stamps_the_reactivation_intent_on_every_slave() {
    let mut h = harness();
    let a = h.spawn("a", false);
    h.master.load_instance(a);

    h.master.deactivate_all(false, true);

    assert!(!h.node(a).need_to_reactivate());
    assert!(h.node(a).need_to_reactivate_instances());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placement engine behavior over the live registry.

use crate::prelude::*;
use lwm_core::SlaveName;

#[test]
fn an_empty_plain_worker_is_reused() {
    let mut h = harness();
    let a = h.spawn("s1", false);

    assert_eq!(h.master.find_available("c", false, false), Some(a));
}

#[test]
fn a_fully_loaded_default_abi_worker_is_not_reused() {
    let mut h = harness();
    let a = h.spawn("s1", false);
    for _ in 0..h.master.config().slave_max_load {
        h.master.load_package(a);
    }

    assert_eq!(h.master.find_available("c", false, false), None);
}

#[test]
fn placement_never_mixes_secured_and_plain() {
    let mut h = harness();
    h.spawn("s1", false);
    let b = h.spawn("s2", true);

    assert_eq!(h.master.find_available("c", true, false), Some(b));

    h.master.load_package(b);
    assert_eq!(
        h.master.find_available("c", true, false),
        None,
        "an occupied secured slave is never shared"
    );
}

#[test]
fn placement_respects_the_network_flag() {
    let mut h = harness();
    h.spawn("s1", false);
    let online = h
        .master
        .create(&SlaveName::new("net"), false, "c", "live-c", true);
    h.master.activate(online).unwrap();
    h.master.activated(online).unwrap();

    assert_eq!(h.master.find_available("c", false, true), Some(online));
}

#[test]
fn foreign_abi_workers_are_shared_regardless_of_load() {
    let mut h = harness();
    let html = h
        .master
        .create(&SlaveName::new("web"), false, "html", "live-html", false);
    h.master.activate(html).unwrap();
    h.master.activated(html).unwrap();
    for _ in 0..h.master.config().slave_max_load + 5 {
        h.master.load_package(html);
    }

    assert_eq!(h.master.find_available("HTML", false, false), Some(html));
}

#[test]
fn no_candidate_means_the_caller_creates_a_fresh_worker() {
    let mut h = harness();
    assert_eq!(h.master.find_available("c", false, false), None);

    // The usual reaction: create + activate
    let fresh = h.create_a();
    h.master.activate(fresh).unwrap();
    h.master.activated(fresh).unwrap();
    assert_eq!(h.master.find_available("c", false, false), Some(fresh));
}

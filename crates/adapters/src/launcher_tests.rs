// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lwm_core::SlaveName;

fn envelope() -> LaunchEnvelope {
    LaunchEnvelope {
        name: SlaveName::new("s1"),
        secured: true,
        abi: "c".to_string(),
    }
}

#[test]
fn envelope_maps_to_environment() {
    let env = envelope().to_env();
    assert_eq!(
        env,
        vec![
            ("LWM_SLAVE_NAME".to_string(), "s1".to_string()),
            ("LWM_SLAVE_SECURED".to_string(), "true".to_string()),
            ("LWM_SLAVE_ABI".to_string(), "c".to_string()),
        ]
    );
}

#[test]
fn missing_service_is_a_hard_failure() {
    let mut launcher = ServiceLauncher::new();
    let status = launcher.launch("/nonexistent/lwm-worker-service", &envelope());
    assert_eq!(status, LaunchStatus::Hard(LaunchFailure::NoLaunchpad));
}

#[test]
fn terminating_an_unknown_pid_reports_no_process() {
    let mut launcher = ServiceLauncher::new();
    // Pid numbers this large cannot be allocated on Linux defaults.
    let result = launcher.terminate(i32::MAX - 1);
    assert_eq!(result, Err(TerminateError::NoProcess(i32::MAX - 1)));
}

#[test]
fn fake_launcher_allocates_pids_and_records() {
    let fake = FakeLauncher::new();
    let mut launcher = fake.clone();

    let first = launcher.launch("live-c", &envelope());
    let second = launcher.launch("live-c", &envelope());
    assert!(matches!(first, LaunchStatus::Launched(_)));
    assert_ne!(first, second);
    assert_eq!(fake.launches().len(), 2);

    launcher.terminate(1001).unwrap();
    assert_eq!(fake.terminated(), vec![1001]);
}

#[test]
fn fake_launcher_replays_scripted_outcomes() {
    let fake = FakeLauncher::new();
    fake.push_status(LaunchStatus::Transient(LaunchFailure::Timeout));
    fake.push_status(LaunchStatus::Hard(LaunchFailure::Error));

    let mut launcher = fake.clone();
    assert_eq!(
        launcher.launch("svc", &envelope()),
        LaunchStatus::Transient(LaunchFailure::Timeout)
    );
    assert_eq!(
        launcher.launch("svc", &envelope()),
        LaunchStatus::Hard(LaunchFailure::Error)
    );
    // Script exhausted: back to synthetic successes.
    assert!(matches!(
        launcher.launch("svc", &envelope()),
        LaunchStatus::Launched(_)
    ));
}

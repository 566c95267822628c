//! Scenarios for the wake, connect, and power-off workflow.

use std::future::{pending, ready};
use std::time::Duration;

use nightcap::{ConnectError, ConnectTimings, PowerOn, SessionOutcome, ShutdownOutcome};
use rstest::rstest;

use super::test_doubles::{Call, ScriptedBackendError};
use super::test_helpers::{
    ConnectContext, INSTANT, PUBLIC_ADDRESS, running_context, stopped_context,
};

const LONG_GRACE: ConnectTimings = ConnectTimings {
    grace_period: Duration::from_secs(60),
    ..INSTANT
};

#[rstest]
#[tokio::test]
async fn running_instance_connects_and_stops(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.runner.push_success();

    let report = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .unwrap_or_else(|err| panic!("workflow should succeed: {err}"));

    assert_eq!(report.power_on, PowerOn::AlreadyRunning);
    assert_eq!(report.address, PUBLIC_ADDRESS);
    assert_eq!(report.session, SessionOutcome::Connected { attempt: 1 });
    assert_eq!(report.shutdown, ShutdownOutcome::StopRequested);
    assert_eq!(ctx.backend.count(Call::Start), 0);
    assert_eq!(
        ctx.backend.calls().last(),
        Some(&Call::Stop),
        "stop should be the final API call"
    );

    let invocations = ctx.runner.invocations_of("ssh");
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].attached, "ssh should inherit the terminal");
    assert!(
        invocations[0]
            .command_string()
            .ends_with(&format!("root@{PUBLIC_ADDRESS}")),
        "unexpected command: {}",
        invocations[0].command_string()
    );
}

#[rstest]
#[tokio::test]
async fn stopped_instance_is_started_exactly_once(stopped_context: ConnectContext) {
    let ctx = stopped_context;
    ctx.runner.push_success();

    let report = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .unwrap_or_else(|err| panic!("workflow should succeed: {err}"));

    assert_eq!(report.power_on, PowerOn::Started);
    assert_eq!(ctx.backend.count(Call::Start), 1);
    assert_eq!(
        &ctx.backend.calls()[..2],
        &[Call::Describe, Call::Start],
        "start should follow the initial describe"
    );
    assert!(
        ctx.backend.count(Call::Describe) >= 4,
        "boot should be polled until running: {:?}",
        ctx.backend.calls()
    );
    assert_eq!(report.shutdown, ShutdownOutcome::StopRequested);
}

#[rstest]
#[tokio::test]
async fn host_override_skips_address_lookup(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.runner.push_success();

    let report = ctx
        .orchestrator()
        .execute(&ctx.handle, Some("dev.example.net"), pending())
        .await
        .unwrap_or_else(|err| panic!("workflow should succeed: {err}"));

    assert_eq!(report.address, "dev.example.net");
    assert_eq!(
        ctx.backend.count(Call::Describe),
        1,
        "only the power check should describe the instance"
    );
    assert!(
        ctx.runner.invocations_of("ssh")[0]
            .command_string()
            .contains("root@dev.example.net")
    );
}

#[rstest]
#[tokio::test]
async fn missing_address_without_override_fails(running_context: ConnectContext) {
    let ctx = ConnectContext {
        backend: super::test_doubles::ScriptedBackend::with_states(&["running"]),
        ..running_context
    };

    let err = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .expect_err("missing address should fail");

    assert!(matches!(err, ConnectError::MissingAddress { .. }));
    assert_eq!(ctx.ssh_attempts(), 0);
    assert_eq!(ctx.backend.count(Call::Stop), 0);
}

#[rstest]
#[tokio::test]
async fn exhausted_session_still_stops_instance(running_context: ConnectContext) {
    let ctx = running_context;
    for _ in 0..5 {
        ctx.runner.push_exit_code(255);
    }

    let report = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .unwrap_or_else(|err| panic!("exhaustion is not an error: {err}"));

    assert_eq!(ctx.ssh_attempts(), 5);
    assert_eq!(
        report.session,
        SessionOutcome::Exhausted {
            attempts: 5,
            last_exit_code: Some(255),
        }
    );
    assert_eq!(report.session.exit_code(), 255);
    assert_eq!(report.shutdown, ShutdownOutcome::StopRequested);
    assert_eq!(ctx.backend.count(Call::Stop), 1);
}

#[rstest]
#[tokio::test]
async fn session_retries_until_success(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.runner.push_exit_code(255);
    ctx.runner.push_spawn_failure();
    ctx.runner.push_success();

    let report = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .unwrap_or_else(|err| panic!("workflow should succeed: {err}"));

    assert_eq!(report.session, SessionOutcome::Connected { attempt: 3 });
    assert_eq!(ctx.ssh_attempts(), 3);
}

#[rstest]
#[tokio::test]
async fn interrupt_during_grace_leaves_instance_running(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.runner.push_success();

    let report = ctx
        .orchestrator_with(LONG_GRACE)
        .execute(&ctx.handle, None, ready(()))
        .await
        .unwrap_or_else(|err| panic!("workflow should succeed: {err}"));

    assert_eq!(report.shutdown, ShutdownOutcome::Cancelled);
    assert_eq!(ctx.backend.count(Call::Stop), 0);
    assert_eq!(report.session.exit_code(), 0);
}

#[rstest]
#[tokio::test]
async fn start_timeout_reports_last_state(running_context: ConnectContext) {
    let ctx = ConnectContext {
        backend: super::test_doubles::ScriptedBackend::with_states(&["stopped"]),
        ..running_context
    };
    let timings = ConnectTimings {
        poll_interval: Duration::from_millis(5),
        start_timeout: Some(Duration::from_millis(20)),
        ..INSTANT
    };

    let err = ctx
        .orchestrator_with(timings)
        .execute(&ctx.handle, None, pending())
        .await
        .expect_err("instance never boots");

    let ConnectError::StartTimeout { last_state, .. } = err else {
        panic!("expected StartTimeout, got {err}");
    };
    assert_eq!(last_state, "stopped");
    assert_eq!(ctx.backend.count(Call::Start), 1);
    assert_eq!(ctx.ssh_attempts(), 0);
}

#[rstest]
#[tokio::test]
async fn start_failure_is_reported_without_connecting(stopped_context: ConnectContext) {
    let ctx = stopped_context;
    ctx.backend.fail_on_start();

    let err = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .expect_err("start failure should surface");

    assert!(matches!(
        err,
        ConnectError::Start {
            source: ScriptedBackendError::Start,
            ..
        }
    ));
    assert_eq!(ctx.ssh_attempts(), 0);
}

#[rstest]
#[tokio::test]
async fn describe_failure_is_reported(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.backend.fail_on_describe();

    let err = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .expect_err("describe failure should surface");

    assert!(matches!(err, ConnectError::Describe { .. }));
    assert_eq!(ctx.backend.calls(), vec![Call::Describe]);
}

#[rstest]
#[tokio::test]
async fn stop_failure_keeps_session_outcome(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.runner.push_success();
    ctx.backend.fail_on_stop();

    let report = ctx
        .orchestrator()
        .execute(&ctx.handle, None, pending())
        .await
        .unwrap_or_else(|err| panic!("stop failure should not fail the run: {err}"));

    assert_eq!(report.shutdown, ShutdownOutcome::StopFailed);
    assert_eq!(report.session.exit_code(), 0);
    assert_eq!(ctx.ssh_attempts(), 1);
    assert_eq!(ctx.backend.count(Call::Stop), 1);
}

#[rstest]
#[tokio::test]
async fn shutdown_stage_surfaces_stop_failure(running_context: ConnectContext) {
    let ctx = running_context;
    ctx.backend.fail_on_stop();

    let err = ctx
        .orchestrator()
        .shutdown_after_grace(&ctx.handle, pending())
        .await
        .expect_err("stop failure should surface");

    assert!(matches!(
        err,
        ConnectError::Stop {
            source: ScriptedBackendError::Stop,
            ..
        }
    ));
    assert!(
        err.to_string().contains("failed to stop instance"),
        "unexpected message: {err}"
    );
}

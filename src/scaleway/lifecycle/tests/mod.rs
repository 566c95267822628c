//! Unit tests for Scaleway lifecycle helpers.

use rstest::rstest;
use scaleway_rs::ScalewayApi;

use super::InstanceSnapshot;
use super::power::{power_off_action, power_on_action};
use crate::ScalewayConfig;
use crate::scaleway::types::{Action, InstanceId, POWER_OFF, POWER_ON};
use crate::scaleway::{ScalewayBackend, ScalewayBackendError};

const SERVER_ID: &str = "5a5f0b4e-1c53-4a4b-9a7e-6f0d1f1b2c3d";

fn snapshot(
    id: impl Into<InstanceId>,
    state: &str,
    allowed: impl IntoIterator<Item = impl Into<Action>>,
    public_ip: Option<&str>,
) -> InstanceSnapshot {
    InstanceSnapshot {
        id: id.into(),
        state: state.to_owned(),
        allowed_actions: allowed.into_iter().map(Into::into).collect(),
        public_ip: public_ip.map(str::to_owned),
    }
}

fn dummy_config() -> ScalewayConfig {
    ScalewayConfig {
        access_key: None,
        secret_key: String::from("dummy"),
        default_zone: String::from("nl-ams-1"),
    }
}

fn backend_fixture() -> ScalewayBackend {
    ScalewayBackend {
        api: ScalewayApi::new("dummy"),
        config: dummy_config(),
    }
}

#[test]
fn status_carries_state_and_public_address() {
    let snap = snapshot(SERVER_ID, "running", [POWER_OFF], Some("51.15.0.10"));
    let status = snap.status();

    assert!(status.state.is_running());
    assert_eq!(status.public_address.as_deref(), Some("51.15.0.10"));
}

#[rstest]
#[case::running("running")]
#[case::starting("starting")]
fn power_on_skips_running_or_booting_servers(#[case] state: &str) {
    let snap = snapshot(SERVER_ID, state, Vec::<Action>::new(), None);
    let action = power_on_action(&snap).expect("no action should be needed");
    assert!(action.is_none(), "unexpected action for {state}: {action:?}");
}

#[test]
fn power_on_requests_poweron_for_stopped_server() {
    let snap = snapshot(SERVER_ID, "stopped", [POWER_ON, "backup"], None);
    let action = power_on_action(&snap).expect("poweron should be allowed");
    assert_eq!(action.as_deref(), Some(POWER_ON));
}

#[test]
fn power_on_errors_when_not_allowed() {
    let snap = snapshot(SERVER_ID, "stopping", Vec::<Action>::new(), None);
    let result = power_on_action(&snap);
    assert!(matches!(
        result,
        Err(ScalewayBackendError::PowerOnNotAllowed { ref state, .. }) if state == "stopping"
    ));
}

#[rstest]
#[case::stopped("stopped")]
#[case::stopped_in_place("stopped in place")]
fn power_off_skips_stopped_servers(#[case] state: &str) {
    let snap = snapshot(SERVER_ID, state, [POWER_ON], None);
    let action = power_off_action(&snap).expect("no action should be needed");
    assert!(action.is_none(), "unexpected action for {state}: {action:?}");
}

#[test]
fn power_off_requests_poweroff_for_running_server() {
    let snap = snapshot(SERVER_ID, "running", [POWER_OFF, "reboot"], Some("51.15.0.10"));
    let action = power_off_action(&snap).expect("poweroff should be allowed");
    assert_eq!(action.as_deref(), Some(POWER_OFF));
}

#[test]
fn power_off_errors_when_not_allowed() {
    let snap = snapshot(SERVER_ID, "starting", Vec::<Action>::new(), None);
    assert!(matches!(
        power_off_action(&snap),
        Err(ScalewayBackendError::PowerOffNotAllowed { .. })
    ));
}

#[test]
fn handle_for_uses_configured_zone_by_default() {
    let handle = backend_fixture()
        .handle_for(&format!("  {SERVER_ID} "), None)
        .expect("uuid should be accepted");
    assert_eq!(handle.id, SERVER_ID);
    assert_eq!(handle.zone, "nl-ams-1");
}

#[test]
fn handle_for_prefers_explicit_zone() {
    let handle = backend_fixture()
        .handle_for(SERVER_ID, Some("pl-waw-2"))
        .expect("uuid should be accepted");
    assert_eq!(handle.zone, "pl-waw-2");
}

#[rstest]
#[case::ec2_style("i-12345678912345678")]
#[case::empty("")]
fn handle_for_rejects_non_uuid_ids(#[case] id: &str) {
    let err = backend_fixture()
        .handle_for(id, None)
        .expect_err("non-uuid ids should be rejected");
    assert!(matches!(err, ScalewayBackendError::InvalidInstanceId { .. }));
}

#[test]
fn handle_for_rejects_blank_zone() {
    let err = backend_fixture()
        .handle_for(SERVER_ID, Some("  "))
        .expect_err("blank zone should be rejected");
    assert_eq!(err, ScalewayBackendError::Validation(String::from("zone")));
}

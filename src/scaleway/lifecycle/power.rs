//! Power on and power off actions for existing servers.

use tracing::debug;

use crate::scaleway::types::{Action, POWER_OFF, POWER_ON, Zone};

use super::super::{ScalewayBackend, ScalewayBackendError};
use super::InstanceSnapshot;

const STARTING_STATE: &str = "starting";
const STOPPED_STATES: [&str; 2] = ["stopped", "stopped in place"];

/// Chooses the action needed to bring the server up, if any.
///
/// A server that is already booting needs no further request.
pub(super) fn power_on_action(
    snapshot: &InstanceSnapshot,
) -> Result<Option<Action>, ScalewayBackendError> {
    if snapshot.status().state.is_running() || snapshot.state == STARTING_STATE {
        return Ok(None);
    }

    if snapshot.allows(POWER_ON) {
        return Ok(Some(Action::from(POWER_ON)));
    }

    Err(ScalewayBackendError::PowerOnNotAllowed {
        instance_id: snapshot.id.as_str().to_owned(),
        state: snapshot.state.clone(),
    })
}

/// Chooses the action needed to shut the server down, if any.
pub(super) fn power_off_action(
    snapshot: &InstanceSnapshot,
) -> Result<Option<Action>, ScalewayBackendError> {
    if STOPPED_STATES.contains(&snapshot.state.as_str()) {
        return Ok(None);
    }

    if snapshot.allows(POWER_OFF) {
        return Ok(Some(Action::from(POWER_OFF)));
    }

    Err(ScalewayBackendError::PowerOffNotAllowed {
        instance_id: snapshot.id.as_str().to_owned(),
        state: snapshot.state.clone(),
    })
}

impl ScalewayBackend {
    pub(in crate::scaleway) async fn power_on_if_needed(
        &self,
        zone: &Zone,
        snapshot: &InstanceSnapshot,
    ) -> Result<(), ScalewayBackendError> {
        match power_on_action(snapshot)? {
            Some(action) => self.perform(zone, snapshot, &action).await,
            None => {
                debug!(instance = %snapshot.id.as_str(), state = %snapshot.state, "power on not required");
                Ok(())
            }
        }
    }

    pub(in crate::scaleway) async fn power_off_if_needed(
        &self,
        zone: &Zone,
        snapshot: &InstanceSnapshot,
    ) -> Result<(), ScalewayBackendError> {
        match power_off_action(snapshot)? {
            Some(action) => self.perform(zone, snapshot, &action).await,
            None => {
                debug!(instance = %snapshot.id.as_str(), state = %snapshot.state, "power off not required");
                Ok(())
            }
        }
    }

    async fn perform(
        &self,
        zone: &Zone,
        snapshot: &InstanceSnapshot,
        action: &Action,
    ) -> Result<(), ScalewayBackendError> {
        debug!(instance = %snapshot.id.as_str(), action = %action.as_str(), "performing server action");
        self.api
            .perform_instance_action_async(zone.as_str(), snapshot.id.as_str(), action.as_str())
            .await?;
        Ok(())
    }
}

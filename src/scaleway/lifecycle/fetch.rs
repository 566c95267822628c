//! Server lookups against the Scaleway Instances API.

use crate::backend::InstanceHandle;
use crate::scaleway::types::Action;

use super::super::{ScalewayBackend, ScalewayBackendError};
use super::InstanceSnapshot;

impl ScalewayBackend {
    pub(in crate::scaleway) async fn fetch_instance(
        &self,
        handle: &InstanceHandle,
    ) -> Result<Option<InstanceSnapshot>, ScalewayBackendError> {
        let mut servers = self
            .api
            .list_instances(&handle.zone)
            .servers(&handle.id)
            .per_page(1)
            .run_async()
            .await?;

        Ok(servers.pop().map(|server| InstanceSnapshot {
            id: server.id.into(),
            state: server.state,
            allowed_actions: server
                .allowed_actions
                .into_iter()
                .map(Action::from)
                .collect(),
            public_ip: server.public_ip.map(|ip| ip.address),
        }))
    }

    pub(in crate::scaleway) async fn require_instance(
        &self,
        handle: &InstanceHandle,
    ) -> Result<InstanceSnapshot, ScalewayBackendError> {
        self.fetch_instance(handle)
            .await?
            .ok_or_else(|| ScalewayBackendError::InstanceNotFound {
                instance_id: handle.id.clone(),
                zone: handle.zone.clone(),
            })
    }
}

//! Scaleway backend implementation of the instance power lifecycle.

mod error;
mod lifecycle;
mod types;

use scaleway_rs::ScalewayApi;
use uuid::Uuid;

use crate::backend::{Backend, BackendFuture, InstanceHandle, InstanceStatus};
use crate::config::ScalewayConfig;
use types::Zone;

pub use error::ScalewayBackendError;

/// Backend that drives existing servers through the Scaleway Instances API.
#[derive(Clone)]
pub struct ScalewayBackend {
    api: ScalewayApi,
    config: ScalewayConfig,
}

impl ScalewayBackend {
    /// Constructs a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError::Config`] when the provided configuration
    /// fails validation.
    pub fn new(config: ScalewayConfig) -> Result<Self, ScalewayBackendError> {
        config.validate()?;
        Ok(Self {
            api: ScalewayApi::new(&config.secret_key),
            config,
        })
    }

    /// Builds a handle for `instance_id`, falling back to the configured zone
    /// when `zone` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError::InvalidInstanceId`] when the identifier
    /// is not a UUID, or [`ScalewayBackendError::Validation`] when the zone is
    /// empty.
    pub fn handle_for(
        &self,
        instance_id: &str,
        zone: Option<&str>,
    ) -> Result<InstanceHandle, ScalewayBackendError> {
        let trimmed = instance_id.trim();
        if Uuid::parse_str(trimmed).is_err() {
            return Err(ScalewayBackendError::InvalidInstanceId {
                instance_id: trimmed.to_owned(),
            });
        }
        let zone = zone.unwrap_or(&self.config.default_zone);
        Ok(InstanceHandle::new(trimmed, zone)?)
    }
}

impl Backend for ScalewayBackend {
    type Error = ScalewayBackendError;

    fn describe<'a>(
        &'a self,
        handle: &'a InstanceHandle,
    ) -> BackendFuture<'a, InstanceStatus, Self::Error> {
        Box::pin(async move {
            let snapshot = self.require_instance(handle).await?;
            Ok(snapshot.status())
        })
    }

    fn start<'a>(&'a self, handle: &'a InstanceHandle) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let snapshot = self.require_instance(handle).await?;
            let zone = Zone::from(handle.zone.as_str());
            self.power_on_if_needed(&zone, &snapshot).await
        })
    }

    fn stop<'a>(&'a self, handle: &'a InstanceHandle) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let snapshot = self.require_instance(handle).await?;
            let zone = Zone::from(handle.zone.as_str());
            self.power_off_if_needed(&zone, &snapshot).await
        })
    }
}

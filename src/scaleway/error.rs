//! Error types for the Scaleway backend.

use crate::backend::BackendError;
use crate::config::ConfigError;
use scaleway_rs::ScalewayError;
use thiserror::Error;

/// Errors raised by the Scaleway backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScalewayBackendError {
    /// Raised when the high-level configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a handle is missing a required field.
    #[error("invalid instance handle: {0}")]
    Validation(String),
    /// Raised when the instance identifier is not a Scaleway server UUID.
    #[error("invalid instance id '{instance_id}': expected a UUID")]
    InvalidInstanceId {
        /// Identifier supplied by the caller.
        instance_id: String,
    },
    /// Raised when the API does not know the instance.
    #[error("instance {instance_id} not found in zone {zone}")]
    InstanceNotFound {
        /// Provider instance identifier.
        instance_id: String,
        /// Zone used for the lookup.
        zone: String,
    },
    /// Raised when an instance cannot be powered on.
    #[error("instance {instance_id} in state {state} cannot be powered on")]
    PowerOnNotAllowed {
        /// Provider instance identifier.
        instance_id: String,
        /// Current state reported by the provider.
        state: String,
    },
    /// Raised when an instance cannot be powered off.
    #[error("instance {instance_id} in state {state} cannot be powered off")]
    PowerOffNotAllowed {
        /// Provider instance identifier.
        instance_id: String,
        /// Current state reported by the provider.
        state: String,
    },
    /// Wrapper for provider level failures.
    #[error("provider error: {message}")]
    Provider {
        /// Message returned by the provider SDK.
        message: String,
    },
}

impl From<ScalewayError> for ScalewayBackendError {
    fn from(value: ScalewayError) -> Self {
        Self::Provider {
            message: value.to_string(),
        }
    }
}

impl From<BackendError> for ScalewayBackendError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Validation(field) => Self::Validation(field),
        }
    }
}

impl From<ConfigError> for ScalewayBackendError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

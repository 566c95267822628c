//! Backend abstraction for controlling the power state of an existing
//! compute instance.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// State string reported by providers once an instance has booted.
pub const RUNNING_STATE: &str = "running";

/// Identifies a single instance within a provider zone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceHandle {
    /// Provider specific identifier for the instance.
    pub id: String,
    /// Zone that scopes API calls for the instance (for example `fr-par-1`).
    pub zone: String,
}

impl InstanceHandle {
    /// Builds a handle, trimming both fields.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when either field is empty after
    /// trimming.
    pub fn new(id: impl Into<String>, zone: impl Into<String>) -> Result<Self, BackendError> {
        let handle = Self {
            id: id.into().trim().to_owned(),
            zone: zone.into().trim().to_owned(),
        };
        handle.validate()?;
        Ok(handle)
    }

    /// Checks that the handle names both an instance and a zone.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] naming the first empty field.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.id.is_empty() {
            return Err(BackendError::Validation("instance_id".to_owned()));
        }
        if self.zone.is_empty() {
            return Err(BackendError::Validation("zone".to_owned()));
        }
        Ok(())
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.zone)
    }
}

/// Power state reported by the provider.
///
/// Providers expose several states (`stopped`, `starting`, `stopping`, ...);
/// only `running` carries meaning for the connect workflow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceState(String);

impl InstanceState {
    /// Wraps a provider state string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw provider string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns `true` once the instance is up.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0 == RUNNING_STATE
    }
}

impl From<&str> for InstanceState {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InstanceState {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of describing an instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceStatus {
    /// Current power state.
    pub state: InstanceState,
    /// Public address (IP or DNS name) when the provider has assigned one.
    pub public_address: Option<String>,
}

/// Errors raised by backend-independent validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum BackendError {
    /// Raised when a handle is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by cloud backends.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the instance's power state and public address.
    fn describe<'a>(
        &'a self,
        handle: &'a InstanceHandle,
    ) -> BackendFuture<'a, InstanceStatus, Self::Error>;

    /// Requests that the instance be powered on. Returns once the provider
    /// has accepted the request, not once the instance is running.
    fn start<'a>(&'a self, handle: &'a InstanceHandle) -> BackendFuture<'a, (), Self::Error>;

    /// Requests that the instance be powered off.
    fn stop<'a>(&'a self, handle: &'a InstanceHandle) -> BackendFuture<'a, (), Self::Error>;
}

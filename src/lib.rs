//! Core library for the Nightcap instance connector.
//!
//! The crate exposes a backend abstraction for controlling the power state
//! of an existing compute instance, a Scaleway implementation, an SSH session
//! runner with bounded retries, and the orchestrator that ties them together
//! (wake → connect → power off after a cancellable grace window).

pub mod backend;
pub mod config;
pub mod connect;
pub mod scaleway;
pub mod session;
pub mod test_support;

pub use backend::{Backend, InstanceHandle, InstanceState, InstanceStatus};
pub use config::ScalewayConfig;
pub use connect::{
    ConnectError, ConnectOrchestrator, ConnectReport, ConnectTimings, PowerOn, ShutdownOutcome,
};
pub use scaleway::{ScalewayBackend, ScalewayBackendError};
pub use session::{
    CommandOutput, CommandRunner, DnsFlush, ProcessCommandRunner, SessionConfig,
    SessionConfigLoadError, SessionError, SessionOutcome, SessionRunner,
};

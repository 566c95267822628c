//! Orchestrates the wake, connect, and power-off workflow.
//!
//! The workflow makes sure the instance is running, resolves the address to
//! connect to, runs an interactive SSH session with bounded retries, and
//! finally powers the instance off after a grace window the operator can
//! interrupt.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use crate::backend::{Backend, InstanceHandle};
use crate::session::{CommandRunner, SessionConfig, SessionOutcome, SessionRunner};

/// Errors surfaced while connecting to an instance.
#[derive(Debug, Error)]
pub enum ConnectError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when the instance state cannot be read.
    #[error("failed to describe instance {instance}: {source}")]
    Describe {
        /// Instance being described.
        instance: InstanceHandle,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
    /// Raised when the start request is rejected.
    #[error("failed to start instance {instance}: {source}")]
    Start {
        /// Instance being started.
        instance: InstanceHandle,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
    /// Raised when the instance does not reach `running` in time.
    #[error("instance {instance} still {last_state} after {} seconds", .waited.as_secs())]
    StartTimeout {
        /// Instance being started.
        instance: InstanceHandle,
        /// State observed by the final poll.
        last_state: String,
        /// Time spent polling.
        waited: Duration,
    },
    /// Raised when no override was given and the instance has no public
    /// address.
    #[error("instance {instance} has no public address; pass --host to connect anyway")]
    MissingAddress {
        /// Instance being resolved.
        instance: InstanceHandle,
    },
    /// Raised when the stop request is rejected.
    #[error("failed to stop instance {instance}: {source}")]
    Stop {
        /// Instance being stopped.
        instance: InstanceHandle,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
}

/// Delays used by the workflow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectTimings {
    /// Delay between state polls while the instance boots.
    pub poll_interval: Duration,
    /// Delay after the instance reports `running` so SSH can come up.
    pub settle_delay: Duration,
    /// Upper bound on the boot wait; `None` waits indefinitely.
    pub start_timeout: Option<Duration>,
    /// Window during which the operator can cancel the shutdown.
    pub grace_period: Duration,
}

impl From<&SessionConfig> for ConnectTimings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            settle_delay: Duration::from_secs(config.settle_delay_secs),
            start_timeout: (config.start_timeout_secs > 0)
                .then(|| Duration::from_secs(config.start_timeout_secs)),
            grace_period: Duration::from_secs(config.grace_period_secs),
        }
    }
}

/// Whether the workflow had to boot the instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerOn {
    /// The instance was already running.
    AlreadyRunning,
    /// A start request was issued and the instance came up.
    Started,
}

/// What happened at the end of the grace window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShutdownOutcome {
    /// The stop request was issued.
    StopRequested,
    /// The operator interrupted the grace window; the instance keeps running.
    Cancelled,
    /// The stop request was rejected; the instance may still be running.
    StopFailed,
}

/// Summary of a completed workflow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectReport {
    /// Whether the instance had to be started.
    pub power_on: PowerOn,
    /// Address SSH was pointed at.
    pub address: String,
    /// Result of the SSH retry loop.
    pub session: SessionOutcome,
    /// Result of the grace window.
    pub shutdown: ShutdownOutcome,
}

/// Executes the connect workflow using the provided backend and session
/// runner.
#[derive(Debug)]
pub struct ConnectOrchestrator<B, R: CommandRunner> {
    backend: B,
    session: SessionRunner<R>,
    timings: ConnectTimings,
}

impl<B, R> ConnectOrchestrator<B, R>
where
    B: Backend,
    R: CommandRunner,
{
    /// Creates a new orchestrator using the delays from the session
    /// configuration.
    #[must_use]
    pub fn new(backend: B, session: SessionRunner<R>) -> Self {
        let timings = ConnectTimings::from(session.config());
        Self {
            backend,
            session,
            timings,
        }
    }

    /// Overrides the workflow delays.
    ///
    /// This is primarily used by tests to keep polling scenarios fast.
    #[must_use]
    pub const fn with_timings(mut self, timings: ConnectTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Runs the whole workflow.
    ///
    /// `interrupt` resolves when the operator asks to keep the instance
    /// running. It is only polled during the grace window, so interrupts
    /// raised earlier are not observed here.
    ///
    /// Exhausting the SSH attempts is not an error: the outcome is reported
    /// in [`ConnectReport::session`] and shutdown proceeds. A rejected stop
    /// request is logged and reported as [`ShutdownOutcome::StopFailed`] so
    /// the session outcome is not lost.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] when a cloud API call before the session
    /// fails, the boot wait times out, or no address can be resolved. An
    /// instance started by this call is left running in that case.
    pub async fn execute<F>(
        &self,
        handle: &InstanceHandle,
        host_override: Option<&str>,
        interrupt: F,
    ) -> Result<ConnectReport, ConnectError<B::Error>>
    where
        F: Future<Output = ()>,
    {
        let power_on = self.ensure_running(handle).await?;
        let address = self.resolve_address(handle, host_override).await?;

        info!(%address, "running SSH");
        let session = self.session.connect(&address).await;

        let shutdown = match self.shutdown_after_grace(handle, interrupt).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "instance may still be running");
                ShutdownOutcome::StopFailed
            }
        };
        Ok(ConnectReport {
            power_on,
            address,
            session,
            shutdown,
        })
    }

    /// Starts the instance when it is not running and waits until it is.
    ///
    /// Exactly one start request is issued for a non-running instance, no
    /// matter how many polls follow.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Describe`] or [`ConnectError::Start`] when the
    /// backend fails, and [`ConnectError::StartTimeout`] when the instance is
    /// not running before the configured deadline.
    pub async fn ensure_running(
        &self,
        handle: &InstanceHandle,
    ) -> Result<PowerOn, ConnectError<B::Error>> {
        info!(instance = %handle, "checking if instance is already running");
        let mut state = self.describe(handle).await?.state;
        if state.is_running() {
            return Ok(PowerOn::AlreadyRunning);
        }

        info!(instance = %handle, %state, "starting instance");
        self.backend
            .start(handle)
            .await
            .map_err(|source| ConnectError::Start {
                instance: handle.clone(),
                source,
            })?;

        info!("waiting for instance to start");
        let started_at = Instant::now();
        while !state.is_running() {
            if let Some(limit) = self.timings.start_timeout
                && started_at.elapsed() >= limit
            {
                return Err(ConnectError::StartTimeout {
                    instance: handle.clone(),
                    last_state: state.to_string(),
                    waited: started_at.elapsed(),
                });
            }
            sleep(self.timings.poll_interval).await;
            state = self.describe(handle).await?.state;
            debug!(%state, "polled instance state");
        }

        info!(
            seconds = self.timings.settle_delay.as_secs(),
            "instance running; waiting for SSH to start"
        );
        sleep(self.timings.settle_delay).await;
        Ok(PowerOn::Started)
    }

    /// Returns the override when given, otherwise the instance's public
    /// address.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Describe`] when the lookup fails and
    /// [`ConnectError::MissingAddress`] when the instance has no public
    /// address.
    pub async fn resolve_address(
        &self,
        handle: &InstanceHandle,
        host_override: Option<&str>,
    ) -> Result<String, ConnectError<B::Error>> {
        if let Some(host) = host_override {
            debug!(host, "using host override");
            return Ok(host.to_owned());
        }

        info!("fetching public address");
        self.describe(handle)
            .await?
            .public_address
            .ok_or_else(|| ConnectError::MissingAddress {
                instance: handle.clone(),
            })
    }

    /// Waits out the grace window, then requests the stop unless `interrupt`
    /// resolved first.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Stop`] when the stop request fails.
    pub async fn shutdown_after_grace<F>(
        &self,
        handle: &InstanceHandle,
        interrupt: F,
    ) -> Result<ShutdownOutcome, ConnectError<B::Error>>
    where
        F: Future<Output = ()>,
    {
        info!(
            "you have {} seconds to cancel the shutdown, press CTRL+C to cancel",
            self.timings.grace_period.as_secs()
        );
        tokio::select! {
            () = interrupt => {
                info!(instance = %handle, "shutdown cancelled; instance left running");
                return Ok(ShutdownOutcome::Cancelled);
            }
            () = sleep(self.timings.grace_period) => {}
        }

        info!(instance = %handle, "stopping instance");
        self.backend
            .stop(handle)
            .await
            .map_err(|source| ConnectError::Stop {
                instance: handle.clone(),
                source,
            })?;
        Ok(ShutdownOutcome::StopRequested)
    }

    async fn describe(
        &self,
        handle: &InstanceHandle,
    ) -> Result<crate::backend::InstanceStatus, ConnectError<B::Error>> {
        self.backend
            .describe(handle)
            .await
            .map_err(|source| ConnectError::Describe {
                instance: handle.clone(),
                source,
            })
    }
}

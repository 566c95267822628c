//! Interactive SSH sessions with bounded retries.
//!
//! The session runner shells out to the system `ssh` client with the
//! terminal attached, flushing the local DNS cache before each attempt and
//! stopping at the first zero exit status.

use std::ffi::OsString;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

mod config;
mod dns;
mod types;
mod util;

pub use config::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_SSH_USER, SessionConfig, SessionConfigLoadError, SessionError,
};
pub use dns::DnsFlush;
pub use types::{CommandOutput, CommandRunner, ProcessCommandRunner};
pub use util::expand_tilde;

/// How the retry loop ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    /// An SSH invocation exited with status zero.
    Connected {
        /// One-based attempt number that succeeded.
        attempt: u32,
    },
    /// Every attempt failed.
    Exhausted {
        /// Number of invocations made.
        attempts: u32,
        /// Exit code of the final invocation, when one was observed.
        last_exit_code: Option<i32>,
    },
}

impl SessionOutcome {
    /// Returns `true` when a session connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Exit status the CLI should report for this outcome.
    ///
    /// Exhausted sessions report the last SSH exit code, or `1` when the
    /// client never produced one.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match *self {
            Self::Connected { .. } => 0,
            Self::Exhausted { last_exit_code, .. } => {
                last_exit_code.filter(|code| *code != 0).unwrap_or(1)
            }
        }
    }
}

/// Runs the SSH client against a resolved host.
#[derive(Clone, Debug)]
pub struct SessionRunner<R: CommandRunner> {
    config: SessionConfig,
    runner: R,
    ssh_args: Vec<String>,
    extra_args: Vec<String>,
    dns_flush: Option<DnsFlush>,
    retry_delay: Duration,
}

impl SessionRunner<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when validation fails.
    pub fn with_process_runner(config: SessionConfig) -> Result<Self, SessionError> {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> SessionRunner<R> {
    /// Creates a new session runner using the provided runner and
    /// configuration. DNS flushing defaults to the host platform's command.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when configuration validation fails.
    pub fn new(config: SessionConfig, runner: R) -> Result<Self, SessionError> {
        config.validate()?;
        let retry_delay = config.retry_delay();
        let ssh_args = config.split_ssh_args()?;
        Ok(Self {
            config,
            runner,
            ssh_args,
            extra_args: Vec::new(),
            dns_flush: DnsFlush::for_host_platform(),
            retry_delay,
        })
    }

    /// Appends arguments passed verbatim after the configured `ssh_args`.
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Overrides the DNS flush command; `None` disables flushing.
    #[must_use]
    pub fn with_dns_flush(mut self, flush: Option<DnsFlush>) -> Self {
        self.dns_flush = flush;
        self
    }

    /// Overrides the delay between failed attempts.
    ///
    /// This is primarily used by tests to keep retry scenarios fast.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns a reference to the underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Invokes SSH against `host` until an attempt exits with status zero or
    /// the attempt budget is spent.
    ///
    /// Failures never abort the loop: non-zero exits, signal terminations,
    /// and spawn errors all count as failed attempts.
    pub async fn connect(&self, host: &str) -> SessionOutcome {
        let args = self.build_ssh_args(host);
        let max_attempts = self.config.max_attempts;
        debug!(
            command = %util::render_command(&self.config.ssh_bin, &args),
            "ssh command line"
        );

        let mut last_exit_code = None;
        for attempt in 1..=max_attempts {
            self.flush_dns();
            info!(host, attempt, max_attempts, "running ssh");

            match self.runner.run_attached(&self.config.ssh_bin, &args) {
                Ok(Some(0)) => return SessionOutcome::Connected { attempt },
                Ok(code) => {
                    last_exit_code = code;
                    warn!(attempt, exit_code = ?code, "ssh attempt failed");
                }
                Err(err) => {
                    last_exit_code = None;
                    warn!(attempt, error = %err, "ssh attempt failed");
                }
            }

            if attempt < max_attempts {
                sleep(self.retry_delay).await;
            }
        }

        warn!(attempts = max_attempts, "giving up on ssh");
        SessionOutcome::Exhausted {
            attempts: max_attempts,
            last_exit_code,
        }
    }

    fn flush_dns(&self) {
        let Some(flush) = &self.dns_flush else {
            return;
        };

        info!("flushing DNS cache");
        match self.runner.run(&flush.program, &flush.os_args()) {
            Ok(output) if output.is_success() => {}
            Ok(output) => {
                warn!(program = %flush.program, exit_code = ?output.code, "DNS flush failed");
            }
            Err(err) => warn!(error = %err, "DNS flush failed"),
        }
    }

    fn build_ssh_args(&self, host: &str) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-o"),
            OsString::from(format!(
                "ConnectTimeout={}",
                self.config.connect_timeout_secs
            )),
            OsString::from("-o"),
            OsString::from("ConnectionAttempts=1"),
        ];

        if let Some(identity) = self.config.identity_path() {
            args.push(OsString::from("-i"));
            args.push(OsString::from(identity));
        }

        args.push(OsString::from(format!("{}@{host}", self.config.ssh_user)));
        args.extend(self.ssh_args.iter().map(OsString::from));
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

//! Session configuration structures and validation.
//!
//! [`SessionConfig`] holds the SSH client settings and the delays used by the
//! connect workflow. Configuration is loaded via `ortho-config` which merges
//! defaults, configuration files, and environment variables; the binary
//! applies command-line flags on top.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use super::util::{check_regular_file, expand_tilde};

/// Default user for SSH logins on Scaleway images.
pub const DEFAULT_SSH_USER: &str = "root";

/// Default number of SSH invocations before giving up. Configuration may
/// lower the budget but never raise it above this value.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// SSH client settings and workflow delays loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "NIGHTCAP",
    discovery(
        app_name = "nightcap",
        env_var = "NIGHTCAP_CONFIG_PATH",
        config_file_name = "nightcap.toml",
        dotfile_name = ".nightcap.toml",
        project_file_name = "nightcap.toml"
    )
)]
pub struct SessionConfig {
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Remote user to connect as.
    #[ortho_config(default = DEFAULT_SSH_USER.to_owned())]
    pub ssh_user: String,
    /// Path to the SSH private key file. Supports tilde expansion
    /// (`~/.ssh/id_ed25519`). When absent, SSH falls back to its default key
    /// locations.
    pub ssh_identity_file: Option<String>,
    /// Extra arguments appended after the destination, split with shell
    /// quoting rules (`-o 'SetEnv FOO=bar'` stays one option value).
    pub ssh_args: Option<String>,
    /// Seconds SSH may spend establishing the connection (`ConnectTimeout`).
    #[ortho_config(default = 5)]
    pub connect_timeout_secs: u64,
    /// Number of SSH invocations before giving up, between 1 and
    /// [`DEFAULT_MAX_ATTEMPTS`].
    #[ortho_config(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    /// Seconds to wait after a failed SSH invocation.
    #[ortho_config(default = 3)]
    pub retry_delay_secs: u64,
    /// Seconds between state polls while the instance boots.
    #[ortho_config(default = 2)]
    pub poll_interval_secs: u64,
    /// Seconds to wait after the instance reports `running` so the SSH
    /// daemon can start.
    #[ortho_config(default = 10)]
    pub settle_delay_secs: u64,
    /// Upper bound on the boot wait in seconds; `0` waits indefinitely.
    #[ortho_config(default = 300)]
    pub start_timeout_secs: u64,
    /// Seconds the operator has to cancel the shutdown.
    #[ortho_config(default = 3)]
    pub grace_period_secs: u64,
}

/// Errors raised when loading the session configuration from layered sources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SessionConfigLoadError {
    /// Indicates that parsing or merging configuration layers failed.
    #[error("session configuration parsing failed: {0}")]
    Parse(String),
}

impl SessionConfig {
    /// Ensures configuration values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] when a required field is
    /// empty, [`SessionError::OutOfRange`] when a count or interval is zero
    /// where that makes no sense, [`SessionError::TooLarge`] when the attempt
    /// budget exceeds [`DEFAULT_MAX_ATTEMPTS`],
    /// [`SessionError::InvalidSshArgs`] when `ssh_args` has unbalanced
    /// quotes, and [`SessionError::IdentityFile`] when the identity file
    /// cannot be found.
    pub fn validate(&self) -> Result<(), SessionError> {
        Self::require_value(&self.ssh_bin, "ssh_bin")?;
        Self::require_value(&self.ssh_user, "ssh_user")?;
        Self::require_optional_value(self.ssh_identity_file.as_deref(), "ssh_identity_file")?;
        Self::require_at_least(self.connect_timeout_secs, 1, "connect_timeout_secs")?;
        Self::require_at_least(u64::from(self.max_attempts), 1, "max_attempts")?;
        Self::require_at_most(
            u64::from(self.max_attempts),
            u64::from(DEFAULT_MAX_ATTEMPTS),
            "max_attempts",
        )?;
        Self::require_at_least(self.poll_interval_secs, 1, "poll_interval_secs")?;
        self.split_ssh_args()?;

        if let Some(identity) = self.identity_path() {
            check_regular_file(&identity)
                .map_err(|message| SessionError::IdentityFile { path: identity, message })?;
        }
        Ok(())
    }

    /// Returns the identity file with `~/` expanded.
    #[must_use]
    pub fn identity_path(&self) -> Option<String> {
        self.ssh_identity_file.as_deref().map(expand_tilde)
    }

    /// Splits [`SessionConfig::ssh_args`] into individual arguments using
    /// POSIX shell quoting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSshArgs`] when a quote is left open.
    pub fn split_ssh_args(&self) -> Result<Vec<String>, SessionError> {
        let Some(args) = self.ssh_args.as_deref() else {
            return Ok(Vec::new());
        };
        shell_words::split(args).map_err(|err| SessionError::InvalidSshArgs {
            value: args.to_owned(),
            message: err.to_string(),
        })
    }

    /// Returns the SSH retry delay.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Loads configuration using defaults, configuration files, and
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, SessionConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("nightcap")])
            .map_err(|err| SessionConfigLoadError::Parse(err.to_string()))
    }

    fn require_optional_value(value: Option<&str>, field: &str) -> Result<(), SessionError> {
        match value {
            None => Ok(()),
            Some(v) if !v.trim().is_empty() => Ok(()),
            Some(_) => Err(SessionError::InvalidConfig {
                field: field.to_owned(),
            }),
        }
    }

    fn require_value(value: &str, field: &str) -> Result<(), SessionError> {
        Self::require_optional_value(Some(value), field)
    }

    fn require_at_most(value: u64, maximum: u64, field: &str) -> Result<(), SessionError> {
        if value > maximum {
            return Err(SessionError::TooLarge {
                field: field.to_owned(),
                maximum,
            });
        }
        Ok(())
    }

    fn require_at_least(value: u64, minimum: u64, field: &str) -> Result<(), SessionError> {
        if value < minimum {
            return Err(SessionError::OutOfRange {
                field: field.to_owned(),
                minimum,
            });
        }
        Ok(())
    }
}

/// Errors surfaced while validating or running the SSH session.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SessionError {
    /// Raised when configuration is missing required values. The error message
    /// includes guidance on how to provide the value via environment variable
    /// or configuration file.
    #[error("missing {field}: set NIGHTCAP_{env_suffix} or add {field} to [session] in nightcap.toml", env_suffix = field.to_uppercase())]
    InvalidConfig {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Raised when a numeric setting is below its minimum.
    #[error("{field} must be at least {minimum}: set NIGHTCAP_{env_suffix} or {field} in nightcap.toml", env_suffix = field.to_uppercase())]
    OutOfRange {
        /// Configuration field that failed validation.
        field: String,
        /// Smallest accepted value.
        minimum: u64,
    },
    /// Raised when a numeric setting is above its maximum.
    #[error("{field} must be at most {maximum}: set NIGHTCAP_{env_suffix} or {field} in nightcap.toml", env_suffix = field.to_uppercase())]
    TooLarge {
        /// Configuration field that failed validation.
        field: String,
        /// Largest accepted value.
        maximum: u64,
    },
    /// Raised when `ssh_args` cannot be split into arguments.
    #[error("cannot parse ssh_args `{value}`: {message}")]
    InvalidSshArgs {
        /// Value as configured.
        value: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when the identity file cannot be found.
    #[error("identity file `{path}` is not usable: {message}")]
    IdentityFile {
        /// Expanded path that was checked.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
}

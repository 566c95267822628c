//! Core session types and the command runner abstraction.

use std::ffi::OsString;
use std::process::Command;

use crate::session::SessionError;

/// Result of running an external command with captured output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, SessionError>;

    /// Runs `program` attached to the caller's terminal and returns its exit
    /// code, or `None` when the process was terminated by a signal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Spawn`] if the command cannot be started.
    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, SessionError>;
}

/// Real command runner that shells out to the host operating system.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    fn spawn_error(program: &str, err: &std::io::Error) -> SessionError {
        SessionError::Spawn {
            program: program.to_owned(),
            message: err.to_string(),
        }
    }
}

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, SessionError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| Self::spawn_error(program, &err))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, SessionError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|err| Self::spawn_error(program, &err))?;
        Ok(status.code())
    }
}

//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::rc::Rc;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use crate::session::{CommandOutput, CommandRunner, SessionError};

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Captured and attached runs draw from the same queue, so tests push
/// responses in the order the code under test issues commands.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<ScriptedResponse>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

#[derive(Clone, Debug)]
enum ScriptedResponse {
    Output(CommandOutput),
    SpawnFailure,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Whether the command was run attached to the terminal.
    pub attached: bool,
    /// When the command was issued, on the tokio clock so paused tests
    /// observe virtual time.
    pub at: Instant,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Returns the invocations of `program` only.
    #[must_use]
    pub fn invocations_of(&self, program: &str) -> Vec<CommandInvocation> {
        self.invocations
            .borrow()
            .iter()
            .filter(|invocation| invocation.program == program)
            .cloned()
            .collect()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a specific exit code.
    pub fn push_exit_code(&self, code: i32) {
        self.push_output(Some(code), "", "");
    }

    /// Pushes a response with no exit code to simulate a signal-terminated
    /// process.
    pub fn push_missing_exit_code(&self) {
        self.push_output(None, "", "");
    }

    /// Pushes a response that fails to spawn.
    pub fn push_spawn_failure(&self) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::SpawnFailure);
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::Output(CommandOutput {
                code,
                stdout: stdout.into(),
                stderr: stderr.into(),
            }));
    }

    fn next(
        &self,
        program: &str,
        args: &[OsString],
        attached: bool,
    ) -> Result<CommandOutput, SessionError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
            attached,
            at: Instant::now(),
        });
        let spawn_error = |message: &str| SessionError::Spawn {
            program: program.to_owned(),
            message: message.to_owned(),
        };
        match self.responses.borrow_mut().pop_front() {
            Some(ScriptedResponse::Output(output)) => Ok(output),
            Some(ScriptedResponse::SpawnFailure) => Err(spawn_error("scripted spawn failure")),
            None => Err(spawn_error("no scripted response available")),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, SessionError> {
        self.next(program, args, false)
    }

    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, SessionError> {
        self.next(program, args, true).map(|output| output.code)
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

// ABOUTME: Executor trait and shell-backed implementation.
// ABOUTME: Dispatches command strings with an env overlay and working directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Environment passed to an invocation.
///
/// Computed once at backend construction and reused verbatim by every
/// operation. `Inherit` merges the overlay into the ambient process
/// environment; `Isolated` replaces it entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOverlay {
    Inherit(HashMap<String, String>),
    Isolated(HashMap<String, String>),
}

impl EnvOverlay {
    pub fn vars(&self) -> &HashMap<String, String> {
        match self {
            EnvOverlay::Inherit(vars) | EnvOverlay::Isolated(vars) => vars,
        }
    }
}

/// Per-call behavior switches.
///
/// `None` means "use this operation's default": `ps` defaults to
/// capture-and-never-raise so callers always get a result to inspect,
/// while mutating operations default to stream-and-raise so failures are
/// loud. The defaults are resolved by each operation via [`ExecOpts::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOpts {
    /// Capture stdout/stderr instead of streaming them live.
    pub pipe: Option<bool>,
    /// Raise on nonzero exit instead of returning the result regardless.
    pub check: Option<bool>,
}

impl ExecOpts {
    pub fn pipe(mut self, pipe: bool) -> Self {
        self.pipe = Some(pipe);
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = Some(check);
        self
    }

    /// Fill unset switches with the calling operation's defaults.
    pub fn resolve(self, default_pipe: bool, default_check: bool) -> (bool, bool) {
        (
            self.pipe.unwrap_or(default_pipe),
            self.check.unwrap_or(default_check),
        )
    }
}

/// Everything an invocation needs besides the command string itself.
#[derive(Debug, Clone)]
pub struct ExecContext {
    pub env: EnvOverlay,
    pub cwd: Option<PathBuf>,
    pub pipe: bool,
    pub check: bool,
}

/// Structured outcome of one dispatched command.
#[derive(Debug, Clone, Default)]
pub struct InvocationResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub succeeded: bool,
}

/// Errors from dispatching a command.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },
}

/// Runs a shell command string, blocking until the process exits.
pub trait Executor {
    fn run(&self, cmd: &str, ctx: &ExecContext) -> Result<InvocationResult, ExecutorError>;
}

/// Executor backed by `sh -c`.
///
/// A shell is required because several backend commands are literal
/// pipelines (stderr suppression via `grep -v`) or `&&` chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for ShellExecutor {
    fn run(&self, cmd: &str, ctx: &ExecContext) -> Result<InvocationResult, ExecutorError> {
        tracing::debug!(command = %cmd, cwd = ?ctx.cwd, pipe = ctx.pipe, "dispatching");

        // /bin/sh by absolute path: an isolated overlay may carry no PATH.
        let mut command = Command::new("/bin/sh");
        command.arg("-c").arg(cmd);

        match &ctx.env {
            EnvOverlay::Inherit(vars) => {
                command.envs(vars);
            }
            EnvOverlay::Isolated(vars) => {
                command.env_clear().envs(vars);
            }
        }

        if let Some(cwd) = &ctx.cwd {
            command.current_dir(cwd);
        }

        let result = if ctx.pipe {
            let output = command
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(|source| ExecutorError::Spawn {
                    command: cmd.to_string(),
                    source,
                })?;

            InvocationResult {
                // -1 stands in for signal termination
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                succeeded: output.status.success(),
            }
        } else {
            let status = command.status().map_err(|source| ExecutorError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

            InvocationResult {
                exit_code: status.code().unwrap_or(-1),
                stdout: String::new(),
                stderr: String::new(),
                succeeded: status.success(),
            }
        };

        if ctx.check && !result.succeeded {
            return Err(ExecutorError::CommandFailed {
                command: cmd.to_string(),
                exit_code: result.exit_code,
            });
        }

        Ok(result)
    }
}

// ABOUTME: Stack-level error types with SNAFU pattern.
// ABOUTME: Unifies resolution, dispatch, and inspection failures for programmatic handling.

use snafu::Snafu;

use super::config::ConfigResolutionError;
use crate::executor::ExecutorError;

/// Unified error for stack operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StackError {
    #[snafu(display("stack config resolution failed: {source}"))]
    ConfigResolution { source: ConfigResolutionError },

    #[snafu(display("command dispatch failed: {source}"))]
    Command { source: ExecutorError },

    #[snafu(display("could not inspect service {service}: {reason}"))]
    Inspection { service: String, reason: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackErrorKind {
    /// The render subcommand failed or produced unparsable output.
    ConfigResolution,
    /// A dispatched command exited nonzero under check semantics.
    CommandFailed,
    /// The command could not be spawned at all.
    Spawn,
    /// An inspect-dependent derived operation could not obtain a result.
    Inspection,
}

impl StackError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> StackErrorKind {
        match self {
            StackError::ConfigResolution { .. } => StackErrorKind::ConfigResolution,
            StackError::Command { source } => match source {
                ExecutorError::Spawn { .. } => StackErrorKind::Spawn,
                ExecutorError::CommandFailed { .. } => StackErrorKind::CommandFailed,
            },
            StackError::Inspection { .. } => StackErrorKind::Inspection,
        }
    }
}

impl From<ConfigResolutionError> for StackError {
    fn from(source: ConfigResolutionError) -> Self {
        StackError::ConfigResolution { source }
    }
}

impl From<ExecutorError> for StackError {
    fn from(source: ExecutorError) -> Self {
        StackError::Command { source }
    }
}

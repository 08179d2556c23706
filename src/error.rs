// ABOUTME: Application-wide error types for davit.
// ABOUTME: Aggregates module errors behind one crate-level Error.

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::stack::StackError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

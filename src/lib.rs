// ABOUTME: Library root for davit - backend-agnostic stack operations.
// ABOUTME: Wraps docker-compose and docker swarm behind a common Stack trait.

pub mod config;
pub mod error;
pub mod executor;
pub mod flags;
pub mod stack;

pub use error::{Error, Result};
pub use executor::{EnvOverlay, ExecContext, ExecOpts, Executor, InvocationResult, ShellExecutor};
pub use flags::FlagSet;
pub use stack::{ComposeStack, Stack, StackDescriptor, SwarmStack, resolve_stack};

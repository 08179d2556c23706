// ABOUTME: Common stack contract and backend factory.
// ABOUTME: Defines the Stack trait and resolves named stacks into compose or swarm backends.

mod compose;
mod config;
mod error;
pub(crate) mod sealed;
mod swarm;

pub use compose::ComposeStack;
pub use config::{ConfigResolutionError, StackConfig};
pub use error::{StackError, StackErrorKind};
pub use swarm::SwarmStack;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::executor::{ExecOpts, Executor, InvocationResult};
use crate::flags::FlagSet;

pub(crate) const COMPOSE_BIN: &str = "docker-compose";
pub(crate) const DOCKER_BIN: &str = "docker";

/// Label the swarm orchestrator stamps on every service of a stack.
pub const SWARM_NAMESPACE_LABEL: &str = "com.docker.stack.namespace";

/// Identity of a stack, resolved once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescriptor {
    pub name: String,
    pub basedir: PathBuf,
    pub compose_file: String,
    pub swarm: bool,
}

/// The operation contract shared by both backends.
///
/// Every operation accepts per-call [`ExecOpts`] switches; unset switches
/// fall back to that operation's defaults (`ps` captures and never raises,
/// mutating operations stream and raise).
pub trait Stack: sealed::Sealed {
    fn name(&self) -> &str;

    fn descriptor(&self) -> &StackDescriptor;

    /// The resolved stack configuration, rendered and parsed on first
    /// access and memoized for the lifetime of this instance. A
    /// resolution failure is cached too: the instance stays un-resolved
    /// until a new one is constructed.
    fn config(&self) -> Result<&StackConfig, StackError>;

    /// Validate the stack file by invoking the render subcommand and
    /// reporting success purely on exit code.
    fn check_config(&self) -> Result<bool, StackError>;

    fn build(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    fn push(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    fn up(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    fn down(&self, flags: FlagSet, opts: ExecOpts) -> Result<InvocationResult, StackError>;

    /// Restart services. `None` restarts every service of the stack.
    fn restart(
        &self,
        services: Option<&[&str]>,
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    fn ps(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    fn logs(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    /// Run a command inside a running instance of `service`.
    fn exec(
        &self,
        service: &str,
        cmd: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    /// Run a one-off instance of `service`. When no flags are given the
    /// container is removed after exit.
    fn run(
        &self,
        service: &str,
        cmd: &str,
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    /// Inspect one running replica of `service`, addressed as
    /// `<stack>_<service>_<replica>`.
    fn inspect(
        &self,
        service: &str,
        replica_index: u32,
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError>;

    /// Count services by running `ps` and counting output lines.
    ///
    /// This is an approximation, not an exact count: it depends on the
    /// underlying tool's line-oriented output and includes any header
    /// line the tool emits.
    fn count_services(&self, filter: Option<&[(&str, &str)]>) -> Result<usize, StackError> {
        let mut flags = FlagSet::new();
        if let Some(pairs) = filter {
            flags.set_repeated("filter", pairs.iter().map(|(k, v)| format!("{k}={v}")));
        }
        let res = self.ps(&[], flags, ExecOpts::default())?;
        Ok(res.stdout.lines().count())
    }

    /// The IP address of `service` on `network`, read from the inspect
    /// output.
    fn get_ip_address(&self, service: &str, network: &str) -> Result<String, StackError> {
        let res = self.inspect(
            service,
            1,
            FlagSet::new(),
            ExecOpts::default().pipe(true).check(false),
        )?;

        if !res.succeeded {
            return Err(StackError::Inspection {
                service: service.to_string(),
                reason: format!("inspect exited with code {}", res.exit_code),
            });
        }

        let data: serde_json::Value =
            serde_json::from_str(&res.stdout).map_err(|e| StackError::Inspection {
                service: service.to_string(),
                reason: format!("unparsable inspect output: {e}"),
            })?;

        data.get(0)
            .and_then(|v| v.get("NetworkSettings"))
            .and_then(|v| v.get("Networks"))
            .and_then(|v| v.get(network))
            .and_then(|v| v.get("IPAddress"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StackError::Inspection {
                service: service.to_string(),
                reason: format!("no IP address on network {network}"),
            })
    }
}

impl std::fmt::Debug for dyn Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("descriptor", self.descriptor())
            .finish()
    }
}

/// Append positional service names to an encoded command.
pub(crate) fn with_services(mut cmd: String, services: &[&str]) -> String {
    for service in services {
        cmd.push(' ');
        cmd.push_str(service);
    }
    cmd
}

/// Resolve a named stack from configuration into a backend instance.
///
/// The `swarm` field of the stack entry selects the backend; `path`
/// defaults to the current working directory. The returned backend has
/// not resolved its stack configuration yet.
pub fn resolve_stack(
    config: &Config,
    executor: Arc<dyn Executor>,
    stack_name: &str,
) -> Result<Box<dyn Stack>, ConfigError> {
    let entry = config.stack_entry(stack_name)?;

    let compose_file = entry
        .file
        .clone()
        .ok_or_else(|| ConfigError::MissingFile(stack_name.to_string()))?;

    let basedir = match &entry.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    let descriptor = StackDescriptor {
        name: stack_name.to_string(),
        basedir,
        compose_file,
        swarm: entry.swarm,
    };

    if entry.swarm {
        Ok(Box::new(SwarmStack::new(executor, descriptor)))
    } else {
        Ok(Box::new(ComposeStack::new(executor, descriptor)))
    }
}

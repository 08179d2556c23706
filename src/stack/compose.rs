// ABOUTME: Compose backend - maps the stack contract onto docker-compose subcommands.
// ABOUTME: Merges COMPOSE_PROJECT_NAME/COMPOSE_FILE into the ambient environment.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::config::{ConfigResolutionError, StackConfig};
use super::error::StackError;
use super::sealed::Sealed;
use super::{COMPOSE_BIN, DOCKER_BIN, Stack, StackDescriptor, with_services};
use crate::executor::{EnvOverlay, ExecContext, ExecOpts, Executor, InvocationResult};
use crate::flags::{FlagSet, encode};

/// Stack backed by the local composition tool.
pub struct ComposeStack {
    descriptor: StackDescriptor,
    executor: Arc<dyn Executor>,
    env: EnvOverlay,
    config_cell: OnceLock<Result<StackConfig, ConfigResolutionError>>,
}

impl ComposeStack {
    pub fn new(executor: Arc<dyn Executor>, descriptor: StackDescriptor) -> Self {
        let mut vars = HashMap::new();
        vars.insert(
            "COMPOSE_PROJECT_NAME".to_string(),
            descriptor.name.clone(),
        );
        vars.insert("COMPOSE_FILE".to_string(), descriptor.compose_file.clone());

        Self {
            env: EnvOverlay::Inherit(vars),
            executor,
            descriptor,
            config_cell: OnceLock::new(),
        }
    }

    /// Pass arbitrary arguments through to docker-compose.
    pub fn raw(&self, args: &[&str]) -> Result<InvocationResult, StackError> {
        let cmd = with_services(COMPOSE_BIN.to_string(), args);
        self.dispatch(&cmd, false, true)
    }

    fn dispatch(&self, cmd: &str, pipe: bool, check: bool) -> Result<InvocationResult, StackError> {
        let ctx = ExecContext {
            env: self.env.clone(),
            cwd: Some(self.descriptor.basedir.clone()),
            pipe,
            check,
        };
        Ok(self.executor.run(cmd, &ctx)?)
    }

    fn resolve_config(&self) -> Result<StackConfig, ConfigResolutionError> {
        let res = self
            .dispatch(&format!("{COMPOSE_BIN} config 2>/dev/null"), true, true)
            .map_err(|e| ConfigResolutionError {
                stack: self.descriptor.name.clone(),
                message: e.to_string(),
            })?;

        StackConfig::from_yaml(&res.stdout).map_err(|e| ConfigResolutionError {
            stack: self.descriptor.name.clone(),
            message: e.to_string(),
        })
    }
}

impl Sealed for ComposeStack {}

impl Stack for ComposeStack {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn descriptor(&self) -> &StackDescriptor {
        &self.descriptor
    }

    fn config(&self) -> Result<&StackConfig, StackError> {
        match self.config_cell.get_or_init(|| self.resolve_config()) {
            Ok(config) => Ok(config),
            Err(e) => Err(StackError::from(e.clone())),
        }
    }

    fn check_config(&self) -> Result<bool, StackError> {
        let res = self.dispatch(&format!("{COMPOSE_BIN} config 2>&1 1>/dev/null"), false, false)?;
        Ok(res.succeeded)
    }

    fn build(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        let cmd = with_services(encode(&format!("{COMPOSE_BIN} build"), &flags), services);
        self.dispatch(&cmd, pipe, check)
    }

    fn push(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        let cmd = with_services(encode(&format!("{COMPOSE_BIN} push"), &flags), services);
        self.dispatch(&cmd, pipe, check)
    }

    fn up(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        tracing::info!(stack = %self.descriptor.name, "bringing stack up");
        let cmd = with_services(encode(&format!("{COMPOSE_BIN} up"), &flags), services);
        self.dispatch(&cmd, pipe, check)
    }

    fn down(&self, flags: FlagSet, opts: ExecOpts) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        tracing::info!(stack = %self.descriptor.name, "taking stack down");
        let cmd = encode(&format!("{COMPOSE_BIN} down"), &flags);
        self.dispatch(&cmd, pipe, check)
    }

    fn restart(
        &self,
        services: Option<&[&str]>,
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        let cmd = with_services(
            encode(&format!("{COMPOSE_BIN} restart"), &flags),
            services.unwrap_or(&[]),
        );
        self.dispatch(&cmd, pipe, check)
    }

    fn ps(
        &self,
        services: &[&str],
        mut flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        // docker-compose ps --filter doesn't work without --services
        // see https://github.com/docker/compose/issues/5996
        if flags.contains("filter") && !flags.contains("services") {
            flags.set_bool("services", true);
        }

        let (pipe, check) = opts.resolve(true, false);
        let cmd = with_services(encode(&format!("{COMPOSE_BIN} ps"), &flags), services);
        self.dispatch(&cmd, pipe, check)
    }

    fn logs(
        &self,
        services: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        let cmd = with_services(encode(&format!("{COMPOSE_BIN} logs"), &flags), services);
        self.dispatch(&cmd, pipe, check)
    }

    fn exec(
        &self,
        service: &str,
        cmd: &[&str],
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        let mut full = encode(&format!("{COMPOSE_BIN} exec"), &flags);
        full.push(' ');
        full.push_str(service);
        let full = with_services(full, cmd);
        self.dispatch(&full, pipe, check)
    }

    fn run(
        &self,
        service: &str,
        cmd: &str,
        mut flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        if flags.is_empty() {
            flags.set_bool("rm", true);
        }

        let (pipe, check) = opts.resolve(false, true);
        let full = format!("{} {service} {cmd}", encode(&format!("{COMPOSE_BIN} run"), &flags));
        self.dispatch(&full, pipe, check)
    }

    fn inspect(
        &self,
        service: &str,
        replica_index: u32,
        flags: FlagSet,
        opts: ExecOpts,
    ) -> Result<InvocationResult, StackError> {
        let (pipe, check) = opts.resolve(false, true);
        let cmd = format!(
            "{} {}_{service}_{replica_index}",
            encode(&format!("{DOCKER_BIN} inspect"), &flags),
            self.descriptor.name,
        );
        self.dispatch(&cmd, pipe, check)
    }
}

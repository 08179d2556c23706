// ABOUTME: Resolved stack configuration model.
// ABOUTME: Deserialized from the render subcommand's YAML output; memoized per backend.

use serde::Deserialize;
use thiserror::Error;

/// A render or parse failure while resolving a stack's configuration.
///
/// Cloneable because the failure is cached: once resolution fails, the
/// backend instance re-surfaces the same error on every later access.
#[derive(Debug, Clone, Error)]
#[error("could not resolve config of stack \"{stack}\": {message}")]
pub struct ConfigResolutionError {
    pub stack: String,
    pub message: String,
}

/// The structural description of a stack, as rendered by the underlying
/// tool's `config` subcommand.
///
/// `services` keeps the declaration order of the rendered document; the
/// swarm backend relies on that order when it expands a restart-all into
/// a chain of per-service updates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StackConfig {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub services: serde_yaml::Mapping,

    #[serde(default)]
    pub networks: serde_yaml::Mapping,

    #[serde(default)]
    pub volumes: serde_yaml::Mapping,
}

impl StackConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Service names in declaration order.
    pub fn service_names(&self) -> Vec<String> {
        self.services
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }
}

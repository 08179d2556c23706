// ABOUTME: Top-level configuration types and parsing for davit.yml.
// ABOUTME: Holds the stacks section consumed by the stack factory.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "davit.yml";
pub const CONFIG_FILENAME_ALT: &str = "davit.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".davit/config.yml";

/// Errors from loading the configuration file or resolving a stack entry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found in {0}")]
    NotFound(PathBuf),

    #[error("no top key \"stacks\" found in the config")]
    MissingStacks,

    #[error("stack {0} not defined in the config")]
    UnknownStack(String),

    #[error("no property \"file\" found in the config of \"{0}\" stack")]
    MissingFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One entry in the `stacks` section.
///
/// `file` is required for the entry to be usable, but the omission is
/// reported by the factory as [`ConfigError::MissingFile`] rather than as
/// a parse failure, so a config with one broken stack still loads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StackEntry {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub swarm: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stacks: Option<BTreeMap<String, StackEntry>>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(ConfigError::from)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(ConfigError::NotFound(dir.to_path_buf()))
    }

    /// Look up a stack entry, distinguishing a missing section from an
    /// unknown name.
    pub fn stack_entry(&self, name: &str) -> Result<&StackEntry, ConfigError> {
        let stacks = self.stacks.as_ref().ok_or(ConfigError::MissingStacks)?;
        stacks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownStack(name.to_string()))
    }
}

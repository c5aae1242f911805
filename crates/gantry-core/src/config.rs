//! Manager configuration: host topology and auto-update policy.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use gantry_protocols::{AutoUpdatePolicy, ComponentKind, Host};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// One host entry in the topology section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub id: String,

    /// Display label; defaults to the id.
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub remote: bool,

    /// Kinds the host can natively run, in preference order. Empty means the
    /// conventional affinity for the host flavor: `[ui, web]` locally,
    /// `[workspace, web]` remotely.
    #[serde(default)]
    pub affinity: Vec<ComponentKind>,
}

impl HostConfig {
    fn to_host(&self) -> Host {
        let label = self.label.clone().unwrap_or_else(|| self.id.clone());
        let affinity = if self.affinity.is_empty() {
            if self.remote {
                vec![ComponentKind::Workspace, ComponentKind::Web]
            } else {
                vec![ComponentKind::Ui, ComponentKind::Web]
            }
        } else {
            self.affinity.clone()
        };
        Host::new(&self.id, label)
            .with_remote(self.remote)
            .with_affinity(affinity)
    }
}

/// Component manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Ordered host topology; the order doubles as canonical-selection
    /// precedence.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<HostConfig>,

    /// Global auto-update policy applied until a policy store overrides it.
    #[serde(default)]
    pub auto_update: AutoUpdatePolicy,
}

fn default_hosts() -> Vec<HostConfig> {
    vec![HostConfig {
        id: "local".to_string(),
        label: Some("Local".to_string()),
        remote: false,
        affinity: Vec::new(),
    }]
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            auto_update: AutoUpdatePolicy::default(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content)?;
        let config: Self = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the topology: at least one host, unique ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "hosts".to_string(),
                message: "at least one host is required".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for host in &self.hosts {
            if host.id.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "hosts.id".to_string(),
                    message: "host id must not be empty".to_string(),
                });
            }
            if !seen.insert(host.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "hosts.id".to_string(),
                    message: format!("duplicate host id '{}'", host.id),
                });
            }
        }
        Ok(())
    }

    /// The resolved, ordered host topology.
    pub fn topology(&self) -> Vec<Host> {
        self.hosts.iter().map(HostConfig::to_host).collect()
    }
}

/// Expand environment variables in the format `${VAR}`.
fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let var_value = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}

/// Expand shell-style paths (e.g., `~/.gantry`).
pub fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

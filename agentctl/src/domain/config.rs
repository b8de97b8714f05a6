//! Server configuration schema.
//!
//! Loaded from `AGENTCTL_*` environment variables by the binary; this module
//! only declares the shape and defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::activation::AgentActivationOptions;

/// Agent property enabled when a caller supplies none.
pub const DEFAULT_PROPERTY: &str = "org.jboss.byteman.verbose";

/// Configuration loaded from environment variables via `envy`.
///
/// Each field maps to `AGENTCTL_<FIELD>`, e.g. `AGENTCTL_AGENT_PORT`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentctlConfig {
    /// Socket address to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Host the agent's control listener binds to.
    #[serde(default = "default_agent_host")]
    pub agent_host: String,

    /// Port of the agent's control listener.
    #[serde(default = "default_agent_port")]
    pub agent_port: u16,

    /// Agent installation root; falls back to `BYTEMAN_HOME`.
    pub agent_home: Option<PathBuf>,

    /// Explicit path to the agent module, overrides `agent_home`.
    pub agent_module: Option<PathBuf>,

    /// Program used for the primary attach strategy.
    #[serde(default = "default_installer_program")]
    pub installer_program: String,

    /// Program used to attach to a pid and load the agent module manually.
    #[serde(default = "default_attach_program")]
    pub attach_program: String,

    /// Directory staged rule files are written to (system temp dir if unset).
    pub staging_dir: Option<PathBuf>,

    /// Properties used when an activation request names none.
    #[serde(default = "default_properties")]
    pub default_properties: Vec<String>,

    #[serde(default = "default_true")]
    pub add_to_boot_classpath: bool,

    #[serde(default)]
    pub enforce_security_policy: bool,

    /// Timeout for installer / attach programs, in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Timeout for one control channel round trip, in seconds.
    #[serde(default = "default_channel_timeout_secs")]
    pub channel_timeout_secs: u64,
}

impl Default for AgentctlConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            agent_host: default_agent_host(),
            agent_port: default_agent_port(),
            agent_home: None,
            agent_module: None,
            installer_program: default_installer_program(),
            attach_program: default_attach_program(),
            staging_dir: None,
            default_properties: default_properties(),
            add_to_boot_classpath: true,
            enforce_security_policy: false,
            command_timeout_secs: default_command_timeout_secs(),
            channel_timeout_secs: default_channel_timeout_secs(),
        }
    }
}

impl AgentctlConfig {
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout_secs)
    }

    /// Build activation options for a request.
    ///
    /// An empty `properties` list selects `default_properties`. Host and port
    /// are left at the agent defaults; the listener address the probe and
    /// channel use is the agent's default one.
    #[must_use]
    pub fn activation_options(&self, properties: Vec<String>) -> AgentActivationOptions {
        let properties = if properties.is_empty() {
            self.default_properties.clone()
        } else {
            properties
        };
        AgentActivationOptions {
            properties,
            host: None,
            port: 0,
            add_to_boot_classpath: self.add_to_boot_classpath,
            enforce_security_policy: self.enforce_security_policy,
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_agent_host() -> String {
    "localhost".to_string()
}

fn default_agent_port() -> u16 {
    9091
}

fn default_installer_program() -> String {
    "bminstall".to_string()
}

fn default_attach_program() -> String {
    "jattach".to_string()
}

fn default_properties() -> Vec<String> {
    vec![DEFAULT_PROPERTY.to_string()]
}

fn default_true() -> bool {
    true
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_channel_timeout_secs() -> u64 {
    10
}

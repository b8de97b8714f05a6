//! Configuration loading from `AGENTCTL_*` environment variables.

use anyhow::{Context, Result};

use crate::domain::AgentctlConfig;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "AGENTCTL_";

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns an error if a variable is present but cannot be parsed.
pub fn load() -> Result<AgentctlConfig> {
    envy::prefixed(ENV_PREFIX)
        .from_env()
        .context("failed to load config from AGENTCTL_* env vars")
}

/// Load configuration from explicit `(name, value)` pairs.
///
/// # Errors
///
/// Returns an error if a value cannot be parsed.
pub fn load_from<I>(vars: I) -> Result<AgentctlConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed(ENV_PREFIX)
        .from_iter(vars)
        .context("failed to load config from AGENTCTL_* variables")
}

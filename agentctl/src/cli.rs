//! Command-line flags layered over the `AGENTCTL_*` environment.

use clap::Parser;

use crate::domain::AgentctlConfig;

/// Remote control plane for an in-process instrumentation agent.
#[derive(Debug, Parser)]
#[command(name = "agentctl", version, about)]
pub struct Cli {
    /// Address the HTTP server binds to (overrides `AGENTCTL_LISTEN_ADDR`).
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Port of the agent's control listener (overrides `AGENTCTL_AGENT_PORT`).
    #[arg(long)]
    pub agent_port: Option<u16>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the environment config.
    #[must_use]
    pub fn apply(&self, mut config: AgentctlConfig) -> AgentctlConfig {
        if let Some(addr) = &self.listen_addr {
            config.listen_addr.clone_from(addr);
        }
        if let Some(port) = self.agent_port {
            config.agent_port = port;
        }
        config
    }
}

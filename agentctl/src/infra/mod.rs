//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! agent's TCP control channel, the listener probe, attach tooling, and the
//! rule staging directory.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::http` are forbidden.

pub mod attach;
pub mod command_runner;
pub mod config;
pub mod control_channel;
pub mod probe;
pub mod staging;

use std::sync::Arc;

use crate::application::ControllerPorts;
use crate::domain::AgentctlConfig;

use self::attach::{CommandInstaller, ConfiguredModuleLocator, JattachAttacher};
use self::command_runner::TokioCommandRunner;
use self::control_channel::TcpControlChannel;
use self::probe::ListenerProbe;
use self::staging::TempFileStager;

/// Wire the production port implementations from configuration.
#[must_use]
pub fn production_ports(config: &AgentctlConfig) -> ControllerPorts {
    let runner = Arc::new(TokioCommandRunner::new(config.command_timeout()));
    ControllerPorts {
        probe: Arc::new(ListenerProbe::new(&config.agent_host, config.agent_port)),
        primary: Arc::new(CommandInstaller::new(
            config.installer_program.clone(),
            runner.clone(),
        )),
        locator: Arc::new(ConfiguredModuleLocator::from_config(config)),
        attacher: Arc::new(JattachAttacher::new(config.attach_program.clone(), runner)),
        channel: Arc::new(TcpControlChannel::new(
            &config.agent_host,
            config.agent_port,
            config.channel_timeout(),
        )),
        stager: Arc::new(TempFileStager::new(
            config.staging_dir.clone().unwrap_or_else(std::env::temp_dir),
        )),
    }
}

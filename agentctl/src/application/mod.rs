//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`
//! or `crate::http`.

pub mod ports;
pub mod services;

pub use ports::{
    AgentModuleLocator, AgentProbe, AttachedProcess, CommandRunner, ControlChannel,
    PrimaryInstaller, ProcessAttacher, RuleStager, StagedRuleFile,
};
pub use services::installer::AgentInstaller;
pub use services::lifecycle::{AgentLifecycleController, ControllerPorts, LifecycleFlags};
pub use services::rule_repository::RuleRepository;

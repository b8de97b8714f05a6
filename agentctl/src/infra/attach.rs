//! Attach tooling: the agent's installer program (primary strategy) and
//! `jattach`-driven manual module loading (fallback strategy).

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{
    AgentModuleLocator, AttachedProcess, CommandRunner, PrimaryInstaller, ProcessAttacher,
};
use crate::domain::{AgentActivationOptions, AgentctlConfig, ProcessHandle};

/// Module file inside an agent installation.
const MODULE_IN_HOME: &str = "lib/byteman.jar";

fn ensure_success(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
        "{program} exited with {}: {}",
        output.status,
        if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() }
    )
}

// ── Primary strategy ──────────────────────────────────────────────────────────

/// Runs the agent's own installer against a pid.
pub struct CommandInstaller {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl CommandInstaller {
    #[must_use]
    pub fn new(program: String, runner: Arc<dyn CommandRunner>) -> Self {
        Self { program, runner }
    }
}

/// Installer arguments: `[-b] [-s] [-h host] [-p port] -D<prop>... <pid>`.
#[must_use]
pub fn installer_args(handle: &ProcessHandle, options: &AgentActivationOptions) -> Vec<String> {
    let mut args = Vec::new();
    if options.add_to_boot_classpath {
        args.push("-b".to_string());
    }
    if options.enforce_security_policy {
        args.push("-s".to_string());
    }
    if let Some(host) = options.host() {
        args.push("-h".to_string());
        args.push(host.to_string());
    }
    if options.port != 0 {
        args.push("-p".to_string());
        args.push(options.port.to_string());
    }
    args.extend(options.properties.iter().map(|p| format!("-D{p}")));
    args.push(handle.pid().to_string());
    args
}

#[async_trait]
impl PrimaryInstaller for CommandInstaller {
    async fn install(&self, handle: &ProcessHandle, options: &AgentActivationOptions) -> Result<()> {
        let args = installer_args(handle, options);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!(program = %self.program, args = ?args, "running agent installer");
        let output = self
            .runner
            .run(&self.program, &arg_refs)
            .await
            .with_context(|| format!("running {} for pid {handle}", self.program))?;
        ensure_success(&self.program, &output)
    }
}

// ── Module location ───────────────────────────────────────────────────────────

/// Resolves the agent module from an explicit path or an installation root.
pub struct ConfiguredModuleLocator {
    module: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl ConfiguredModuleLocator {
    #[must_use]
    pub fn new(module: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        Self { module, home }
    }

    /// Use `agent_module`, else `agent_home`, else `BYTEMAN_HOME`.
    #[must_use]
    pub fn from_config(config: &AgentctlConfig) -> Self {
        let home = config
            .agent_home
            .clone()
            .or_else(|| std::env::var_os("BYTEMAN_HOME").map(PathBuf::from));
        Self::new(config.agent_module.clone(), home)
    }
}

impl AgentModuleLocator for ConfiguredModuleLocator {
    fn locate(&self) -> Result<PathBuf> {
        let path = match (&self.module, &self.home) {
            (Some(module), _) => module.clone(),
            (None, Some(home)) => home.join(MODULE_IN_HOME),
            (None, None) => anyhow::bail!(
                "agent module location unknown: set AGENTCTL_AGENT_MODULE, \
                 AGENTCTL_AGENT_HOME or BYTEMAN_HOME"
            ),
        };
        anyhow::ensure!(path.is_file(), "agent module not found at {}", path.display());
        path.canonicalize()
            .with_context(|| format!("resolving {}", path.display()))
    }
}

// ── Fallback strategy ─────────────────────────────────────────────────────────

/// Loads the agent module with `jattach` through the `instrument` agent
/// loader.
///
/// `jattach` connects, sends one command, and disconnects in a single run,
/// so no attachment is held between calls. `attach` only validates the pid
/// and `detach` only marks the session spent; the real connection lives
/// inside `load_agent`.
pub struct JattachAttacher {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl JattachAttacher {
    #[must_use]
    pub fn new(program: String, runner: Arc<dyn CommandRunner>) -> Self {
        Self { program, runner }
    }
}

#[async_trait]
impl ProcessAttacher for JattachAttacher {
    async fn attach(&self, pid: &str) -> Result<Box<dyn AttachedProcess>> {
        anyhow::ensure!(
            !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit()),
            "invalid pid: {pid:?}"
        );
        debug!(pid, program = %self.program, "attached to process");
        Ok(Box::new(JattachSession {
            pid: pid.to_string(),
            program: self.program.clone(),
            runner: self.runner.clone(),
            attached: true,
        }))
    }
}

struct JattachSession {
    pid: String,
    program: String,
    runner: Arc<dyn CommandRunner>,
    attached: bool,
}

#[async_trait]
impl AttachedProcess for JattachSession {
    async fn load_agent(&mut self, module: &Path, options: &str) -> Result<()> {
        anyhow::ensure!(self.attached, "attachment to pid {} already released", self.pid);
        let agent_arg = format!("{}={options}", module.display());
        let output = self
            .runner
            .run(
                &self.program,
                &[self.pid.as_str(), "load", "instrument", "false", agent_arg.as_str()],
            )
            .await
            .with_context(|| format!("running {} for pid {}", self.program, self.pid))?;
        ensure_success(&self.program, &output)
    }

    async fn detach(&mut self) -> Result<()> {
        self.attached = false;
        debug!(pid = %self.pid, "detached from process");
        Ok(())
    }
}

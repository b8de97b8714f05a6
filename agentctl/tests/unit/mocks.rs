//! Shared fake infrastructure for unit tests.
//!
//! [`FakeAgent`] plays every agent-facing port at once: probe, primary
//! installer, attacher and control channel. It keeps an in-memory rule set
//! parsed from the staged script files it is handed.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use agentctl::application::{
    AgentLifecycleController, AgentModuleLocator, AgentProbe, AttachedProcess, ControlChannel,
    ControllerPorts, PrimaryInstaller, ProcessAttacher,
};
use agentctl::domain::{AgentActivationOptions, AgentStatus, PARSE_EXCEPTION_MARKER, ProcessHandle};
use agentctl::infra::staging::TempFileStager;
use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

pub const MODULE_PATH: &str = "/opt/byteman/lib/byteman.jar";

/// A rule held by the fake agent.
#[derive(Debug, Clone)]
pub struct FakeRule {
    pub name: String,
    pub script: String,
    pub text: String,
    pub broken: bool,
}

#[derive(Debug, Default)]
pub struct AgentState {
    pub attached: bool,
    pub rules: Vec<FakeRule>,
    pub fail_primary: bool,
    pub fail_submit: bool,
    pub fail_delete_all: bool,
    /// TERMINATE is acknowledged but the listener keeps accepting.
    pub listener_survives_close: bool,
    pub primary_calls: usize,
    /// `(pid, module, options)` for every manual module load.
    pub module_loads: Vec<(String, String, String)>,
    pub detaches: usize,
    /// Every script path handed to the channel, with whether it existed.
    pub submitted: Vec<(PathBuf, bool)>,
    pub listener_closes: usize,
    pub delete_all_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeAgent {
    state: Arc<Mutex<AgentState>>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().expect("fake agent lock")
    }

    pub fn ports(&self, staging: &TempDir) -> ControllerPorts {
        let me = Arc::new(self.clone());
        ControllerPorts {
            probe: me.clone(),
            primary: me.clone(),
            locator: Arc::new(FixedLocator),
            attacher: me.clone(),
            channel: me,
            stager: Arc::new(TempFileStager::new(staging.path().to_path_buf())),
        }
    }

    pub fn controller(&self, staging: &TempDir) -> AgentLifecycleController {
        AgentLifecycleController::new(self.ports(staging))
    }

    fn read_script(&self, path: &Path) -> Result<String> {
        let exists = path.exists();
        self.state().submitted.push((path.to_path_buf(), exists));
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Names of the rules in a script, taken from `RULE <name>` lines.
pub fn rule_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("RULE "))
        .map(|name| name.trim().to_string())
        .collect()
}

pub fn rule(name: &str) -> String {
    format!(
        "RULE {name}\nCLASS com.example.Service\nMETHOD handle\nAT ENTRY\nIF true\nDO traceln(\"{name}\")\nENDRULE\n"
    )
}

pub fn broken_rule(name: &str) -> String {
    format!("RULE {name}\nCLASS com.example.Service\nMETHOD handle\nDO traceln(\n")
}

struct FixedLocator;

impl AgentModuleLocator for FixedLocator {
    fn locate(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(MODULE_PATH))
    }
}

#[async_trait]
impl AgentProbe for FakeAgent {
    async fn is_attached(&self, handle: &ProcessHandle) -> AgentStatus {
        AgentStatus {
            handle: handle.clone(),
            attached: self.state().attached,
        }
    }
}

#[async_trait]
impl PrimaryInstaller for FakeAgent {
    async fn install(&self, _: &ProcessHandle, _: &AgentActivationOptions) -> Result<()> {
        let mut state = self.state();
        state.primary_calls += 1;
        if state.fail_primary {
            anyhow::bail!("java.lang.ClassNotFoundException: org.jboss.byteman.agent.install.Install");
        }
        state.attached = true;
        Ok(())
    }
}

#[async_trait]
impl ProcessAttacher for FakeAgent {
    async fn attach(&self, pid: &str) -> Result<Box<dyn AttachedProcess>> {
        Ok(Box::new(FakeAttachment {
            agent: self.clone(),
            pid: pid.to_string(),
        }))
    }
}

struct FakeAttachment {
    agent: FakeAgent,
    pid: String,
}

#[async_trait]
impl AttachedProcess for FakeAttachment {
    async fn load_agent(&mut self, module: &Path, options: &str) -> Result<()> {
        let mut state = self.agent.state();
        state.module_loads.push((
            self.pid.clone(),
            module.display().to_string(),
            options.to_string(),
        ));
        state.attached = true;
        Ok(())
    }

    async fn detach(&mut self) -> Result<()> {
        self.agent.state().detaches += 1;
        Ok(())
    }
}

#[async_trait]
impl ControlChannel for FakeAgent {
    async fn list_rules(&self) -> Result<String> {
        let state = self.state();
        let mut listing = String::new();
        for rule in &state.rules {
            listing.push_str(&format!("# File {} line 1\n{}", rule.script, rule.text));
            if rule.broken {
                listing.push_str(&format!(
                    "{PARSE_EXCEPTION_MARKER}.ParseException: rule {} is missing ENDRULE\n",
                    rule.name
                ));
            }
        }
        Ok(listing)
    }

    async fn delete_all_rules(&self) -> Result<String> {
        let mut state = self.state();
        state.delete_all_calls += 1;
        if state.fail_delete_all {
            anyhow::bail!("agent refused DELETEALL");
        }
        let out = state
            .rules
            .drain(..)
            .map(|r| format!("uninstall RULE {}\n", r.name))
            .collect();
        Ok(out)
    }

    async fn add_rules_from_files(&self, paths: &[&Path]) -> Result<String> {
        let mut out = String::new();
        for path in paths {
            let text = self.read_script(path)?;
            let mut state = self.state();
            if state.fail_submit {
                anyhow::bail!("connection reset by agent");
            }
            for name in rule_names(&text) {
                state.rules.retain(|r| r.name != name);
                state.rules.push(FakeRule {
                    name: name.clone(),
                    script: path.display().to_string(),
                    text: text.clone(),
                    broken: !text.contains("ENDRULE"),
                });
                out.push_str(&format!("install rule {name}\n"));
            }
        }
        Ok(out)
    }

    async fn delete_rules_from_files(&self, paths: &[&Path]) -> Result<String> {
        let mut out = String::new();
        for path in paths {
            let text = self.read_script(path)?;
            let mut state = self.state();
            if state.fail_submit {
                anyhow::bail!("connection reset by agent");
            }
            for name in rule_names(&text) {
                state.rules.retain(|r| r.name != name);
                out.push_str(&format!("uninstall RULE {name}\n"));
            }
        }
        Ok(out)
    }

    async fn version(&self) -> Result<String> {
        Ok("4.0.20\n".to_string())
    }

    async fn close_listener(&self) -> Result<()> {
        let mut state = self.state();
        state.listener_closes += 1;
        if !state.listener_survives_close {
            state.attached = false;
        }
        Ok(())
    }
}

/// Files currently present in the staging directory.
pub fn staged_files(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path())
        .expect("read staging dir")
        .map(|e| e.expect("dir entry").path())
        .collect()
}

pub fn options(props: &[&str]) -> AgentActivationOptions {
    AgentActivationOptions {
        properties: props.iter().map(ToString::to_string).collect(),
        ..Default::default()
    }
}

//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`
//! or `crate::http`.
//!
//! Ports are object safe and `Send + Sync` so services can hold them as
//! `Arc<dyn Port>` and be shared across request handlers.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempPath;

use crate::domain::{AgentActivationOptions, AgentStatus, ProcessHandle};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Rule text written to a discoverable location for one request.
///
/// Owned by the request that staged it. Dropping it deletes the file, so a
/// cancelled or panicking request cannot leak it; [`RuleStager::release`]
/// is the explicit path that reports removal errors.
#[derive(Debug)]
pub struct StagedRuleFile {
    file: TempPath,
    contents: String,
}

impl StagedRuleFile {
    #[must_use]
    pub fn new(file: TempPath, contents: String) -> Self {
        Self { file, contents }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Give up the staged text and keep only the delete-on-drop path.
    #[must_use]
    pub fn into_temp_path(self) -> TempPath {
        self.file
    }
}

// ── Agent Presence Ports ──────────────────────────────────────────────────────

/// Live check for a resident agent. Never cached.
#[async_trait]
pub trait AgentProbe: Send + Sync {
    /// Report whether an agent is attached to `handle`'s process.
    async fn is_attached(&self, handle: &ProcessHandle) -> AgentStatus;
}

/// Primary attach strategy: the agent's own self-install mechanism.
#[async_trait]
pub trait PrimaryInstaller: Send + Sync {
    /// Install the agent into `handle`'s process with the default port and
    /// the caller's properties.
    async fn install(&self, handle: &ProcessHandle, options: &AgentActivationOptions) -> Result<()>;
}

/// Locates the agent module on disk for manual loading.
pub trait AgentModuleLocator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the module location cannot be resolved.
    fn locate(&self) -> Result<PathBuf>;
}

/// Secondary attach strategy: attach to a pid and load a module by hand.
#[async_trait]
pub trait ProcessAttacher: Send + Sync {
    /// Open an attachment to the process with the given pid.
    async fn attach(&self, pid: &str) -> Result<Box<dyn AttachedProcess>>;
}

/// An open attachment. Callers must call [`AttachedProcess::detach`] on
/// every path once the attachment was obtained.
#[async_trait]
pub trait AttachedProcess: Send {
    /// Load the agent module with the composed option string.
    async fn load_agent(&mut self, module: &Path, options: &str) -> Result<()>;
    /// Release the attachment.
    async fn detach(&mut self) -> Result<()>;
}

// ── Control Channel Port ──────────────────────────────────────────────────────

/// The attached agent's live control interface.
///
/// Every call is one round trip; results are the agent's own text.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// List every installed rule.
    async fn list_rules(&self) -> Result<String>;
    /// Remove every installed rule.
    async fn delete_all_rules(&self) -> Result<String>;
    /// Load (add or replace) the rules in the given script files.
    async fn add_rules_from_files(&self, paths: &[&Path]) -> Result<String>;
    /// Unload the rules named in the given script files.
    async fn delete_rules_from_files(&self, paths: &[&Path]) -> Result<String>;
    /// Report the agent version.
    async fn version(&self) -> Result<String>;
    /// Close the agent's control listener.
    async fn close_listener(&self) -> Result<()>;
}

// ── Staging Port ──────────────────────────────────────────────────────────────

/// Writes rule text where the agent can read it.
pub trait RuleStager: Send + Sync {
    /// Create a uniquely named file holding `text` verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn stage(&self, text: &str) -> Result<StagedRuleFile>;

    /// Delete a staged file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn release(&self, file: StagedRuleFile) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program to completion and capture its output.
    ///
    /// Implementations bound the run with their own timeout and must kill
    /// the child when it expires.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
}

//! Agent lifecycle controller: activate, terminate, and rule operations.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//!
//! Attachment state is never stored here. Every operation asks the probe
//! first and either proceeds (agent present) or answers with guidance
//! (agent absent). `activate` is the only operation that runs while detached.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::application::ports::{
    AgentModuleLocator, AgentProbe, ControlChannel, PrimaryInstaller, ProcessAttacher, RuleStager,
};
use crate::application::services::installer::AgentInstaller;
use crate::application::services::rule_repository::RuleRepository;
use crate::domain::process::{self, AgentStatus};
use crate::domain::{AgentActivationOptions, ControlError, ControlReply};

// ── Lifecycle flags ───────────────────────────────────────────────────────────

/// Process-wide "agent initialised" state owned by the controller.
///
/// The probe stays the only authority on attachment; no operation branches
/// on `loaded`. It exists so a re-activation after the listener vanished
/// starts from a clean slate (the stale version is dropped) and so
/// [`AgentLifecycleController::status`] can report what was activated.
/// Reset on terminate.
#[derive(Debug, Default)]
pub struct LifecycleFlags {
    loaded: AtomicBool,
    version: Mutex<Option<String>>,
}

impl LifecycleFlags {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn version(&self) -> Option<String> {
        self.version_slot().clone()
    }

    fn mark_loaded(&self, version: Option<String>) {
        *self.version_slot() = version;
        self.loaded.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.loaded.store(false, Ordering::SeqCst);
        *self.version_slot() = None;
    }

    /// Poisoning only means another request panicked mid-update; the slot
    /// holds a plain `Option` so the data is still usable.
    fn version_slot(&self) -> MutexGuard<'_, Option<String>> {
        match self.version.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("lifecycle flag mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// The ports a controller is assembled from.
pub struct ControllerPorts {
    pub probe: Arc<dyn AgentProbe>,
    pub primary: Arc<dyn PrimaryInstaller>,
    pub locator: Arc<dyn AgentModuleLocator>,
    pub attacher: Arc<dyn ProcessAttacher>,
    pub channel: Arc<dyn ControlChannel>,
    pub stager: Arc<dyn RuleStager>,
}

/// Public face of the control plane. Safe to share across request handlers;
/// concurrent rule mutations are not serialised here.
pub struct AgentLifecycleController {
    probe: Arc<dyn AgentProbe>,
    installer: AgentInstaller,
    rules: RuleRepository,
    channel: Arc<dyn ControlChannel>,
    flags: LifecycleFlags,
}

impl AgentLifecycleController {
    #[must_use]
    pub fn new(ports: ControllerPorts) -> Self {
        let ControllerPorts {
            probe,
            primary,
            locator,
            attacher,
            channel,
            stager,
        } = ports;
        Self {
            installer: AgentInstaller::new(probe.clone(), primary, locator, attacher),
            rules: RuleRepository::new(channel.clone(), stager),
            probe,
            channel,
            flags: LifecycleFlags::default(),
        }
    }

    #[must_use]
    pub fn flags(&self) -> &LifecycleFlags {
        &self.flags
    }

    async fn current_status(&self) -> AgentStatus {
        self.probe.is_attached(&process::current()).await
    }

    /// Attach the agent to this process.
    ///
    /// # Errors
    ///
    /// Returns an error only when every attach strategy failed or the
    /// environment cannot be resolved.
    pub async fn activate(
        &self,
        options: &AgentActivationOptions,
    ) -> Result<ControlReply, ControlError> {
        let status = self.current_status().await;
        if status.attached {
            return Ok(ControlReply::AlreadyActive(status.handle));
        }
        if self.flags.is_loaded() {
            warn!(
                pid = %status.handle,
                "agent was marked loaded but its listener is gone; resetting lifecycle flags"
            );
            self.flags.reset();
        }

        let status = self.installer.activate(&status.handle, options).await?;
        let version = match self.channel.version().await {
            Ok(v) => Some(v.trim().to_string()),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "could not read agent version after activation");
                None
            }
        };
        self.flags.mark_loaded(version);
        info!(pid = %status.handle, properties = ?options.properties, "agent activated");
        Ok(ControlReply::Activated(status.handle))
    }

    /// Tear the agent down: delete its rules, close its listener, and reset
    /// the lifecycle flags.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Channel`] if the listener cannot be closed or
    /// is still reachable afterwards; the flags are left untouched then.
    /// Rule deletion failures are logged and ignored.
    pub async fn terminate(&self) -> Result<ControlReply, ControlError> {
        info!("terminating agent listener");
        let status = self.current_status().await;
        if !status.attached {
            return Ok(ControlReply::NoActiveAgent(status.handle));
        }

        // Rules outlive the listener; a reactivated agent could not see them.
        if let Err(e) = self.rules.delete_all().await {
            warn!(error = %format!("{e:#}"), "ignoring error encountered while deleting all rules");
        }

        warn!(pid = %status.handle, "terminating agent listener interface");
        self.channel
            .close_listener()
            .await
            .map_err(ControlError::Channel)?;
        if self.current_status().await.attached {
            return Err(ControlError::Channel(anyhow::anyhow!(
                "agent listener for pid {} is still accepting connections after TERMINATE",
                status.handle
            )));
        }
        self.flags.reset();
        info!(
            loaded = self.flags.is_loaded(),
            version = ?self.flags.version(),
            "agent lifecycle flags after termination"
        );
        Ok(ControlReply::Terminated(status.handle))
    }

    /// List every rule installed in the agent.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Channel`] if the agent cannot be reached.
    pub async fn list_all_rules(&self) -> Result<ControlReply, ControlError> {
        if let Some(guidance) = self.guidance_if_detached().await {
            return Ok(guidance);
        }
        info!("listing all rules already installed");
        self.rules.list_all().await.map(ControlReply::Output)
    }

    /// Delete every rule installed in the agent.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Channel`] if the agent cannot be reached.
    pub async fn delete_all_rules(&self) -> Result<ControlReply, ControlError> {
        if let Some(guidance) = self.guidance_if_detached().await {
            return Ok(guidance);
        }
        info!("deleting all rules");
        self.rules.delete_all().await.map(ControlReply::Output)
    }

    /// Add or replace the rules in `rule_text`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Staging`] or [`ControlError::Channel`].
    pub async fn add_rules(&self, rule_text: &str) -> Result<ControlReply, ControlError> {
        if let Some(guidance) = self.guidance_if_detached().await {
            return Ok(guidance);
        }
        self.rules
            .add_or_replace(rule_text)
            .await
            .map(ControlReply::Submission)
    }

    /// Delete the rules named in `rule_names`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Staging`] or [`ControlError::Channel`].
    pub async fn delete_rules(&self, rule_names: &str) -> Result<ControlReply, ControlError> {
        if let Some(guidance) = self.guidance_if_detached().await {
            return Ok(guidance);
        }
        self.rules
            .delete_by_name(rule_names)
            .await
            .map(ControlReply::Output)
    }

    /// Live attachment state plus the agent version seen at activation.
    pub async fn status(&self) -> ControlReply {
        let status = self.current_status().await;
        let version = if status.attached {
            self.flags.version()
        } else {
            None
        };
        ControlReply::Status { status, version }
    }

    async fn guidance_if_detached(&self) -> Option<ControlReply> {
        let status = self.current_status().await;
        (!status.attached).then(|| ControlReply::NotActivated(status.handle))
    }
}

//! Agent installation: primary self-attach with a manual module-load fallback.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::{AgentModuleLocator, AgentProbe, PrimaryInstaller, ProcessAttacher};
use crate::domain::{
    AgentActivationOptions, AgentStatus, ControlError, ProcessHandle, compose_agent_options,
};

/// Attaches the agent to a process, falling back to loading the module by
/// hand when the agent's own installer cannot attach.
pub struct AgentInstaller {
    probe: Arc<dyn AgentProbe>,
    primary: Arc<dyn PrimaryInstaller>,
    locator: Arc<dyn AgentModuleLocator>,
    attacher: Arc<dyn ProcessAttacher>,
}

impl AgentInstaller {
    #[must_use]
    pub fn new(
        probe: Arc<dyn AgentProbe>,
        primary: Arc<dyn PrimaryInstaller>,
        locator: Arc<dyn AgentModuleLocator>,
        attacher: Arc<dyn ProcessAttacher>,
    ) -> Self {
        Self {
            probe,
            primary,
            locator,
            attacher,
        }
    }

    /// Attach the agent to `handle`'s process.
    ///
    /// A no-op when the probe already sees an agent. The probe check is
    /// advisory: two concurrent callers may both get past it, and the attach
    /// mechanism itself is relied upon to reject the duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Environment`] if the agent module cannot be
    /// located, or [`ControlError::Attach`] if the fallback strategy fails.
    /// A primary-strategy failure alone is never returned.
    pub async fn activate(
        &self,
        handle: &ProcessHandle,
        options: &AgentActivationOptions,
    ) -> Result<AgentStatus, ControlError> {
        let status = self.probe.is_attached(handle).await;
        if status.attached {
            return Ok(status);
        }

        match self.primary.install(handle, options).await {
            Ok(()) => info!(pid = %handle, "agent installed with default mechanism"),
            Err(e) => {
                warn!(
                    pid = %handle,
                    error = %format!("{e:#}"),
                    "falling back to manually loading the agent module as the default mechanism could not attach"
                );
                self.install_from_module(handle, options).await?;
            }
        }
        Ok(AgentStatus::attached(handle.clone()))
    }

    async fn install_from_module(
        &self,
        handle: &ProcessHandle,
        options: &AgentActivationOptions,
    ) -> Result<(), ControlError> {
        let attach_err = |source| ControlError::Attach {
            pid: handle.pid().to_string(),
            source,
        };

        let module = self.locator.locate().map_err(ControlError::Environment)?;
        let agent_options = compose_agent_options(options, &module);

        let mut session = self.attacher.attach(handle.pid()).await.map_err(attach_err)?;
        info!(pid = %handle, options = %agent_options, "loading agent module");
        let loaded = session.load_agent(&module, &agent_options).await;
        let detached = session.detach().await;

        loaded.map_err(attach_err)?;
        detached.map_err(attach_err)?;
        Ok(())
    }
}

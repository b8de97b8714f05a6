//! The rule set held by the attached agent.
//!
//! Nothing is cached here: every read goes back to the agent's control
//! channel. Mutations go through a staged file that is released before the
//! call returns, whatever the submission outcome. If the request future is
//! dropped or unwinds mid-submission, the staged file is deleted on drop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::ports::{ControlChannel, RuleStager, StagedRuleFile};
use crate::domain::{ControlError, SubmissionOutcome};

pub struct RuleRepository {
    channel: Arc<dyn ControlChannel>,
    stager: Arc<dyn RuleStager>,
}

impl RuleRepository {
    #[must_use]
    pub fn new(channel: Arc<dyn ControlChannel>, stager: Arc<dyn RuleStager>) -> Self {
        Self { channel, stager }
    }

    /// Fetch the agent's full rule listing.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Channel`] if the agent cannot be reached.
    pub async fn list_all(&self) -> Result<String, ControlError> {
        self.channel.list_rules().await.map_err(ControlError::Channel)
    }

    /// Remove every installed rule.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Channel`] if the agent cannot be reached.
    pub async fn delete_all(&self) -> Result<String, ControlError> {
        self.channel
            .delete_all_rules()
            .await
            .map_err(ControlError::Channel)
    }

    /// Load `rule_text`, replacing rules with the same names.
    ///
    /// The agent may accept a script it then fails to parse without
    /// reporting an error, so the listing is fetched again afterwards and
    /// inspected for the parse-exception marker.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Staging`] if the text cannot be staged, or
    /// [`ControlError::Channel`] if submission or the follow-up listing fails.
    pub async fn add_or_replace(&self, rule_text: &str) -> Result<SubmissionOutcome, ControlError> {
        let staged = self.stage(rule_text)?;
        info!(path = %staged.path().display(), "adding rules from file");
        debug!("rules to be added:\n{rule_text}");

        let submitted = self
            .channel
            .add_rules_from_files(&[staged.path()])
            .await;
        self.release(staged);

        let raw_result = submitted.map_err(ControlError::Channel)?;
        let listing = self.list_all().await?;
        Ok(SubmissionOutcome::from_listing(raw_result, listing))
    }

    /// Unload the rules named in `rule_names` (one `RULE <name>` per line).
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Staging`] if the names cannot be staged, or
    /// [`ControlError::Channel`] if the agent rejects the request.
    pub async fn delete_by_name(&self, rule_names: &str) -> Result<String, ControlError> {
        let staged = self.stage(rule_names)?;
        info!(path = %staged.path().display(), "deleting rules from file");
        debug!("rules to be deleted:\n{rule_names}");

        let result = self
            .channel
            .delete_rules_from_files(&[staged.path()])
            .await;
        self.release(staged);

        result.map_err(ControlError::Channel)
    }

    fn stage(&self, text: &str) -> Result<StagedRuleFile, ControlError> {
        let staged = self.stager.stage(text).map_err(ControlError::Staging)?;
        info!(path = %staged.path().display(), "rules are written to staging file");
        Ok(staged)
    }

    fn release(&self, staged: StagedRuleFile) {
        let path = staged.path().to_path_buf();
        info!(path = %path.display(), "removing the rule file");
        if let Err(e) = self.stager.release(staged) {
            warn!(path = %path.display(), error = %format!("{e:#}"), "failed to remove staged rule file");
        }
    }
}

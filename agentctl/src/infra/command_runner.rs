//! Runs the installer and attach tools as child processes.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use crate::application::ports::CommandRunner;

/// Production `CommandRunner` bounding every tool run by one timeout.
///
/// The child is spawned with `kill_on_drop`, so when the timeout drops the
/// pending `wait_with_output` future the tool is killed with it.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        if let Ok(output) = tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            output.with_context(|| format!("waiting for {program}"))
        } else {
            warn!(program, args = ?args, "tool did not finish in time, killed");
            anyhow::bail!("{program} timed out after {:?}", self.timeout)
        }
    }
}

//! Identity of the process whose agent is being managed.

use std::fmt;

/// The process the agent lives in. Recomputed on every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: String,
}

impl ProcessHandle {
    #[must_use]
    pub fn new(pid: impl Into<String>) -> Self {
        Self { pid: pid.into() }
    }

    #[must_use]
    pub fn pid(&self) -> &str {
        &self.pid
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pid)
    }
}

/// Resolve the identity of the running process.
#[must_use]
pub fn current() -> ProcessHandle {
    ProcessHandle::new(std::process::id().to_string())
}

/// Snapshot of whether an agent is resident in a process.
///
/// Never cached: every operation asks the probe again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatus {
    pub handle: ProcessHandle,
    pub attached: bool,
}

impl AgentStatus {
    #[must_use]
    pub fn attached(handle: ProcessHandle) -> Self {
        Self {
            handle,
            attached: true,
        }
    }

    #[must_use]
    pub fn detached(handle: ProcessHandle) -> Self {
        Self {
            handle,
            attached: false,
        }
    }
}

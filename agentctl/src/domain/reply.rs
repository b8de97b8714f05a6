//! Replies returned by the lifecycle controller.
//!
//! Rendering to text lives in the `Display` impls so the HTTP layer can
//! return them verbatim as `text/plain`.

use std::fmt;

use crate::domain::process::{AgentStatus, ProcessHandle};

/// Marker the agent embeds in its rule listing when a loaded script failed
/// to parse. The agent's load call does not reliably report this itself.
pub const PARSE_EXCEPTION_MARKER: &str = "org.jboss.byteman.rule.exception";

/// Result of submitting rule text to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Text returned by the agent for the load request.
    pub raw_result: String,
    /// Full rule listing, present only when it carries the parse marker.
    pub full_listing_if_suspect: Option<String>,
}

impl SubmissionOutcome {
    /// Build an outcome from the load result and the listing fetched after it.
    #[must_use]
    pub fn from_listing(raw_result: String, listing: String) -> Self {
        let full_listing_if_suspect = listing.contains(PARSE_EXCEPTION_MARKER).then_some(listing);
        Self {
            raw_result,
            full_listing_if_suspect,
        }
    }

    #[must_use]
    pub fn is_suspect(&self) -> bool {
        self.full_listing_if_suspect.is_some()
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.full_listing_if_suspect {
            None => f.write_str(&self.raw_result),
            Some(listing) => write!(
                f,
                "While trying to inject following rules:\n\n[\n{}]\n\n\
                 I encountered following Exception: \n\n{listing}",
                self.raw_result
            ),
        }
    }
}

/// Successful outcome of a controller operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    Activated(ProcessHandle),
    AlreadyActive(ProcessHandle),
    Terminated(ProcessHandle),
    NoActiveAgent(ProcessHandle),
    /// Guidance for rule operations issued while no agent is attached.
    NotActivated(ProcessHandle),
    /// Raw text from the agent's control channel.
    Output(String),
    Submission(SubmissionOutcome),
    /// Live attachment state and the version recorded at activation.
    Status {
        status: AgentStatus,
        version: Option<String>,
    },
}

impl ControlReply {
    /// `true` for the "activate first" guidance reply.
    #[must_use]
    pub fn is_not_activated(&self) -> bool {
        matches!(self, Self::NotActivated(_))
    }
}

impl fmt::Display for ControlReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activated(h) => {
                write!(f, "activated instrumentation agent in current process with pid: {h}")
            }
            Self::AlreadyActive(h) => write!(
                f,
                "instrumentation agent is already activated in current process with pid: {h}"
            ),
            Self::Terminated(h) => write!(
                f,
                "terminated instrumentation agent from current process with pid: {h}"
            ),
            Self::NoActiveAgent(h) => write!(
                f,
                "No active instrumentation agent listener found for current process with pid: {h}"
            ),
            Self::NotActivated(h) => write!(
                f,
                "Please run activateAgent API first. instrumentation agent is not activated \
                 in current process with pid: {h}"
            ),
            Self::Output(text) => f.write_str(text),
            Self::Submission(outcome) => outcome.fmt(f),
            Self::Status { status, version } => {
                let state = if status.attached { "attached" } else { "detached" };
                write!(f, "agent {state} in current process with pid: {}", status.handle)?;
                if let Some(version) = version {
                    write!(f, " (version {version})")?;
                }
                Ok(())
            }
        }
    }
}

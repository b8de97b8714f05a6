//! Typed domain error enum.
//!
//! Only failures that abort an operation live here. Guidance replies
//! ("activate first", "already active") are successful [`ControlReply`]s.
//! Each variant wraps the `anyhow::Error` chain produced by the port that
//! failed, so the caller sees the full context.
//!
//! [`ControlReply`]: crate::domain::reply::ControlReply

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// The process cannot describe itself (e.g. agent module not on disk).
    #[error("environment error: {0:#}")]
    Environment(anyhow::Error),

    /// Both attach strategies failed.
    #[error("failed to attach agent to pid {pid}: {source:#}")]
    Attach {
        pid: String,
        #[source]
        source: anyhow::Error,
    },

    /// Rule text could not be written to the staging area.
    #[error("failed to stage rules: {0:#}")]
    Staging(anyhow::Error),

    /// The agent's control channel failed or timed out.
    #[error("agent control channel error: {0:#}")]
    Channel(anyhow::Error),
}

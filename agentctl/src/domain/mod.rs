//! Domain layer: process identity, activation options, rule replies and errors.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `crate::http`, `tokio`, `std::fs`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod activation;
pub mod config;
pub mod error;
pub mod process;
pub mod reply;

pub use activation::{AgentActivationOptions, compose_agent_options};
pub use config::AgentctlConfig;
pub use error::ControlError;
pub use process::{AgentStatus, ProcessHandle};
pub use reply::{ControlReply, PARSE_EXCEPTION_MARKER, SubmissionOutcome};

//! Listener-based agent probe.
//!
//! An attached agent keeps its control listener open; terminate closes it.
//! A successful TCP connect is therefore the live "agent resident" signal.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use crate::application::ports::AgentProbe;
use crate::domain::{AgentStatus, ProcessHandle};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

pub struct ListenerProbe {
    addr: String,
}

impl ListenerProbe {
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
        }
    }
}

#[async_trait]
impl AgentProbe for ListenerProbe {
    async fn is_attached(&self, handle: &ProcessHandle) -> AgentStatus {
        let attached = matches!(
            tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        );
        debug!(pid = %handle, addr = %self.addr, attached, "probed agent listener");
        AgentStatus {
            handle: handle.clone(),
            attached,
        }
    }
}

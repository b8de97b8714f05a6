//! TCP client for the agent's control listener.
//!
//! Line-oriented protocol, one connection per command. The client writes a
//! command line (plus script blocks for `LOAD` / `DELETE`) and the agent
//! answers with free text terminated by a line reading `OK`. A reply whose
//! first line is `ERROR` is a rejection.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::application::ports::ControlChannel;

const ACK: &str = "OK";
const REJECTED: &str = "ERROR";

pub struct TcpControlChannel {
    addr: String,
    timeout: Duration,
}

impl TcpControlChannel {
    #[must_use]
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            timeout,
        }
    }

    async fn round_trip(&self, request: &str) -> Result<String> {
        let command = request.lines().next().unwrap_or_default();
        debug!(addr = %self.addr, command, "sending agent command");
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .with_context(|| {
                format!(
                    "agent at {} did not answer {command} within {}s",
                    self.addr,
                    self.timeout.as_secs()
                )
            })?
    }

    async fn exchange(&self, request: &str) -> Result<String> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .with_context(|| format!("connecting to agent listener at {}", self.addr))?;
        let (read, mut write) = stream.into_split();
        write
            .write_all(request.as_bytes())
            .await
            .context("writing agent command")?;
        write.flush().await.context("flushing agent command")?;

        let mut lines = BufReader::new(read).lines();
        let mut response = String::new();
        while let Some(line) = lines.next_line().await.context("reading agent reply")? {
            if line.trim_end() == ACK {
                return into_result(response);
            }
            response.push_str(&line);
            response.push('\n');
        }
        anyhow::bail!("agent closed the connection before acknowledging the command")
    }

    async fn submit_scripts(&self, verb: &str, paths: &[&Path]) -> Result<String> {
        let mut scripts = Vec::with_capacity(paths.len());
        for path in paths {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading rule script {}", path.display()))?;
            scripts.push((path.display().to_string(), text));
        }
        self.round_trip(&script_request(verb, &scripts)).await
    }
}

/// The agent prefixes a reply with an `ERROR` line when it rejects the
/// command, but still closes it with `OK`.
fn into_result(response: String) -> Result<String> {
    match response.strip_prefix(REJECTED) {
        Some(rest) if rest.is_empty() || rest.starts_with('\n') => {
            anyhow::bail!("agent rejected the command: {}", rest.trim())
        }
        _ => Ok(response),
    }
}

/// Build a `LOAD` / `DELETE` request carrying the given `(name, text)`
/// scripts.
#[must_use]
pub fn script_request(verb: &str, scripts: &[(String, String)]) -> String {
    let mut request = format!("{verb}\n");
    for (name, text) in scripts {
        request.push_str("SCRIPT ");
        request.push_str(name);
        request.push('\n');
        request.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            request.push('\n');
        }
        request.push_str("ENDSCRIPT\n");
    }
    request.push_str("END");
    request.push_str(verb);
    request.push('\n');
    request
}

#[async_trait]
impl ControlChannel for TcpControlChannel {
    async fn list_rules(&self) -> Result<String> {
        self.round_trip("LIST\n").await
    }

    async fn delete_all_rules(&self) -> Result<String> {
        self.round_trip("DELETEALL\n").await
    }

    async fn add_rules_from_files(&self, paths: &[&Path]) -> Result<String> {
        self.submit_scripts("LOAD", paths).await
    }

    async fn delete_rules_from_files(&self, paths: &[&Path]) -> Result<String> {
        self.submit_scripts("DELETE", paths).await
    }

    async fn version(&self) -> Result<String> {
        self.round_trip("VERSION\n").await
    }

    async fn close_listener(&self) -> Result<()> {
        self.round_trip("TERMINATE\n").await.map(|_| ())
    }
}

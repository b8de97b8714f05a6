//! agentctl server entry point.
//!
//! Initialises tracing, loads configuration from `AGENTCTL_*` environment
//! variables (with command-line overrides), wires the production ports, and
//! serves the control endpoints over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agentctl::application::AgentLifecycleController;
use agentctl::cli::Cli;
use agentctl::domain::process;
use agentctl::http::{AppState, router};
use agentctl::infra;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialise tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load configuration.
    let cli = Cli::parse();
    let config = cli.apply(infra::config::load()?);
    if cli.print_config {
        println!("{config:#?}");
        return Ok(());
    }

    tracing::info!(
        pid = %process::current(),
        listen_addr = %config.listen_addr,
        agent_listener = %format!("{}:{}", config.agent_host, config.agent_port),
        installer = %config.installer_program,
        attach = %config.attach_program,
        "agentctl starting",
    );

    // 3. Wire the controller.
    let controller = AgentLifecycleController::new(infra::production_ports(&config));
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState { controller, config });

    // 4. Bind and serve.
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!("agent control server ready at http://{listen_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("agentctl shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

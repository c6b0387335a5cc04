//! Consilium gateway binary.

use anyhow::Context;
use clap::Parser;
use consilium_config::{LoadOptions, load_config};
use consilium_server::{build_state, router};
use log::info;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Conversational health consultation gateway.
#[derive(Debug, Parser)]
#[command(name = "consilium", version)]
struct Cli {
    /// Path to the config file (defaults to ~/.consilium/consilium.json5).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&LoadOptions {
        config_path: cli.config,
        ignore_env: false,
    })?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let state = build_state(config)?;
    let app = router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind to {bind}"))?;
    info!("consilium listening (addr={bind})");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failure")?;
    Ok(())
}

/// Resolve when the process receives an interrupt.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

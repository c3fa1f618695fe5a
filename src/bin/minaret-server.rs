// ABOUTME: Server binary: loads configuration, wires resources, serves the HTTP API
// ABOUTME: Identity resolution happens upstream; this process trusts the x-user-id header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Minaret Server Binary
//!
//! Starts the Islamic guidance agent backend: SQLite-backed conversation
//! store, LLM planner/synthesizer, and the domain tool registry, served
//! over HTTP.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use minaret_server::config::ServerConfig;
use minaret_server::logging::LoggingConfig;
use minaret_server::resources::ServerResources;
use minaret_server::routes;

#[derive(Parser)]
#[command(name = "minaret-server")]
#[command(about = "Minaret - Islamic guidance agent backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!("Starting Minaret agent backend");
    info!("Database URL: {}", config.database_url);
    info!("LLM model: {}", config.llm.model);

    let resources = Arc::new(ServerResources::from_config(&config).await?);
    info!(
        "Tool registry ready: {}",
        resources.registry.tool_names().join(", ")
    );

    let app = routes::router(Arc::clone(&resources));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on ctrl-c so axum can drain in-flight requests
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}

// ABOUTME: Server binary for the homedash dashboard backend
// ABOUTME: Loads configuration, starts the health monitor and serves the HTTP API until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Homedash Server Binary
//!
//! Starts the aggregation runtime: shared cache, rate limiter, health
//! monitor and the axum HTTP surface. Ctrl-C or SIGTERM stops the monitor,
//! closes every SSE stream, then drains in-flight requests.

use anyhow::{Context, Result};
use clap::Parser;
use homedash::{
    config::ServerConfig, logging, monitor::MonitorHandle, resources::ServerResources,
    routes::build_router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "homedash-server")]
#[command(about = "Homedash - unified dashboard backend for self-hosted services")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// YAML file listing the service instances
    #[arg(long)]
    services_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(services_file) = args.services_file {
        config.services_file = Some(services_file);
    }

    logging::init_from_env()?;
    info!("{}", config.summary());

    let resources = Arc::new(ServerResources::from_config(config).await?);
    let monitor = resources.monitor.start();
    let app = build_router(Arc::clone(&resources));

    let bind_address = resources.config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "HTTP server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(monitor))
    .await
    .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM after stopping the monitor and its streams
async fn shutdown_signal(monitor: MonitorHandle) {
    wait_for_signal().await;
    info!("Shutdown signal received");
    monitor.shutdown().await;
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

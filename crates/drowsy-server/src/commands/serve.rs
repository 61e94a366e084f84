//! Serve command - run the HTTP endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::Args;
use drowsy_server::config::{AppConfig, DEFAULT_BIND};
use drowsy_server::{build_router, DEFAULT_BODY_LIMIT};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{load_pipeline, ExitCode, PipelineArgs};

/// Arguments for the serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Maximum request body size in bytes
    #[arg(long, value_name = "BYTES")]
    pub body_limit: Option<usize>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Run the serve command.
pub fn run(args: &ServeArgs, config: &AppConfig) -> ExitCode {
    let config = args.pipeline.layered(config);

    let addr = match bind_addr(args, &config) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::Fatal;
        }
    };
    let body_limit = args
        .body_limit
        .or(config.server.body_limit_bytes)
        .unwrap_or(DEFAULT_BODY_LIMIT);

    let pipeline = match load_pipeline(&config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::Fatal;
        }
    };

    let app = build_router(pipeline, body_limit);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: Failed to start async runtime: {e}");
            return ExitCode::Fatal;
        }
    };

    match runtime.block_on(serve(addr, app)) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Fatal
        }
    }
}

/// CLI address, then config, then the default.
fn bind_addr(args: &ServeArgs, config: &AppConfig) -> Result<SocketAddr> {
    if let Some(addr) = args.bind {
        return Ok(addr);
    }
    let bind = config.server.bind.as_deref().unwrap_or(DEFAULT_BIND);
    bind.parse()
        .with_context(|| format!("Invalid bind address '{bind}'"))
}

async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

//! Authenticating API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ pipeline::Pipeline
//!                                         │
//!                                         ├─ access_log      (X-Request-ID, entry/exit logs)
//!                                         ├─ authentication  (──▶ identity service RPC)
//!                                         ├─ body_rewrite    (inject operatorId into JSON)
//!                                         ▼
//!                                      proxy::UpstreamProxy ──▶ Backend
//!
//!     Any failure ──▶ http::response (JSON error envelope)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use auth_gateway::config::load_config;
use auth_gateway::lifecycle::{shutdown_signal, Shutdown};
use auth_gateway::observability::{logging, metrics};
use auth_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "auth-gateway", version, about = "Authenticating API gateway")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("auth-gateway: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        auth_service = %config.auth.service_url,
        auth_enabled = config.auth.enabled,
        "auth-gateway starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    shutdown_signal().await;
    shutdown.trigger();

    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

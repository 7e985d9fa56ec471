//! ScopeBlind edge gateway.
//!
//! Reverse proxy that optionally verifies a caller-supplied proof token
//! against a remote verifier before forwarding to the origin.
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                     GATEWAY                       │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌──────────────┐  │
//!   ─────────────────┼─▶│classifier│──▶│ verifier │──▶│    policy    │  │──▶ Verifier
//!                    │  └────┬─────┘   │  client  │   │    engine    │  │
//!                    │       │ skip    └──────────┘   └──────┬───────┘  │
//!                    │       ▼                               ▼          │
//!   Client Response  │  ┌─────────────────────────┐   ┌────────────┐   │
//!   ◀────────────────┼──│        forwarder        │◀──│ telemetry  │   │──▶ Origin
//!                    │  └─────────────────────────┘   └────────────┘   │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use scopeblind_gateway::config::load_config;
use scopeblind_gateway::observability::{logging, metrics};
use scopeblind_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "scopeblind-gateway")]
#[command(about = "Edge gateway that verifies proof tokens before forwarding to an origin", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Environment overrides apply on top.
    #[arg(short, long, env = "SCOPEBLIND_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("scopeblind-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = %config.gateway.mode,
        fallback = %config.gateway.fallback,
        protected_methods = ?config.gateway.protected_methods,
        verifier_timeout_ms = config.timeouts.verifier_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

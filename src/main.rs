//! Serve harness demo binary.
//!
//! Wires a small axum router through the graceful-shutdown coordinator:
//! loads TOML configuration, initializes tracing, then serves until a
//! termination signal drains the listener or a fatal error surfaces.

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tower_http::trace::TraceLayer;

use graceful_serve::config::{load_config, ServeConfig};
use graceful_serve::observability::logging;
use graceful_serve::{listen_and_serve_with_timeouts, TracingDiagnostics};

#[derive(Parser)]
#[command(name = "graceful-serve")]
#[command(about = "HTTP server with signal-driven graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServeConfig::default(),
    };
    let port = cli.port.unwrap_or(config.listener.port);

    logging::init(&config.observability.log_level);

    tracing::info!(
        port,
        idle_secs = config.timeouts.idle_secs,
        read_secs = config.timeouts.read_secs,
        write_secs = config.timeouts.write_secs,
        shutdown_secs = config.timeouts.shutdown_secs,
        "configuration loaded"
    );

    let app = Router::new()
        .route("/", get(index))
        .layer(TraceLayer::new_for_http());

    listen_and_serve_with_timeouts(
        port,
        app,
        Arc::new(TracingDiagnostics),
        config.timeouts.into(),
    )
    .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "graceful-serve",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

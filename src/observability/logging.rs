//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Adapt the Diagnostics capability onto tracing events

use std::collections::HashMap;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::observability::Diagnostics;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; `fallback_level` applies when it is unset.
pub fn init(fallback_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("graceful_serve={fallback_level}"))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Diagnostics implementation backed by the tracing stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn on_start_up(&self) {
        tracing::info!("server starting");
    }

    fn on_shutdown(&self) {
        tracing::info!("server stopped");
    }

    fn info(&self, message: &str, attributes: HashMap<String, String>) {
        // tracing fields must be statically named, so the map is rendered
        // into a single key:value field.
        let mut rendered: Vec<String> = attributes
            .into_iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        rendered.sort();
        tracing::info!(attributes = %rendered.join(","), "{message}");
    }

    fn write_diagnostic(&self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        tracing::error!(target: "graceful_serve::net", "{}", text.trim_end());
    }
}

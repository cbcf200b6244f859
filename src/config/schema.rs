//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the serve harness.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the serve harness binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServeConfig {
    /// Listener configuration (port).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port to listen on. The listener binds all interfaces.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Timeout configuration as it appears in a config file.
///
/// A zero value leaves the corresponding limit to the transport's own
/// default behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Keep-alive idle limit in seconds.
    pub idle_secs: u64,

    /// Request read limit in seconds.
    pub read_secs: u64,

    /// Response write limit in seconds.
    pub write_secs: u64,

    /// Graceful shutdown deadline in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle_secs: 60,
            read_secs: 10,
            write_secs: 30,
            shutdown_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Timeout policy handed to the serve harness.
///
/// Immutable once passed to the coordinator. A zero duration means "use the
/// underlying transport's own default behavior"; for `shutdown` that means
/// the drain wait is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Keep-alive idle limit for accepted connections.
    pub idle: Duration,

    /// Limit on reading a request from the wire.
    pub read: Duration,

    /// Limit on producing and writing a response.
    pub write: Duration,

    /// Maximum time a graceful shutdown may take before it is treated as
    /// failed.
    pub shutdown: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(60),
            read: Duration::from_secs(10),
            write: Duration::from_secs(30),
            shutdown: Duration::from_secs(5),
        }
    }
}

impl Timeouts {
    /// Policy that leaves idle/read/write limits to the transport and keeps
    /// only the 5s shutdown deadline.
    pub fn transport_defaults() -> Self {
        Self {
            idle: Duration::ZERO,
            read: Duration::ZERO,
            write: Duration::ZERO,
            shutdown: Duration::from_secs(5),
        }
    }
}

impl From<TimeoutConfig> for Timeouts {
    fn from(config: TimeoutConfig) -> Self {
        Self {
            idle: Duration::from_secs(config.idle_secs),
            read: Duration::from_secs(config.read_secs),
            write: Duration::from_secs(config.write_secs),
            shutdown: Duration::from_secs(config.shutdown_secs),
        }
    }
}

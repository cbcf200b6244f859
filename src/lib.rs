//! Graceful-shutdown serve harness.
//!
//! Starts a listening HTTP server, waits for either a fatal serve error or
//! an operator termination signal, and on signal drives an orderly,
//! deadline-bounded shutdown before returning to the caller.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                SERVE HARNESS                  │
//!                    │                                               │
//!   axum Router ────▶│  ┌─────────┐   serve    ┌─────────────────┐  │
//!                    │  │   net   │◀───────────│    lifecycle    │  │
//!   Diagnostics ────▶│  │listener │  shutdown  │   coordinator   │  │
//!                    │  └────┬────┘◀───────────└───────┬─────────┘  │
//!                    │       │                          │           │
//!                    │       ▼                          ▼           │
//!                    │  ┌─────────┐              ┌─────────────┐    │
//!                    │  │  conn   │              │signal watch │◀───┼── SIGINT
//!                    │  │ tracker │              │    task     │◀───┼── SIGTERM
//!                    │  └─────────┘              └─────────────┘    │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! The coordinator blocks in `serve` while the signal-watch task races a
//! termination signal against the listener's own fatal exit; exactly one of
//! the two paths resolves each run.

// Core subsystems
pub mod config;
pub mod lifecycle;
pub mod net;

// Cross-cutting concerns
pub mod observability;

pub use config::Timeouts;
pub use lifecycle::{listen_and_serve, listen_and_serve_with_timeouts};
pub use lifecycle::{Coordinator, GracefulServer, ServeError};
pub use net::HttpListener;
pub use observability::{Diagnostics, TracingDiagnostics};

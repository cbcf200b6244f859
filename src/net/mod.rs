//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, per-connection serving)
//!     → connection.rs (lifecycle tracking for draining)
//!     → axum Router supplied by the embedder
//!
//! Connection States:
//!     Accepting → Active → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - The accept loop stops the moment shutdown is requested; serve returns
//!   its closed sentinel without waiting for the drain
//! - Each connection is tracked so the drain wait is event-driven
//! - Connection-level errors go to the diagnostics sink, never fail the run

pub mod connection;
pub mod listener;

pub use connection::ConnectionTracker;
pub use listener::HttpListener;

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Run (shutdown.rs):
//!     Spawn signal watcher → on_start_up → serve (blocks)
//!         serve error      → signal done → return error (fatal exit)
//!         serve Ok sentinel → await shutdown result → on_shutdown → Ok
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM vs done, whichever is delivered first
//!     signal wins → info event → shutdown(deadline) → result slot
//!     done wins   → watcher exits, result slot never written
//! ```
//!
//! # Design Decisions
//! - Exactly one of the fatal and signal-shutdown paths occurs per run
//! - done and the shutdown result are one-shot channels, written at most once
//! - The shutdown deadline bounds the drain, not the whole process

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod shutdown;
pub mod signals;

pub use shutdown::listen_and_serve;
pub use shutdown::listen_and_serve_with_timeouts;
pub use shutdown::Coordinator;
pub use signals::Termination;

/// Contract a network listener satisfies so the coordinator can drive its
/// lifecycle.
#[async_trait]
pub trait GracefulServer: Send + Sync {
    /// Block until the listener is shut down or fails irrecoverably.
    ///
    /// Returns `Ok(())` as the "closed" sentinel when a shutdown was
    /// externally requested, and an error for any other outcome.
    async fn serve(&self) -> Result<(), ServeError>;

    /// Request a graceful stop: refuse new work immediately and wait up to
    /// `deadline` for in-flight work to finish.
    ///
    /// A zero deadline waits unbounded. Returns an error if the work could
    /// not drain before the deadline elapsed.
    async fn shutdown(&self, deadline: Duration) -> Result<(), ServeError>;
}

/// Errors surfaced by the serve harness.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Failed to accept a connection.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// Failed to register the termination signal handlers.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    /// In-flight work did not drain before the shutdown deadline.
    #[error("graceful shutdown did not complete within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    /// The signal watcher exited without reporting a shutdown outcome even
    /// though a shutdown was requested. Not expected to occur.
    #[error("shutdown watcher exited without reporting an outcome")]
    WatcherExited,
}

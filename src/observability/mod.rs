//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! serve harness produces:
//!     → Diagnostics::on_start_up / on_shutdown (lifecycle markers)
//!     → Diagnostics::info (structured events, e.g. the triggering signal)
//!     → Diagnostics::write_diagnostic (raw transport-level error bytes)
//!
//! Consumers:
//!     → TracingDiagnostics (tracing events, the default embedding)
//!     → any embedder-supplied implementation of the trait
//! ```
//!
//! # Design Decisions
//! - The harness never formats or stores logs; it only emits events
//! - Raw diagnostic bytes are passed through untouched, best-effort
//! - Event emission must never fail the run

use std::collections::HashMap;

pub mod logging;

pub use logging::TracingDiagnostics;

/// Contract the embedding application satisfies so the serve harness can
/// report lifecycle events.
pub trait Diagnostics: Send + Sync {
    /// Invoked once, immediately before the harness begins serving.
    fn on_start_up(&self);

    /// Invoked once, only after a fully successful graceful shutdown.
    fn on_shutdown(&self);

    /// Structured event emission. `attributes` is an order-insignificant
    /// string-to-string mapping.
    fn info(&self, message: &str, attributes: HashMap<String, String>);

    /// Sink for raw textual diagnostics produced by the transport layer
    /// itself (e.g. malformed-request logging). Passthrough, no parsing.
    fn write_diagnostic(&self, bytes: &[u8]);
}

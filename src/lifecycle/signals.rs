//! OS signal handling.
//!
//! # Responsibilities
//! - Register interest in the operator termination signals (SIGINT, SIGTERM)
//! - Race an incoming signal against the coordinator's done notification
//! - On signal: emit the info event, request shutdown, report the outcome
//!
//! # Design Decisions
//! - Signal streams are owned by the watch task and released when it exits,
//!   so no subscription outlives a run
//! - The race needs no tie-break: the coordinator discards an unread
//!   shutdown result when it takes the fatal path

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::oneshot;

use crate::lifecycle::{GracefulServer, ServeError};
use crate::observability::Diagnostics;

/// Operator-initiated termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Interrupt => write!(f, "interrupt"),
            Termination::Terminate => write!(f, "terminate"),
        }
    }
}

/// Scoped subscription to the termination signals.
///
/// Dropping this releases the streams; registration happens before the
/// coordinator starts serving so a failure surfaces as a startup error.
pub(crate) struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl TerminationSignals {
    pub(crate) fn register() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for whichever termination signal is delivered first.
    pub(crate) async fn recv(&mut self) -> Termination {
        tokio::select! {
            _ = self.interrupt.recv() => Termination::Interrupt,
            _ = self.terminate.recv() => Termination::Terminate,
        }
    }
}

/// Signal-watch task body.
///
/// Races `termination` against `done`. If `done` wins (or the termination
/// source is exhausted) the task exits without writing the outcome slot: the
/// coordinator has already taken the fatal path and will never read it. If a
/// signal wins, the task emits exactly one info event naming the signal,
/// requests shutdown with the configured deadline, and writes whatever that
/// call returns into the outcome slot.
pub(crate) async fn watch_for_termination<S>(
    termination: impl Future<Output = Option<Termination>> + Send,
    server: Arc<S>,
    diagnostics: Arc<dyn Diagnostics>,
    deadline: Duration,
    mut done: oneshot::Receiver<()>,
    outcome: oneshot::Sender<Result<(), ServeError>>,
) where
    S: GracefulServer + ?Sized,
{
    let signal = tokio::select! {
        _ = &mut done => return,
        received = termination => match received {
            Some(signal) => signal,
            None => return,
        },
    };

    diagnostics.info(
        "shutting down server",
        HashMap::from([("signal".to_string(), signal.to_string())]),
    );

    let _ = outcome.send(server.shutdown(deadline).await);
}

//! Shutdown coordination for the serve harness.
//!
//! # Responsibilities
//! - Own one listener's lifecycle for exactly one run
//! - Sequence the three exits: fatal error, signal-triggered shutdown,
//!   already-done
//! - Guarantee on_start_up precedes serving and on_shutdown only follows a
//!   fully successful drain

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::oneshot;

use crate::config::Timeouts;
use crate::lifecycle::signals::{watch_for_termination, Termination, TerminationSignals};
use crate::lifecycle::{GracefulServer, ServeError};
use crate::net::HttpListener;
use crate::observability::Diagnostics;

/// Serve the router on `0.0.0.0:port` with the default timeout policy,
/// blocking until a fatal error or a completed signal-triggered shutdown.
pub async fn listen_and_serve(
    port: u16,
    app: Router,
    diagnostics: Arc<dyn Diagnostics>,
) -> Result<(), ServeError> {
    listen_and_serve_with_timeouts(port, app, diagnostics, Timeouts::default()).await
}

/// Like [`listen_and_serve`], with an explicit timeout policy.
pub async fn listen_and_serve_with_timeouts(
    port: u16,
    app: Router,
    diagnostics: Arc<dyn Diagnostics>,
    timeouts: Timeouts,
) -> Result<(), ServeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = HttpListener::bind(addr, app, &timeouts, Arc::clone(&diagnostics)).await?;
    Coordinator::new(Arc::new(listener), diagnostics, &timeouts)
        .run()
        .await
}

/// Orchestrator for one serve-until-terminated run.
///
/// Owns exactly one server capability instance; constructed immediately
/// before [`Coordinator::run`] and torn down when it returns. Runs of
/// separate coordinator instances share no state.
pub struct Coordinator<S> {
    server: Arc<S>,
    diagnostics: Arc<dyn Diagnostics>,
    shutdown_deadline: Duration,
}

impl<S> Coordinator<S>
where
    S: GracefulServer + 'static,
{
    /// Build a coordinator around an already-bound server capability.
    ///
    /// The shutdown deadline is copied out of the policy here; the
    /// listener's idle/read/write limits were applied when it was built.
    pub fn new(server: Arc<S>, diagnostics: Arc<dyn Diagnostics>, timeouts: &Timeouts) -> Self {
        Self {
            server,
            diagnostics,
            shutdown_deadline: timeouts.shutdown,
        }
    }

    /// Run until a fatal serve error or a completed signal-triggered
    /// shutdown.
    ///
    /// Returns `Ok(())` only after a fully successful graceful shutdown;
    /// any fatal or shutdown error propagates unwrapped.
    pub async fn run(self) -> Result<(), ServeError> {
        let mut signals = TerminationSignals::register().map_err(ServeError::Signals)?;
        self.run_with_termination(async move { Some(signals.recv().await) })
            .await
    }

    /// Run protocol with an injectable termination source.
    pub(crate) async fn run_with_termination<F>(self, termination: F) -> Result<(), ServeError>
    where
        F: Future<Output = Option<Termination>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let watcher = tokio::spawn(watch_for_termination(
            termination,
            Arc::clone(&self.server),
            Arc::clone(&self.diagnostics),
            self.shutdown_deadline,
            done_rx,
            outcome_tx,
        ));

        self.diagnostics.on_start_up();

        if let Err(err) = self.server.serve().await {
            // Fatal exit: the listener stopped before any shutdown request.
            // Unblock the watcher; its outcome slot is discarded unread.
            tracing::debug!(error = %err, "listener exited fatally");
            let _ = done_tx.send(());
            let _ = watcher.await;
            return Err(err);
        }

        // Closed sentinel: a shutdown is already in flight. Block on its
        // outcome.
        let outcome = outcome_rx.await.unwrap_or(Err(ServeError::WatcherExited));
        let _ = watcher.await;
        outcome?;

        tracing::debug!("graceful shutdown complete");
        self.diagnostics.on_shutdown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;

    struct MockListener {
        serve_failure: Mutex<Option<ServeError>>,
        fail_shutdown: bool,
        closing: Notify,
        shutdown_calls: AtomicUsize,
        seen_deadline: Mutex<Option<Duration>>,
    }

    impl MockListener {
        fn healthy() -> Self {
            Self {
                serve_failure: Mutex::new(None),
                fail_shutdown: false,
                closing: Notify::new(),
                shutdown_calls: AtomicUsize::new(0),
                seen_deadline: Mutex::new(None),
            }
        }

        fn failing(err: ServeError) -> Self {
            Self {
                serve_failure: Mutex::new(Some(err)),
                ..Self::healthy()
            }
        }

        fn stuck() -> Self {
            Self {
                fail_shutdown: true,
                ..Self::healthy()
            }
        }
    }

    #[async_trait]
    impl GracefulServer for MockListener {
        async fn serve(&self) -> Result<(), ServeError> {
            let failure = self.serve_failure.lock().unwrap().take();
            if let Some(err) = failure {
                return Err(err);
            }
            self.closing.notified().await;
            Ok(())
        }

        async fn shutdown(&self, deadline: Duration) -> Result<(), ServeError> {
            self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_deadline.lock().unwrap() = Some(deadline);
            self.closing.notify_one();
            if self.fail_shutdown {
                Err(ServeError::DeadlineExceeded { deadline })
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingDiagnostics {
        events: Mutex<Vec<String>>,
    }

    impl RecordingDiagnostics {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Diagnostics for RecordingDiagnostics {
        fn on_start_up(&self) {
            self.events.lock().unwrap().push("started".to_string());
        }

        fn on_shutdown(&self) {
            self.events.lock().unwrap().push("stopped".to_string());
        }

        fn info(&self, message: &str, attributes: HashMap<String, String>) {
            let mut rendered: Vec<String> = attributes
                .into_iter()
                .map(|(key, value)| format!("{key}:{value}"))
                .collect();
            rendered.sort();
            self.events
                .lock()
                .unwrap()
                .push(format!("{message}: {}", rendered.join(",")));
        }

        fn write_diagnostic(&self, bytes: &[u8]) {
            self.events
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(bytes).into_owned());
        }
    }

    fn coordinator(
        server: Arc<MockListener>,
        diagnostics: Arc<RecordingDiagnostics>,
        timeouts: &Timeouts,
    ) -> Coordinator<MockListener> {
        Coordinator::new(server, diagnostics, timeouts)
    }

    #[tokio::test]
    async fn fatal_bind_error_returns_unchanged_with_no_events() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let server = Arc::new(MockListener::failing(ServeError::Bind {
            addr,
            source: io::Error::other("address already in use"),
        }));
        let diagnostics = Arc::new(RecordingDiagnostics::default());

        let err = coordinator(Arc::clone(&server), Arc::clone(&diagnostics), &Timeouts::default())
            .run_with_termination(std::future::pending())
            .await
            .expect_err("fatal listener error must propagate");

        assert!(matches!(err, ServeError::Bind { .. }));
        assert!(err.to_string().contains("address already in use"));
        assert_eq!(diagnostics.events(), vec!["started".to_string()]);
        assert_eq!(server.shutdown_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn interrupt_drives_graceful_shutdown() {
        let server = Arc::new(MockListener::healthy());
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let timeouts = Timeouts {
            shutdown: Duration::from_secs(2),
            ..Timeouts::default()
        };

        coordinator(Arc::clone(&server), Arc::clone(&diagnostics), &timeouts)
            .run_with_termination(std::future::ready(Some(Termination::Interrupt)))
            .await
            .expect("graceful shutdown must succeed");

        assert_eq!(
            diagnostics.events(),
            vec![
                "started".to_string(),
                "shutting down server: signal:interrupt".to_string(),
                "stopped".to_string(),
            ]
        );
        assert_eq!(server.shutdown_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *server.seen_deadline.lock().unwrap(),
            Some(Duration::from_secs(2))
        );
    }

    #[tokio::test]
    async fn shutdown_deadline_error_skips_on_shutdown() {
        let server = Arc::new(MockListener::stuck());
        let diagnostics = Arc::new(RecordingDiagnostics::default());

        let err = coordinator(Arc::clone(&server), Arc::clone(&diagnostics), &Timeouts::default())
            .run_with_termination(std::future::ready(Some(Termination::Terminate)))
            .await
            .expect_err("drain failure must propagate");

        assert!(matches!(err, ServeError::DeadlineExceeded { .. }));
        assert_eq!(
            diagnostics.events(),
            vec![
                "started".to_string(),
                "shutting down server: signal:terminate".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn sequential_runs_are_independent() {
        for _ in 0..2 {
            let server = Arc::new(MockListener::healthy());
            let diagnostics = Arc::new(RecordingDiagnostics::default());

            coordinator(Arc::clone(&server), Arc::clone(&diagnostics), &Timeouts::default())
                .run_with_termination(std::future::ready(Some(Termination::Interrupt)))
                .await
                .expect("each run must shut down cleanly");

            assert_eq!(diagnostics.events().len(), 3);
            assert_eq!(server.shutdown_calls.load(Ordering::SeqCst), 1);
        }
    }
}

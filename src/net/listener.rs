//! TCP listener implementing the server capability.
//!
//! # Responsibilities
//! - Bind the configured address with the policy's idle/read/write limits
//! - Accept connections and serve each in its own task
//! - Return the closed sentinel as soon as shutdown is requested
//! - Drain in-flight connections within the shutdown deadline
//!
//! # Design Decisions
//! - Read limit maps to the HTTP/1 header-read timeout, write limit to a
//!   request/response deadline layer, idle limit to TCP keepalive time;
//!   a zero value leaves the transport default untouched
//! - Connection-level errors are routed to the diagnostics sink and never
//!   fail the run; accept errors are fatal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use socket2::{Domain, Protocol, Socket, TcpKeepalive, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;

use crate::config::Timeouts;
use crate::lifecycle::{GracefulServer, ServeError};
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::observability::Diagnostics;

/// HTTP listener bound to one address for one run.
///
/// Implements the server capability: `serve` blocks on the accept loop and
/// returns `Ok(())` the moment a shutdown is requested; `shutdown` stops
/// the accept loop and waits for in-flight connections to drain.
pub struct HttpListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
    read_limit: Duration,
    closing: watch::Sender<bool>,
    tracker: ConnectionTracker,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for HttpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListener")
            .field("local_addr", &self.local_addr)
            .field("read_limit", &self.read_limit)
            .finish_non_exhaustive()
    }
}

impl HttpListener {
    /// Bind `addr` and apply the policy's idle/read/write limits.
    ///
    /// The listener's own diagnostic output is wired into
    /// [`Diagnostics::write_diagnostic`].
    pub async fn bind(
        addr: SocketAddr,
        app: Router,
        timeouts: &Timeouts,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, ServeError> {
        let bind_err = |source: std::io::Error| ServeError::Bind { addr, source };

        let socket = build_socket(addr, timeouts).map_err(bind_err)?;
        let std_listener: std::net::TcpListener = socket.into();
        std_listener.set_nonblocking(true).map_err(bind_err)?;
        let listener = TcpListener::from_std(std_listener).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        tracing::info!(
            address = %local_addr,
            read_limit = ?timeouts.read,
            write_limit = ?timeouts.write,
            idle_limit = ?timeouts.idle,
            "listener bound"
        );

        let app = if timeouts.write.is_zero() {
            app
        } else {
            app.layer(TimeoutLayer::new(timeouts.write))
        };

        let (closing, _) = watch::channel(false);

        Ok(Self {
            listener,
            local_addr,
            app,
            read_limit: timeouts.read,
            closing,
            tracker: ConnectionTracker::new(),
            diagnostics,
        })
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current number of in-flight connections.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }
}

#[async_trait]
impl GracefulServer for HttpListener {
    async fn serve(&self) -> Result<(), ServeError> {
        let mut closing = self.closing.subscribe();
        loop {
            tokio::select! {
                _ = closing.wait_for(|closing| *closing) => {
                    tracing::debug!(
                        active = self.tracker.active_count(),
                        "listener stopped accepting"
                    );
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.map_err(ServeError::Accept)?;
                    let guard = self.tracker.track();
                    tracing::debug!(connection_id = %guard.id(), peer = %peer, "connection accepted");
                    tokio::spawn(serve_connection(
                        stream,
                        peer,
                        self.app.clone(),
                        self.read_limit,
                        self.closing.subscribe(),
                        guard,
                        Arc::clone(&self.diagnostics),
                    ));
                }
            }
        }
    }

    async fn shutdown(&self, deadline: Duration) -> Result<(), ServeError> {
        self.closing.send_replace(true);
        tracing::debug!(
            active = self.tracker.active_count(),
            deadline = ?deadline,
            "draining connections"
        );

        // Zero inherits the transport default: wait unbounded.
        if deadline.is_zero() {
            self.tracker.drained().await;
            return Ok(());
        }

        tokio::time::timeout(deadline, self.tracker.drained())
            .await
            .map_err(|_| ServeError::DeadlineExceeded { deadline })
    }
}

/// Build the listen socket with the policy's idle limit applied as TCP
/// keepalive time.
fn build_socket(addr: SocketAddr, timeouts: &Timeouts) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    if !timeouts.idle.is_zero() {
        socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(timeouts.idle))?;
    }

    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    Ok(socket)
}

/// Serve one accepted connection until it completes or drains away.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    read_limit: Duration,
    mut closing: watch::Receiver<bool>,
    guard: ConnectionGuard,
    diagnostics: Arc<dyn Diagnostics>,
) {
    let mut builder = http1::Builder::new();
    builder.timer(TokioTimer::new());
    if !read_limit.is_zero() {
        builder.header_read_timeout(read_limit);
    }

    let service = TowerToHyperService::new(app);
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    diagnostics.write_diagnostic(
                        format!("{}: connection error from {peer}: {err}", guard.id()).as_bytes(),
                    );
                }
                break;
            }
            _ = closing.wait_for(|closing| *closing), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

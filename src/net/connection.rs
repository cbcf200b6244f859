//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for diagnostics
//! - Count active connections via guards
//! - Let shutdown wait for the count to drain to zero

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks active connections so graceful shutdown can wait for them.
///
/// The count lives in a watch channel; [`ConnectionTracker::drained`]
/// resolves as soon as it reaches zero, without polling.
#[derive(Debug)]
pub struct ConnectionTracker {
    active: watch::Sender<u64>,
}

impl ConnectionTracker {
    /// Create a tracker with no active connections.
    pub fn new() -> Self {
        let (active, _) = watch::channel(0);
        Self { active }
    }

    /// Record a new active connection. The guard decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active.send_modify(|count| *count += 1);
        ConnectionGuard {
            active: self.active.clone(),
            id: ConnectionId::new(),
        }
    }

    /// Current active connection count.
    pub fn active_count(&self) -> u64 {
        *self.active.borrow()
    }

    /// Wait until every tracked connection has closed.
    pub async fn drained(&self) {
        let mut count = self.active.subscribe();
        let _ = count.wait_for(|active| *active == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard tied to one connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active: watch::Sender<u64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// This connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.send_modify(|count| *count -= 1);
        tracing::trace!(connection_id = %self.id, "connection closed");
    }
}

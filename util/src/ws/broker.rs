//! Registry interface for session-scoped live fan-out.
//!
//! Callers only ever talk to [`SubscriptionBroker`]. The in-process
//! [`WebSocketManager`](super::WebSocketManager) is the default backend; it only
//! reaches sockets held by the current process, so a multi-process deployment
//! needs a shared pub/sub implementation of this trait.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::event::{AttendanceUpdated, LiveEvent, SessionStats};

/// Outbound frame queue of a single connection.
pub type Outbox = mpsc::Sender<String>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Frames queued on a connection's outbox.
    pub delivered: usize,
    /// Targets whose outbox was full or already closed.
    pub dropped: usize,
}

#[async_trait]
pub trait SubscriptionBroker: Send + Sync + 'static {
    /// Registers a live connection and its outbound queue.
    async fn connect(&self, conn: ConnectionId, outbox: Outbox);

    /// Adds `conn` to the watchers of `session_id`.
    ///
    /// Idempotent. Returns `false` when `conn` is not a connected client.
    async fn subscribe(&self, session_id: i64, conn: ConnectionId) -> bool;

    /// Removes `conn` from the watchers of `session_id`.
    ///
    /// Returns whether it was subscribed.
    async fn unsubscribe(&self, session_id: i64, conn: ConnectionId) -> bool;

    /// Drops the connection and every subscription it holds in one step.
    async fn on_disconnect(&self, conn: ConnectionId);

    /// Current watchers of `session_id`.
    async fn subscribers(&self, session_id: i64) -> Vec<ConnectionId>;

    /// Delivers `event` to exactly the watchers of `session_id`.
    async fn broadcast_to_session(&self, session_id: i64, event: &LiveEvent) -> Delivery;

    /// Delivers `event` to every connected client, subscribed or not.
    async fn broadcast_global(&self, event: &LiveEvent) -> Delivery;

    async fn broadcast_attendance_update(
        &self,
        session_id: i64,
        payload: AttendanceUpdated,
    ) -> Delivery {
        self.broadcast_to_session(session_id, &LiveEvent::AttendanceUpdated(payload))
            .await
    }

    async fn broadcast_session_stats(&self, session_id: i64, payload: SessionStats) -> Delivery {
        self.broadcast_to_session(session_id, &LiveEvent::SessionStats(payload))
            .await
    }
}

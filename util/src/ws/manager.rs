//! A thread-safe WebSocket manager for session-scoped broadcasting.
//!
//! Keeps every connected client's outbound queue plus, per session, the set of
//! connections watching it. Both maps sit behind one lock so a disconnect
//! removes a connection from every session atomically.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc::error::TrySendError};

use super::broker::{ConnectionId, Delivery, Outbox, SubscriptionBroker};
use super::event::{EventEnvelope, LiveEvent};

#[derive(Default)]
struct Registry {
    /// Connected clients.
    connections: HashMap<ConnectionId, Outbox>,
    /// session_id -> watchers
    sessions: HashMap<i64, HashSet<ConnectionId>>,
    /// Reverse index: connection -> sessions it watches.
    watching: HashMap<ConnectionId, HashSet<i64>>,
}

/// In-process [`SubscriptionBroker`].
///
/// - Sessions appear on first subscription and are dropped when their last
///   watcher leaves
/// - A connection may watch any number of sessions at once
/// - Slow or closed outboxes are skipped, never awaited
#[derive(Clone, Default)]
pub struct WebSocketManager {
    inner: Arc<RwLock<Registry>>,
}

impl WebSocketManager {
    /// Creates a new, empty `WebSocketManager`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected clients.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Number of sessions with at least one watcher.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    fn deliver(targets: Vec<(ConnectionId, Outbox)>, event: &LiveEvent) -> Delivery {
        let frame = match serde_json::to_string(&EventEnvelope::new(event)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(event = event.name(), "Failed to serialize live event: {e}");
                return Delivery::default();
            }
        };

        let mut out = Delivery::default();
        for (conn, outbox) in targets {
            match outbox.try_send(frame.clone()) {
                Ok(()) => out.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%conn, event = event.name(), "Outbox full, dropping frame");
                    out.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%conn, event = event.name(), "Outbox closed, skipping");
                    out.dropped += 1;
                }
            }
        }
        out
    }
}

#[async_trait]
impl SubscriptionBroker for WebSocketManager {
    async fn connect(&self, conn: ConnectionId, outbox: Outbox) {
        let mut reg = self.inner.write().await;
        reg.connections.insert(conn, outbox);
        tracing::debug!(%conn, "Connection registered");
    }

    async fn subscribe(&self, session_id: i64, conn: ConnectionId) -> bool {
        let mut reg = self.inner.write().await;
        if !reg.connections.contains_key(&conn) {
            return false;
        }
        reg.sessions.entry(session_id).or_default().insert(conn);
        reg.watching.entry(conn).or_default().insert(session_id);
        true
    }

    async fn unsubscribe(&self, session_id: i64, conn: ConnectionId) -> bool {
        let mut reg = self.inner.write().await;
        let removed = match reg.sessions.get_mut(&session_id) {
            Some(watchers) => {
                let removed = watchers.remove(&conn);
                if watchers.is_empty() {
                    reg.sessions.remove(&session_id);
                }
                removed
            }
            None => false,
        };
        if let Some(sessions) = reg.watching.get_mut(&conn) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                reg.watching.remove(&conn);
            }
        }
        removed
    }

    async fn on_disconnect(&self, conn: ConnectionId) {
        let mut reg = self.inner.write().await;
        reg.connections.remove(&conn);
        let Some(sessions) = reg.watching.remove(&conn) else {
            return;
        };
        for session_id in sessions {
            if let Some(watchers) = reg.sessions.get_mut(&session_id) {
                watchers.remove(&conn);
                if watchers.is_empty() {
                    tracing::info!("Removing session {session_id} feed due to no subscribers.");
                    reg.sessions.remove(&session_id);
                }
            }
        }
    }

    async fn subscribers(&self, session_id: i64) -> Vec<ConnectionId> {
        let reg = self.inner.read().await;
        let mut ids: Vec<ConnectionId> = reg
            .sessions
            .get(&session_id)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    async fn broadcast_to_session(&self, session_id: i64, event: &LiveEvent) -> Delivery {
        let targets: Vec<(ConnectionId, Outbox)> = {
            let reg = self.inner.read().await;
            match reg.sessions.get(&session_id) {
                Some(watchers) => watchers
                    .iter()
                    .filter_map(|c| reg.connections.get(c).map(|tx| (*c, tx.clone())))
                    .collect(),
                None => Vec::new(),
            }
        };
        Self::deliver(targets, event)
    }

    async fn broadcast_global(&self, event: &LiveEvent) -> Delivery {
        let targets: Vec<(ConnectionId, Outbox)> = {
            let reg = self.inner.read().await;
            reg.connections
                .iter()
                .map(|(c, tx)| (*c, tx.clone()))
                .collect()
        };
        Self::deliver(targets, event)
    }
}

//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection and the live-event broker. Cloning is cheap:
//! both are reference counted.

use crate::ws::{SubscriptionBroker, WebSocketManager};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    broker: Arc<dyn SubscriptionBroker>,
}

impl AppState {
    /// Creates a new `AppState` backed by the in-process [`WebSocketManager`].
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_broker(db, Arc::new(WebSocketManager::new()))
    }

    /// Creates a new `AppState` with a caller-supplied broker implementation.
    pub fn with_broker(db: DatabaseConnection, broker: Arc<dyn SubscriptionBroker>) -> Self {
        Self { db, broker }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a shared reference to the live-event broker.
    pub fn broker(&self) -> &Arc<dyn SubscriptionBroker> {
        &self.broker
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    /// Returns a cloned handle to the broker.
    pub fn broker_clone(&self) -> Arc<dyn SubscriptionBroker> {
        Arc::clone(&self.broker)
    }
}

// util/src/ws/mod.rs
pub mod broker;
pub mod event;
pub mod manager;

pub use broker::{ConnectionId, Delivery, Outbox, SubscriptionBroker};
pub use event::{EventEnvelope, LiveEvent, session_topic};
pub use manager::WebSocketManager;

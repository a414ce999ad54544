use serde::{Deserialize, Serialize};

/// Frames a client may send.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIn {
    Subscribe { session_ids: Vec<i64> },
    Unsubscribe { session_ids: Vec<i64> },
    Ping,
}

/// Control frames the server sends. Live events go out as
/// [`util::ws::EventEnvelope`] instead.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOut {
    Ready {
        connection_id: String,
    },
    Pong,
    SubscribeOk {
        accepted: Vec<i64>,
        rejected: Vec<Rejected>,
    },
    UnsubscribeOk {
        session_ids: Vec<i64>,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Rejected {
    pub session_id: i64,
    pub code: &'static str,
}

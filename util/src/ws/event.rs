//! Live events pushed to WebSocket clients.
//!
//! Every event kind is a variant of [`LiveEvent`], so consumers can match
//! exhaustively instead of probing an untyped JSON bag.

use serde::{Deserialize, Serialize};

/// Topic prefix for per-session attendance streams.
pub const SESSION_TOPIC_PREFIX: &str = "attendance:session:";

/// Topic used for events that go to every connected client.
pub const SYSTEM_TOPIC: &str = "system";

/// Canonical topic path for a session's live feed.
pub fn session_topic(session_id: i64) -> String {
    format!("{SESSION_TOPIC_PREFIX}{session_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceUpdated {
    pub session_id: i64,
    pub student_id: String,
    pub status: String,
    pub marked_by: String,
    /// RFC3339
    pub marked_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: i64,
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
    pub leave: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDeleted {
    pub session_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotice {
    pub level: String,
    pub message: String,
}

/// Closed set of events the server pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum LiveEvent {
    #[serde(rename = "attendance.updated")]
    AttendanceUpdated(AttendanceUpdated),
    #[serde(rename = "attendance.session_stats")]
    SessionStats(SessionStats),
    #[serde(rename = "attendance.session_deleted")]
    SessionDeleted(SessionDeleted),
    #[serde(rename = "system.notice")]
    SystemNotice(SystemNotice),
}

impl LiveEvent {
    /// Stable wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::AttendanceUpdated(_) => "attendance.updated",
            LiveEvent::SessionStats(_) => "attendance.session_stats",
            LiveEvent::SessionDeleted(_) => "attendance.session_deleted",
            LiveEvent::SystemNotice(_) => "system.notice",
        }
    }

    /// Session the event is scoped to, `None` for system-wide events.
    pub fn session_id(&self) -> Option<i64> {
        match self {
            LiveEvent::AttendanceUpdated(p) => Some(p.session_id),
            LiveEvent::SessionStats(p) => Some(p.session_id),
            LiveEvent::SessionDeleted(p) => Some(p.session_id),
            LiveEvent::SystemNotice(_) => None,
        }
    }

    /// Canonical topic path (e.g. `attendance:session:7` or `system`).
    pub fn topic_path(&self) -> String {
        match self.session_id() {
            Some(id) => session_topic(id),
            None => SYSTEM_TOPIC.to_string(),
        }
    }
}

/// Standard event envelope sent over the socket.
#[derive(Serialize)]
pub struct EventEnvelope<'a> {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub topic: String,
    #[serde(flatten)]
    pub event: &'a LiveEvent,
    pub ts: String,
}

impl<'a> EventEnvelope<'a> {
    pub fn new(event: &'a LiveEvent) -> Self {
        Self {
            r#type: "event",
            topic: event.topic_path(),
            event,
            ts: chrono::Utc::now().to_rfc3339(),
        }
    }
}

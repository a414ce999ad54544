//! Response shapes shared by several route groups.

use db::models::attendance_record::{AttendanceStatus, Model as AttendanceRecord, RecordSource};
use db::models::session::{CheckInMode, Model as Session};
use serde::Serialize;
use services::IssuedToken;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub class_id: i64,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub check_in_mode: CheckInMode,
    pub geo_required: bool,
    pub created_at: String,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            class_id: s.class_id,
            date: s.date.format("%Y-%m-%d").to_string(),
            start_time: s.start_time.map(|t| t.format("%H:%M").to_string()),
            end_time: s.end_time.map(|t| t.format("%H:%M").to_string()),
            check_in_mode: s.check_in_mode,
            geo_required: s.geo_required,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: i64,
    pub session_id: i64,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub accuracy: Option<f64>,
    pub marked_by: String,
    pub marked_at: String,
    pub source: RecordSource,
}

impl From<AttendanceRecord> for RecordResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            session_id: r.session_id,
            student_id: r.student_id,
            status: r.status,
            note: r.note,
            lat: r.lat,
            long: r.long,
            accuracy: r.accuracy,
            marked_by: r.marked_by,
            marked_at: r.marked_at.to_rfc3339(),
            source: r.source,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub session_id: i64,
    pub value: String,
    pub expires_at: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            session_id: t.session_id,
            value: t.value,
            expires_at: t.expires_at.to_rfc3339(),
        }
    }
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::attendance_record::AttendanceStatus;
use serde::Deserialize;
use services::AttendanceRecorder;
use services::attendance_recorder::{BulkEntry, CreateSession};
use util::state::AppState;

use crate::extract::JsonBody;
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::{RecordResponse, SessionResponse, TokenResponse};

/// POST /api/sessions
///
/// ### Request Body
/// ```json
/// {
///   "class_id": 7,
///   "date": "2025-09-08",
///   "start_time": "09:00:00",
///   "end_time": "10:00:00",
///   "check_in_mode": "session_wide",
///   "geo_required": false
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the new session
/// - `422 Unprocessable Entity` when `end_time` precedes `start_time`
pub async fn create_session(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateSession>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    let session = AttendanceRecorder::from_state(&state)
        .create_session(body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            SessionResponse::from(session),
            "Session created successfully",
        )),
    ))
}

/// POST /api/sessions/{session_id}/token
///
/// Issues the session's check-in token, or rotates it when one exists. The
/// previous value stops verifying as soon as this returns.
///
/// ### Responses
/// - `200 OK` with `{ session_id, value, expires_at }`
/// - `404 Not Found` for an unknown session
/// - `409 Conflict` when check-in is off for the session
pub async fn issue_token(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    let token = AttendanceRecorder::from_state(&state)
        .tokens()
        .issue_or_rotate(session_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(TokenResponse::from(token), "Token issued")),
    ))
}

#[derive(Debug, Deserialize)]
pub struct BulkMarkReq {
    pub default_status: AttendanceStatus,
    pub marked_by: String,
    pub overrides: Vec<BulkEntry>,
}

/// POST /api/sessions/{session_id}/records/bulk
///
/// ### Request Body
/// ```json
/// {
///   "default_status": "absent",
///   "marked_by": "lecturer-1",
///   "overrides": [
///     { "student_id": "u1" },
///     { "student_id": "u2", "status": "late", "note": "bus" }
///   ]
/// }
/// ```
///
/// Students that already have a record are overwritten in place.
pub async fn bulk_mark(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    JsonBody(body): JsonBody<BulkMarkReq>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<RecordResponse>>>), ApiError> {
    let written = AttendanceRecorder::from_state(&state)
        .mark_bulk(session_id, body.default_status, body.overrides, &body.marked_by)
        .await?;

    let n = written.len();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            written.into_iter().map(RecordResponse::from).collect(),
            format!("Marked {n} students"),
        )),
    ))
}

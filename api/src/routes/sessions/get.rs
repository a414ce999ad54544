use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::AttendanceRecorder;
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};
use crate::routes::common::{RecordResponse, SessionResponse, TokenResponse};

/// GET /api/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    let session = AttendanceRecorder::from_state(&state)
        .find_session(session_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            SessionResponse::from(session),
            "Session fetched successfully",
        )),
    ))
}

/// GET /api/sessions/{session_id}/token
///
/// For display screens that only poll. `data` is `null` until the first
/// token is issued; an expired token is still returned as stored.
pub async fn current_token(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Option<TokenResponse>>>), ApiError> {
    let token = AttendanceRecorder::from_state(&state)
        .tokens()
        .current(session_id)
        .await?;

    let message = if token.is_some() {
        "Token fetched successfully"
    } else {
        "No token issued yet"
    };
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(token.map(TokenResponse::from), message)),
    ))
}

/// GET /api/sessions/{session_id}/records
///
/// Records ordered by `marked_at`, oldest first.
pub async fn list_records(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<RecordResponse>>>), ApiError> {
    let records = AttendanceRecorder::from_state(&state).list(session_id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            records.into_iter().map(RecordResponse::from).collect(),
            "Records fetched successfully",
        )),
    ))
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::AttendanceRecorder;
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

/// DELETE /api/sessions/{session_id}
///
/// Removes the session together with its token and records. Watchers of the
/// session receive an `attendance.session_deleted` event.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    AttendanceRecorder::from_state(&state)
        .delete_session(session_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success((), "Session deleted successfully")),
    ))
}

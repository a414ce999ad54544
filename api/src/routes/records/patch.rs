use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::attendance_record::AttendanceStatus;
use serde::Deserialize;
use services::AttendanceRecorder;
use util::state::AppState;

use crate::extract::JsonBody;
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::RecordResponse;

#[derive(Debug, Deserialize)]
pub struct UpdateRecordReq {
    pub status: AttendanceStatus,
    /// Omitted keeps the note, `""` clears it.
    #[serde(default)]
    pub note: Option<String>,
    pub updated_by: String,
}

/// PATCH /api/records/{record_id}
///
/// ### Request Body
/// ```json
/// { "status": "late", "note": "train delay", "updated_by": "lecturer-1" }
/// ```
///
/// Only an actual change is written to the audit log, but session watchers
/// are notified either way.
pub async fn update_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    JsonBody(body): JsonBody<UpdateRecordReq>,
) -> Result<(StatusCode, Json<ApiResponse<RecordResponse>>), ApiError> {
    let record = AttendanceRecorder::from_state(&state)
        .update(record_id, body.status, body.note, &body.updated_by)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            RecordResponse::from(record),
            "Record updated successfully",
        )),
    ))
}

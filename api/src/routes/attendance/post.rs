use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use services::attendance_recorder::GeoPoint;
use services::{AppError, AttendanceRecorder};
use util::state::AppState;

use crate::extract::JsonBody;
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::RecordResponse;

#[derive(Debug, Deserialize)]
pub struct RedeemReq {
    pub token: String,
    pub student_id: String,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub accuracy: Option<f64>,
}

impl RedeemReq {
    fn geo(&self) -> Result<Option<GeoPoint>, AppError> {
        match (self.lat, self.long) {
            (Some(lat), Some(long)) => Ok(Some(GeoPoint {
                lat,
                long,
                accuracy: self.accuracy,
            })),
            (None, None) => Ok(None),
            _ => Err(AppError::validation("lat and long must be sent together")),
        }
    }
}

/// POST /api/attendance/redeem
///
/// ### Request Body
/// ```json
/// { "token": "K7QX2M", "student_id": "u21", "lat": -25.75, "long": 28.23, "accuracy": 12.5 }
/// ```
///
/// Redeeming twice returns the same record with `200 OK`.
///
/// ### Responses
/// - `200 OK` with the attendance record
/// - `400 Bad Request` for an unknown token
/// - `410 Gone` for an expired token
/// - `403 Forbidden` when roster enforcement rejects the student
/// - `422 Unprocessable Entity` for blank ids or out-of-range coordinates
pub async fn redeem(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RedeemReq>,
) -> Result<(StatusCode, Json<ApiResponse<RecordResponse>>), ApiError> {
    let geo = body.geo()?;
    let record = AttendanceRecorder::from_state(&state)
        .mark_via_token(&body.token, &body.student_id, geo)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            RecordResponse::from(record),
            "Attendance recorded",
        )),
    ))
}

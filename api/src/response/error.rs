use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::AppError;
use tracing::error;

use super::ApiResponse;

/// Wraps a service error so handlers can `?` straight into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::SessionNotFound(_) | AppError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            AppError::TokenInvalid => StatusCode::BAD_REQUEST,
            AppError::TokenExpired => StatusCode::GONE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StudentNotEnrolled { .. } => StatusCode::FORBIDDEN,
            AppError::CheckInDisabled(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self.0 {
            AppError::Database(e) => {
                error!(error = %e, "database error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

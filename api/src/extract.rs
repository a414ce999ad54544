//! Request extractors whose rejections use the `ApiResponse` envelope.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use services::AppError;

use crate::response::ApiError;

/// `axum::Json` with its rejection mapped to a `422` [`ApiError`].
///
/// Syntax errors, missing fields, wrong types and a missing
/// `Content-Type: application/json` all come back as
/// `{ "success": false, "message": .. }` instead of axum's plain-text body.
///
/// ```ignore
/// async fn handler(JsonBody(body): JsonBody<MyReq>) { .. }
/// ```
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::Validation(rejection.body_text()))
    }
}

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;
use util::state::AppState;
use util::ws::LiveEvent;
use util::ws::event::SystemNotice;

use crate::extract::JsonBody;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct NoticeReq {
    #[serde(default = "default_level")]
    pub level: String,
    pub message: String,
}

fn default_level() -> String {
    "info".into()
}

#[derive(Debug, Serialize, Default)]
pub struct NoticeResponse {
    pub delivered: usize,
    pub dropped: usize,
}

/// POST /api/system/notices
///
/// Broadcasts a `system.notice` event to every connected client, whether or
/// not it watches any session.
///
/// ### Request Body
/// ```json
/// { "level": "warning", "message": "Server restarts in 5 minutes" }
/// ```
///
/// ### Responses
/// - `200 OK` with delivery counts
/// - `422 Unprocessable Entity` for an empty message
pub async fn post_notice(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NoticeReq>,
) -> (StatusCode, Json<ApiResponse<NoticeResponse>>) {
    let message = body.message.trim();
    if message.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error("Notice message must not be empty")),
        );
    }

    let event = LiveEvent::SystemNotice(SystemNotice {
        level: body.level,
        message: message.to_owned(),
    });
    let d = state.broker().broadcast_global(&event).await;
    info!(delivered = d.delivered, dropped = d.dropped, "system notice broadcast");

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            NoticeResponse {
                delivered: d.delivered,
                dropped: d.dropped,
            },
            "Notice sent",
        )),
    )
}

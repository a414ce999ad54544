use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

mod delete;
mod get;
mod post;

pub use delete::delete_session;
pub use get::{current_token, get_session, list_records};
pub use post::{bulk_mark, create_session, issue_token};

/// Builds the `/sessions` route group.
///
/// - `POST   /`                          → create a session
/// - `GET    /{session_id}`              → fetch one session
/// - `DELETE /{session_id}`              → delete with its token and records
/// - `POST   /{session_id}/token`        → issue or rotate the check-in token
/// - `GET    /{session_id}/token`        → current token, no rotation
/// - `POST   /{session_id}/records/bulk` → mark many students at once
/// - `GET    /{session_id}/records`      → every record of the session
pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{session_id}", get(get_session).delete(delete_session))
        .route("/{session_id}/token", post(issue_token).get(current_token))
        .route("/{session_id}/records", get(list_records))
        .route("/{session_id}/records/bulk", post(bulk_mark))
}

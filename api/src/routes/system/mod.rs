use axum::{Router, routing::post};
use util::state::AppState;

mod post;

pub use post::post_notice;

/// Builds the `/system` route group.
///
/// - `POST /notices` → push a notice to every connected socket
pub fn system_routes() -> Router<AppState> {
    Router::new().route("/notices", post(post_notice))
}

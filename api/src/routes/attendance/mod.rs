use axum::{Router, routing::post};
use util::state::AppState;

mod post;

pub use post::redeem;

/// Builds the `/attendance` route group.
///
/// - `POST /redeem` → student redeems a check-in token
pub fn attendance_routes() -> Router<AppState> {
    Router::new().route("/redeem", post(redeem))
}

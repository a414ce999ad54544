//! HTTP and WebSocket surface of the roll-call server.

pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod ws;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::cors::CorsLayer;
use util::state::AppState;

/// Builds the full application router: `/api/...` plus the `/ws` socket.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::routes())
        .route("/ws", get(ws::mux::ws_multiplex_entry))
        .layer(from_fn(middleware::log_request))
        .layer(CorsLayer::very_permissive())
        .with_state(app_state)
}

//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe
//! - `/sessions` → session lifecycle, check-in tokens, bulk marks, listings
//! - `/attendance` → token redemption by students
//! - `/records` → single-record edits
//! - `/system` → system-wide notices pushed to every socket

use axum::Router;
use util::state::AppState;

use crate::routes::{
    attendance::attendance_routes, health::health_routes, records::records_routes,
    sessions::sessions_routes, system::system_routes,
};

pub mod attendance;
pub mod common;
pub mod health;
pub mod records;
pub mod sessions;
pub mod system;

/// Builds every `/api` route. State is attached by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/sessions", sessions_routes())
        .nest("/attendance", attendance_routes())
        .nest("/records", records_routes())
        .nest("/system", system_routes())
}

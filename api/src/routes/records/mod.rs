use axum::{Router, routing::patch};
use util::state::AppState;

mod patch;

pub use patch::update_record;

/// Builds the `/records` route group.
///
/// - `PATCH /{record_id}` → change status and note of one record
pub fn records_routes() -> Router<AppState> {
    Router::new().route("/{record_id}", patch(update_record))
}

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service version plus the number of events waiting in the local buffer.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "companion-api",
        "store": state.config.store_backend.as_str(),
        "buffered_events": state.event_buffer.buffered(),
        "active_dashboards": state.dashboards.active_count(),
    }))
}

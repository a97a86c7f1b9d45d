use crate::state::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

/// Liveness probe with the number of free render slots.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "available_render_slots": state.render_slots.available_permits(),
    }))
}

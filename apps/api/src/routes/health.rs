use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and which optional
/// backends are active.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvforge-api",
        "improve_backend": state.improver.backend(),
        "layout_debounce_ms": state.config.layout_debounce.as_millis() as u64,
        "layout_computations": state.scheduler.computations(),
    }))
}

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::improve::{ImproveKind, ImproveRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImproveResponse {
    pub text: String,
    pub kind: ImproveKind,
    pub backend: &'static str,
}

/// POST /api/v1/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    Json(req): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    let text = state.improver.improve(&req).await?;
    Ok(Json(ImproveResponse {
        text,
        kind: req.kind,
        backend: state.improver.backend(),
    }))
}

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cv::commands::{CvCommand, EditorState};
use crate::cv::store;
use crate::cv::transfer::{export_cv, export_file_name, import_cv};
use crate::errors::AppError;
use crate::models::cv::{CvDocument, CvRow, CvSummaryRow, Template};
use crate::state::AppState;

const UNTITLED: &str = "Untitled CV";

#[derive(Debug, Deserialize)]
pub struct CreateCvRequest {
    pub title: Option<String>,
    pub template: Option<Template>,
    pub data: Option<CvDocument>,
}

/// Full replacement of any subset of fields. Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateCvRequest {
    pub title: Option<String>,
    pub template: Option<Template>,
    pub data: Option<CvDocument>,
}

#[derive(Debug, Deserialize)]
pub struct CommandBatch {
    pub commands: Vec<CvCommand>,
}

#[derive(Debug, Serialize)]
pub struct CvResponse {
    pub id: Uuid,
    pub title: String,
    pub template: Template,
    pub data: CvDocument,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl CvResponse {
    fn from_row(row: &CvRow) -> Self {
        let editor = EditorState::from_row(row);
        Self {
            id: row.id,
            title: editor.title,
            template: editor.template,
            data: editor.document,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn load(state: &AppState, id: Uuid) -> Result<CvRow, AppError> {
    store::get_cv(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))
}

fn clean_title(title: Option<String>) -> Option<String> {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Queues a background layout of the stored revision.
fn schedule_layout(state: &AppState, row: &CvRow) {
    let editor = EditorState::from_row(row);
    state
        .scheduler
        .schedule(row.id, row.updated_at, editor.document, editor.template);
}

/// GET /api/v1/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
) -> Result<Json<Vec<CvSummaryRow>>, AppError> {
    Ok(Json(store::list_cvs(&state.db).await?))
}

/// POST /api/v1/cvs
pub async fn handle_create_cv(
    State(state): State<AppState>,
    Json(req): Json<CreateCvRequest>,
) -> Result<(StatusCode, Json<CvResponse>), AppError> {
    let title = clean_title(req.title).unwrap_or_else(|| UNTITLED.to_string());
    let template = req.template.unwrap_or_default();
    let document = req.data.unwrap_or_default();

    let row = store::create_cv(&state.db, &title, template, &document).await?;
    schedule_layout(&state, &row);
    Ok((StatusCode::CREATED, Json(CvResponse::from_row(&row))))
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CvResponse>, AppError> {
    let row = load(&state, id).await?;
    Ok(Json(CvResponse::from_row(&row)))
}

/// PUT /api/v1/cvs/:id
pub async fn handle_update_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCvRequest>,
) -> Result<Json<CvResponse>, AppError> {
    let current = EditorState::from_row(&load(&state, id).await?);

    let title = clean_title(req.title).unwrap_or(current.title);
    let template = req.template.unwrap_or(current.template);
    let document = req.data.unwrap_or(current.document);

    let row = store::update_cv(&state.db, id, &title, template, &document)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;
    schedule_layout(&state, &row);
    Ok(Json(CvResponse::from_row(&row)))
}

/// DELETE /api/v1/cvs/:id
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_cv(&state.db, id).await? {
        return Err(AppError::NotFound(format!("CV {id} not found")));
    }
    state.scheduler.forget(id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/cvs/:id/commands
///
/// Applies the batch in order. The batch is all-or-nothing: the first failing
/// command rejects the request and nothing is saved.
pub async fn handle_apply_commands(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(batch): Json<CommandBatch>,
) -> Result<Json<CvResponse>, AppError> {
    let row = load(&state, id).await?;
    let mut editor = EditorState::from_row(&row);

    for (index, command) in batch.commands.into_iter().enumerate() {
        editor
            .apply(command)
            .map_err(|e| AppError::Validation(format!("command {index}: {e}")))?;
    }

    if !editor.is_dirty {
        return Ok(Json(CvResponse::from_row(&row)));
    }

    let saved = store::update_cv(&state.db, id, &editor.title, editor.template, &editor.document)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;
    editor.mark_saved();
    schedule_layout(&state, &saved);
    Ok(Json(CvResponse::from_row(&saved)))
}

/// GET /api/v1/cvs/:id/export
pub async fn handle_export_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = load(&state, id).await?;
    let export = export_cv(&row)?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&export.title));
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(export)))
}

/// POST /api/v1/cvs/import (multipart, field `file`)
pub async fn handle_import_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CvResponse>), AppError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("missing multipart field 'file'".to_string()))?;
    let fallback = file_name
        .as_deref()
        .map(|name| name.trim_end_matches(".json").to_string())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let imported = import_cv(&bytes, &fallback)?;
    let row = store::create_cv(&state.db, &imported.title, imported.template, &imported.data).await?;
    info!(cv_id = %row.id, "Imported CV from {}", file_name.as_deref().unwrap_or("upload"));
    schedule_layout(&state, &row);
    Ok((StatusCode::CREATED, Json(CvResponse::from_row(&row))))
}


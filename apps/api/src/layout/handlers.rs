use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cv::commands::EditorState;
use crate::cv::store;
use crate::errors::AppError;
use crate::layout::page_break::{calculate_layout, Block, BlockCategory, LayoutConfig, LayoutResult};
use crate::layout::preview::{compute_preview, PreviewLayout};
use crate::layout::scheduler::ScheduledPreview;
use crate::layout::viewport::{PageView, PaginatedViewport};
use crate::models::cv::Template;
use crate::state::AppState;

/// Upper bound on blocks accepted by the raw layout endpoint.
const MAX_BLOCKS: usize = 5_000;
/// Extra time, past the debounce, a preview request waits for a pending layout.
const PENDING_LAYOUT_GRACE: Duration = Duration::from_millis(500);
/// Largest normalized offset or height accepted, roughly 8900 A4 pages.
const MAX_DOCUMENT_PX: f64 = 10_000_000.0;

/// A block as measured on screen, before zoom normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredBlock {
    pub id: String,
    pub category: BlockCategory,
    pub offset_px: f64,
    pub height_px: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub blocks: Vec<MeasuredBlock>,
    pub config: Option<LayoutConfig>,
    /// Preview zoom the blocks were measured at. Defaults to 1.
    pub scale: Option<f64>,
    /// When set, the response also carries the view of this page.
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResponse {
    #[serde(flatten)]
    pub layout: LayoutResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<PageView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageNav {
    Next,
    Previous,
}

/// `page` selects the starting page (default 1). `nav` then steps one page from it,
/// saturating at the first and last page.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub page: Option<u32>,
    pub nav: Option<PageNav>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewSource {
    /// Served from the debounced background computation.
    Scheduled,
    /// Computed on demand because no matching background result existed.
    Computed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub cv_id: Uuid,
    pub revision: DateTime<Utc>,
    pub template: Template,
    pub source: PreviewSource,
    pub view: PageView,
    pub layout: LayoutResult,
    pub blocks: Vec<Block>,
}

/// POST /api/v1/layout
///
/// Runs the page-break calculator over blocks measured by the client.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    if req.blocks.len() > MAX_BLOCKS {
        return Err(AppError::Validation(format!(
            "too many blocks: {} (max {MAX_BLOCKS})",
            req.blocks.len()
        )));
    }

    let config = req.config.unwrap_or(*state.scheduler.config()).sanitized();
    let blocks = normalize_blocks(req.blocks, req.scale.unwrap_or(1.0))?;

    let layout = tokio::task::spawn_blocking(move || calculate_layout(&blocks, &config))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("layout task failed: {e}")))?;
    let view = req.page.map(|page| {
        let mut viewport = PaginatedViewport::new(config.page_height_px);
        viewport.render(&layout, page)
    });

    Ok(Json(LayoutResponse { layout, view }))
}

/// Divides out the preview zoom and rejects geometry outside the document bounds.
fn normalize_blocks(measured: Vec<MeasuredBlock>, scale: f64) -> Result<Vec<Block>, AppError> {
    measured
        .into_iter()
        .map(|b| {
            let block = Block::from_measured(b.id, b.category, b.offset_px, b.height_px, scale);
            for (field, value) in [("offsetPx", block.offset_px), ("heightPx", block.height_px)] {
                if !value.is_finite() || value.abs() > MAX_DOCUMENT_PX {
                    return Err(AppError::Validation(format!(
                        "block {}: {field} out of range after scaling ({value})",
                        block.id
                    )));
                }
            }
            Ok(block)
        })
        .collect()
}

/// GET /api/v1/cvs/:id/preview?page=N
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, AppError> {
    let row = store::get_cv(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;

    let wait = state.config.layout_debounce + PENDING_LAYOUT_GRACE;
    let scheduled = state.scheduler.await_latest(id, row.updated_at, wait).await;
    let (preview, source) = match scheduled {
        Some(scheduled) => (scheduled, PreviewSource::Scheduled),
        None => {
            debug!(cv_id = %id, "no scheduled layout for revision, computing inline");
            let editor = EditorState::from_row(&row);
            let config = *state.scheduler.config();
            let preview: PreviewLayout = tokio::task::spawn_blocking(move || {
                compute_preview(&editor.document, editor.template, &config)
            })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("layout task failed: {e}")))?;
            (
                Arc::new(ScheduledPreview {
                    revision: row.updated_at,
                    preview,
                }),
                PreviewSource::Computed,
            )
        }
    };

    let config = state.scheduler.config().sanitized();
    let layout = &preview.preview.layout;
    let mut viewport = PaginatedViewport::new(config.page_height_px)
        .on_page_count_change(move |count| debug!(cv_id = %id, count, "preview page count"));
    viewport.apply_layout(layout);
    viewport.go_to(query.page.unwrap_or(1));
    match query.nav {
        Some(PageNav::Next) => viewport.next_page(),
        Some(PageNav::Previous) => viewport.previous_page(),
        None => viewport.current_page(),
    };
    let view = viewport.render(layout, viewport.current_page());

    Ok(Json(PreviewResponse {
        cv_id: id,
        revision: preview.revision,
        template: preview.preview.template,
        source,
        view,
        layout: layout.clone(),
        blocks: preview.preview.blocks.clone(),
    }))
}

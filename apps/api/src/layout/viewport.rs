//! Paginated Viewport: shows one laid-out page at a time by clipping and translating.
//!
//! `current_page` is always kept inside `[1, page_count]`. Moving between pages never
//! reflows the document; only the vertical translation changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::page_break::LayoutResult;

/// What the front end needs to draw a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: u32,
    pub page_count: u32,
    pub clip_height_px: f64,
    /// Applied to the whole document: `-(page - 1) * page_height`.
    pub translate_y_px: f64,
    /// Blocks whose box intersects the visible window, in document order.
    pub visible_block_ids: Vec<String>,
}

type PageCountCallback = Box<dyn FnMut(u32) + Send>;

pub struct PaginatedViewport {
    page_height_px: f64,
    page_count: u32,
    current_page: u32,
    on_page_count_change: Option<PageCountCallback>,
}

impl std::fmt::Debug for PaginatedViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedViewport")
            .field("page_height_px", &self.page_height_px)
            .field("page_count", &self.page_count)
            .field("current_page", &self.current_page)
            .finish_non_exhaustive()
    }
}

/// Vertical translation that brings `page` to the top of the window.
pub fn page_translation(page: u32, page_height_px: f64) -> f64 {
    -(page.saturating_sub(1) as f64) * page_height_px
}

impl PaginatedViewport {
    pub fn new(page_height_px: f64) -> Self {
        Self {
            page_height_px,
            page_count: 1,
            current_page: 1,
            on_page_count_change: None,
        }
    }

    /// Registers the callback fired whenever a new layout changes the page count.
    pub fn on_page_count_change(mut self, callback: impl FnMut(u32) + Send + 'static) -> Self {
        self.on_page_count_change = Some(Box::new(callback));
        self
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Takes the page count from a fresh layout and re-clamps the current page.
    pub fn apply_layout(&mut self, layout: &LayoutResult) {
        let count = layout.page_count.max(1);
        if count != self.page_count {
            debug!(from = self.page_count, to = count, "page count changed");
            self.page_count = count;
            if let Some(callback) = self.on_page_count_change.as_mut() {
                callback(count);
            }
        }
        self.current_page = self.clamp(self.current_page);
    }

    /// Clips the layout to `current_page` (clamped) and returns the translation to apply.
    pub fn render(&mut self, layout: &LayoutResult, current_page: u32) -> PageView {
        self.apply_layout(layout);
        self.current_page = self.clamp(current_page);

        let top = (self.current_page - 1) as f64 * self.page_height_px;
        let bottom = top + self.page_height_px;
        let visible_block_ids = layout
            .placements
            .iter()
            .filter(|p| {
                let start = p.effective_offset_px;
                let end = start + p.height_px;
                // Zero-height blocks count when their top sits inside the window.
                (start < bottom && end > top) || (p.height_px == 0.0 && start >= top && start < bottom)
            })
            .map(|p| p.id.clone())
            .collect();

        PageView {
            page: self.current_page,
            page_count: self.page_count(),
            clip_height_px: self.page_height_px,
            translate_y_px: page_translation(self.current_page, self.page_height_px),
            visible_block_ids,
        }
    }

    pub fn next_page(&mut self) -> u32 {
        self.current_page = self.clamp(self.current_page.saturating_add(1));
        self.current_page
    }

    pub fn previous_page(&mut self) -> u32 {
        self.current_page = self.clamp(self.current_page.saturating_sub(1));
        self.current_page
    }

    pub fn go_to(&mut self, page: u32) -> u32 {
        self.current_page = self.clamp(page);
        self.current_page
    }

    fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.page_count.max(1))
    }
}

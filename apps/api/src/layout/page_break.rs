//! Page-Break Calculator: pushes blocks that would be cut by a virtual page boundary.
//!
//! # Rules (single forward pass, document order)
//! - Section title: push to the next page if less than `min_space.section_title` px remain.
//! - Entry header:  push if less than `min_space.header` px remain.
//! - Text unit:     push if its bottom edge crosses `page_end - unit_tolerance_px`.
//!
//! A pushed block receives `margin = space_remaining + push_buffer_px`. The margin moves
//! that block and every block after it; earlier blocks are never revisited.
//!
//! Greedy on purpose: recomputation runs on every (debounced) edit and must not
//! oscillate between decisions. No backtracking, no global packing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ────────────────────────────────────────────────────────────────────────────
// Input types
// ────────────────────────────────────────────────────────────────────────────

/// Layout category of a block. Decides which push rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockCategory {
    SectionTitle,
    EntryHeader,
    TextUnit,
}

/// An atomic, non-splittable layout unit with measured geometry.
///
/// `offset_px` is relative to the document top, already divided by the preview scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub category: BlockCategory,
    pub offset_px: f64,
    pub height_px: f64,
}

impl Block {
    pub fn new(id: impl Into<String>, category: BlockCategory, offset_px: f64, height_px: f64) -> Self {
        Self {
            id: id.into(),
            category,
            offset_px,
            height_px,
        }
    }

    /// Builds a block from raw on-screen measurements taken at `scale` zoom.
    pub fn from_measured(
        id: impl Into<String>,
        category: BlockCategory,
        raw_offset_px: f64,
        raw_height_px: f64,
        scale: f64,
    ) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self::new(id, category, raw_offset_px / scale, raw_height_px / scale)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_HEIGHT_PX: f64 = 1123.0;
pub const DEFAULT_SECTION_TITLE_MIN_SPACE_PX: f64 = 150.0;
pub const DEFAULT_HEADER_MIN_SPACE_PX: f64 = 80.0;
pub const DEFAULT_UNIT_TOLERANCE_PX: f64 = 5.0;
pub const DEFAULT_PUSH_BUFFER_PX: f64 = 60.0;

/// Minimum trailing space a heading needs on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinSpace {
    pub section_title: f64,
    pub header: f64,
}

impl Default for MinSpace {
    fn default() -> Self {
        Self {
            section_title: DEFAULT_SECTION_TITLE_MIN_SPACE_PX,
            header: DEFAULT_HEADER_MIN_SPACE_PX,
        }
    }
}

/// Tuning knobs for the calculator. The defaults were tuned against the classic
/// template's font size and line height; treat them as defaults, not truths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// One virtual A4 page at 96 DPI.
    pub page_height_px: f64,
    pub min_space: MinSpace,
    pub unit_tolerance_px: f64,
    pub push_buffer_px: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_height_px: DEFAULT_PAGE_HEIGHT_PX,
            min_space: MinSpace::default(),
            unit_tolerance_px: DEFAULT_UNIT_TOLERANCE_PX,
            push_buffer_px: DEFAULT_PUSH_BUFFER_PX,
        }
    }
}

impl LayoutConfig {
    /// Replaces unusable values (non-finite, negative, zero page height) with defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pick = |value: f64, fallback: f64| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        };
        let page_height_px = if self.page_height_px.is_finite() && self.page_height_px > 0.0 {
            self.page_height_px
        } else {
            defaults.page_height_px
        };
        Self {
            page_height_px,
            min_space: MinSpace {
                section_title: pick(self.min_space.section_title, defaults.min_space.section_title),
                header: pick(self.min_space.header, defaults.min_space.header),
            },
            unit_tolerance_px: pick(self.unit_tolerance_px, defaults.unit_tolerance_px),
            push_buffer_px: pick(self.push_buffer_px, defaults.push_buffer_px),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Where a block ended up after margins were applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
    pub effective_offset_px: f64,
    pub height_px: f64,
    /// 1-based page the block starts on.
    pub page: u32,
    pub pushed: bool,
}

/// Margin assignment plus derived page count for one document snapshot.
/// Ephemeral: recomputed from scratch on every change, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    /// Push-down margin per pushed block id. Blocks that fit are absent.
    pub margins: HashMap<String, f64>,
    pub page_count: u32,
    pub placements: Vec<Placement>,
}

impl LayoutResult {
    pub fn empty() -> Self {
        Self {
            margins: HashMap::new(),
            page_count: 1,
            placements: Vec::new(),
        }
    }

    /// Bottom edge of the laid-out document.
    pub fn document_height_px(&self) -> f64 {
        self.placements
            .iter()
            .map(|p| p.effective_offset_px + p.height_px)
            .fold(0.0, f64::max)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core algorithm
// ────────────────────────────────────────────────────────────────────────────

/// 0-based page index as a float, so huge offsets never overflow an integer.
fn page_index(offset_px: f64, page_height_px: f64) -> f64 {
    (offset_px / page_height_px).floor()
}

/// 1-based page an offset falls on. Saturates at `u32::MAX`.
pub fn page_for_offset(offset_px: f64, page_height_px: f64) -> u32 {
    (page_index(offset_px, page_height_px) + 1.0) as u32
}

/// Space between `offset_px` and the end of its page. Never negative.
pub fn space_remaining(offset_px: f64, page_height_px: f64) -> f64 {
    ((page_index(offset_px, page_height_px) + 1.0) * page_height_px - offset_px).max(0.0)
}

/// `ceil(height / page)`, never below one page.
pub fn page_count_for_height(document_height_px: f64, page_height_px: f64) -> u32 {
    if !(document_height_px.is_finite() && document_height_px > 0.0) {
        return 1;
    }
    ((document_height_px / page_height_px).ceil() as u32).max(1)
}

/// Runs the forward-only pass over `blocks` (document order) and assigns push-down margins.
///
/// Total over any input: bad geometry is clamped, oversized blocks overflow uncorrected.
pub fn calculate_layout(blocks: &[Block], config: &LayoutConfig) -> LayoutResult {
    let config = config.sanitized();
    let page_height = config.page_height_px;

    if blocks.is_empty() {
        return LayoutResult::empty();
    }

    let mut margins: HashMap<String, f64> = HashMap::with_capacity(blocks.len() / 4);
    let mut placements = Vec::with_capacity(blocks.len());
    // Sum of margins assigned so far; shifts every later block.
    let mut shift = 0.0_f64;

    for block in blocks {
        let height = clamp_non_negative(block.height_px);
        let offset = clamp_non_negative(block.offset_px) + shift;

        let page = page_for_offset(offset, page_height);
        let remaining = space_remaining(offset, page_height);
        let page_end = offset + remaining;

        let pushed = should_push(block.category, offset, height, remaining, page_end, &config);

        let effective_offset = if pushed {
            let margin = remaining + config.push_buffer_px;
            if margins.insert(block.id.clone(), margin).is_some() {
                warn!(id = %block.id, "duplicate block id in layout input; keeping the later margin");
            }
            shift += margin;
            debug!(id = %block.id, page, margin, "block pushed to next page");
            offset + margin
        } else {
            offset
        };

        placements.push(Placement {
            id: block.id.clone(),
            effective_offset_px: effective_offset,
            height_px: height,
            page: page_for_offset(effective_offset, page_height),
            pushed,
        });
    }

    let mut result = LayoutResult {
        margins,
        page_count: 1,
        placements,
    };
    result.page_count = page_count_for_height(result.document_height_px(), page_height);
    result
}

fn should_push(
    category: BlockCategory,
    offset: f64,
    height: f64,
    remaining: f64,
    page_end: f64,
    config: &LayoutConfig,
) -> bool {
    let wants_push = match category {
        BlockCategory::SectionTitle => remaining < config.min_space.section_title,
        BlockCategory::EntryHeader => remaining < config.min_space.header,
        BlockCategory::TextUnit => offset + height > page_end - config.unit_tolerance_px,
    };
    if !wants_push {
        return false;
    }

    // A block taller than a page already sitting at the top of one has no remedy.
    let oversized = height > config.page_height_px - config.unit_tolerance_px;
    let offset_in_page = config.page_height_px - remaining;
    !(oversized && offset_in_page <= config.push_buffer_px)
}

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Text metrics: estimates rendered block heights when no browser is around to measure them.
//!
//! Widths are approximated per character class in em units, then greedy word-wrap gives a
//! line count. Good enough for server-side previews and page counts; the browser remains
//! the source of truth for the live editor, which posts real measurements instead.

use serde::{Deserialize, Serialize};

use crate::layout::page_break::Block;
use crate::layout::section_renderer::{ContentBlock, ContentKind};
use crate::models::cv::Template;

/// A4 width at 96 DPI.
pub const A4_WIDTH_PX: f64 = 794.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontFamily {
    Georgia,
    Helvetica,
    Roboto,
    Montserrat,
}

/// Advance widths in em, grouped by character class.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub space: f64,
    /// i, l, j, t, f, r and punctuation such as `.` `,` `'` `|`
    pub narrow: f64,
    pub lowercase: f64,
    /// m, w
    pub wide_lowercase: f64,
    pub uppercase: f64,
    /// M, W
    pub wide_uppercase: f64,
    pub digit: f64,
    /// Everything else, including non-ASCII.
    pub fallback: f64,
}

static GEORGIA: FontMetrics = FontMetrics {
    space: 0.24,
    narrow: 0.30,
    lowercase: 0.50,
    wide_lowercase: 0.80,
    uppercase: 0.68,
    wide_uppercase: 0.92,
    digit: 0.58,
    fallback: 0.55,
};

static HELVETICA: FontMetrics = FontMetrics {
    space: 0.28,
    narrow: 0.26,
    lowercase: 0.54,
    wide_lowercase: 0.80,
    uppercase: 0.68,
    wide_uppercase: 0.88,
    digit: 0.56,
    fallback: 0.56,
};

static ROBOTO: FontMetrics = FontMetrics {
    space: 0.25,
    narrow: 0.25,
    lowercase: 0.53,
    wide_lowercase: 0.82,
    uppercase: 0.65,
    wide_uppercase: 0.86,
    digit: 0.56,
    fallback: 0.55,
};

static MONTSERRAT: FontMetrics = FontMetrics {
    space: 0.26,
    narrow: 0.28,
    lowercase: 0.60,
    wide_lowercase: 0.95,
    uppercase: 0.74,
    wide_uppercase: 0.98,
    digit: 0.62,
    fallback: 0.62,
};

pub fn metrics_for(font: FontFamily) -> &'static FontMetrics {
    match font {
        FontFamily::Georgia => &GEORGIA,
        FontFamily::Helvetica => &HELVETICA,
        FontFamily::Roboto => &ROBOTO,
        FontFamily::Montserrat => &MONTSERRAT,
    }
}

impl FontMetrics {
    pub fn char_width(&self, c: char) -> f64 {
        match c {
            ' ' => self.space,
            'm' | 'w' => self.wide_lowercase,
            'M' | 'W' => self.wide_uppercase,
            'i' | 'l' | 'j' | 't' | 'f' | 'r' | 'I' | '.' | ',' | '\'' | '|' | ':' | ';' | '!' => {
                self.narrow
            }
            'a'..='z' => self.lowercase,
            'A'..='Z' => self.uppercase,
            '0'..='9' => self.digit,
            _ => self.fallback,
        }
    }

    /// Width of `s` in em.
    pub fn measure_str(&self, s: &str) -> f64 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Printed lines for `s` when greedily word-wrapped at `max_width_em`.
    /// Empty text still takes one line (the template keeps the row).
    pub fn wrapped_lines(&self, s: &str, max_width_em: f64) -> u32 {
        let mut lines = 1u32;
        let mut current = 0.0_f64;
        let mut first = true;

        for word in s.split_whitespace() {
            let word_w = self.measure_str(word);
            if word_w > max_width_em {
                // Overlong tokens (URLs) break mid-word in the browser.
                let spill = (word_w / max_width_em).ceil() as u32;
                if !first {
                    lines += 1;
                }
                lines += spill - 1;
                current = word_w - (spill - 1) as f64 * max_width_em;
                first = false;
                continue;
            }
            let space_w = if first { 0.0 } else { self.space };
            if !first && current + space_w + word_w > max_width_em {
                lines += 1;
                current = word_w;
            } else {
                current += space_w + word_w;
                first = false;
            }
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Template styles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindStyle {
    pub font_scale: f64,
    pub space_before_px: f64,
    pub space_after_px: f64,
    pub indent_px: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStyle {
    pub font: FontFamily,
    pub font_size_px: f64,
    pub line_height: f64,
    pub content_width_px: f64,
    pub heading: KindStyle,
    pub entry_header: KindStyle,
    pub paragraph: KindStyle,
    pub list_item: KindStyle,
}

impl TemplateStyle {
    pub fn for_template(template: Template) -> Self {
        match template {
            Template::Classic => Self {
                font: FontFamily::Georgia,
                font_size_px: 14.0,
                line_height: 1.5,
                content_width_px: A4_WIDTH_PX - 2.0 * 48.0,
                heading: kind(1.3, 20.0, 8.0, 0.0),
                entry_header: kind(1.05, 10.0, 4.0, 0.0),
                paragraph: kind(1.0, 0.0, 6.0, 0.0),
                list_item: kind(1.0, 0.0, 2.0, 18.0),
            },
            Template::Modern => Self {
                font: FontFamily::Helvetica,
                font_size_px: 13.0,
                line_height: 1.45,
                // Sidebar takes a third of the page.
                content_width_px: A4_WIDTH_PX * 2.0 / 3.0 - 2.0 * 32.0,
                heading: kind(1.25, 18.0, 6.0, 0.0),
                entry_header: kind(1.0, 8.0, 4.0, 0.0),
                paragraph: kind(1.0, 0.0, 6.0, 0.0),
                list_item: kind(1.0, 0.0, 2.0, 16.0),
            },
            Template::Minimal => Self {
                font: FontFamily::Roboto,
                font_size_px: 13.0,
                line_height: 1.4,
                content_width_px: A4_WIDTH_PX - 2.0 * 56.0,
                heading: kind(1.1, 16.0, 6.0, 0.0),
                entry_header: kind(1.0, 8.0, 2.0, 0.0),
                paragraph: kind(1.0, 0.0, 4.0, 0.0),
                list_item: kind(1.0, 0.0, 2.0, 14.0),
            },
            Template::Creative => Self {
                font: FontFamily::Montserrat,
                font_size_px: 13.0,
                line_height: 1.5,
                content_width_px: A4_WIDTH_PX - 2.0 * 40.0,
                heading: kind(1.45, 24.0, 10.0, 0.0),
                entry_header: kind(1.05, 12.0, 4.0, 0.0),
                paragraph: kind(1.0, 0.0, 6.0, 0.0),
                list_item: kind(1.0, 0.0, 3.0, 20.0),
            },
        }
    }

    fn kind_style(&self, kind: ContentKind) -> &KindStyle {
        match kind {
            ContentKind::Heading => &self.heading,
            ContentKind::EntryHeader => &self.entry_header,
            ContentKind::Paragraph => &self.paragraph,
            ContentKind::ListItem => &self.list_item,
        }
    }

    /// Estimated content height of one block, spacing excluded.
    pub fn block_height_px(&self, block: &ContentBlock) -> f64 {
        let style = self.kind_style(block.kind);
        let metrics = metrics_for(self.font);
        let font_px = self.font_size_px * style.font_scale;
        let width_em = ((self.content_width_px - style.indent_px) / font_px).max(1.0);
        let lines: u32 = block
            .lines
            .iter()
            .map(|line| metrics.wrapped_lines(line, width_em))
            .sum::<u32>()
            .max(1);
        lines as f64 * font_px * self.line_height
    }
}

const fn kind(font_scale: f64, space_before_px: f64, space_after_px: f64, indent_px: f64) -> KindStyle {
    KindStyle {
        font_scale,
        space_before_px,
        space_after_px,
        indent_px,
    }
}

/// Stacks blocks top to bottom and returns their estimated geometry in document order.
pub fn measure_blocks(blocks: &[ContentBlock], style: &TemplateStyle) -> Vec<Block> {
    let mut cursor = 0.0_f64;
    blocks
        .iter()
        .map(|block| {
            let spacing = style.kind_style(block.kind);
            cursor += spacing.space_before_px;
            let height = style.block_height_px(block);
            let measured = Block::new(block.id.clone(), block.kind.category(), cursor, height);
            cursor += height + spacing.space_after_px;
            measured
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

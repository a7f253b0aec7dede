//! Preview pipeline: CV document → content blocks → estimated geometry → layout.

use serde::{Deserialize, Serialize};

use crate::layout::page_break::{
    calculate_layout, page_count_for_height, page_for_offset, Block, LayoutConfig, LayoutResult,
    Placement,
};
use crate::layout::section_renderer::render_sections;
use crate::layout::text_metrics::{measure_blocks, TemplateStyle};
use crate::models::cv::{CvDocument, Template};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLayout {
    pub template: Template,
    pub blocks: Vec<Block>,
    pub layout: LayoutResult,
}

/// Lays out `doc` for `template`. Only paginating templates get push-down margins;
/// the rest are cut into pages at fixed intervals.
pub fn compute_preview(doc: &CvDocument, template: Template, config: &LayoutConfig) -> PreviewLayout {
    let style = TemplateStyle::for_template(template);
    let blocks = measure_blocks(&render_sections(doc), &style);

    let layout = if template.paginates() {
        calculate_layout(&blocks, config)
    } else {
        continuous_layout(&blocks, config)
    };

    PreviewLayout {
        template,
        blocks,
        layout,
    }
}

fn continuous_layout(blocks: &[Block], config: &LayoutConfig) -> LayoutResult {
    let config = config.sanitized();
    let placements: Vec<Placement> = blocks
        .iter()
        .map(|b| {
            let offset = b.offset_px.max(0.0);
            Placement {
                id: b.id.clone(),
                effective_offset_px: offset,
                height_px: b.height_px.max(0.0),
                page: page_for_offset(offset, config.page_height_px),
                pushed: false,
            }
        })
        .collect();
    let mut result = LayoutResult {
        margins: Default::default(),
        page_count: 1,
        placements,
    };
    result.page_count = page_count_for_height(result.document_height_px(), config.page_height_px);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::WorkEntry;

    fn long_cv(entries: usize) -> CvDocument {
        let description = (0..6)
            .map(|i| format!("<li>Delivered initiative {i} across three regions, cutting lead time by 30% and onboarding two partner teams</li>"))
            .collect::<String>();
        CvDocument {
            summary: "Engineer with a decade of experience in payments infrastructure.".to_string(),
            experience: (0..entries)
                .map(|i| WorkEntry {
                    position: format!("Engineer {i}"),
                    company: "Acme".to_string(),
                    start_date: "2015".to_string(),
                    end_date: "2020".to_string(),
                    description: format!("<ul>{description}</ul>"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_document_is_one_page() {
        let preview = compute_preview(&CvDocument::default(), Template::Classic, &LayoutConfig::default());
        assert!(preview.blocks.is_empty());
        assert_eq!(preview.layout.page_count, 1);
    }

    #[test]
    fn test_long_classic_cv_spans_pages_with_margins() {
        let preview = compute_preview(&long_cv(12), Template::Classic, &LayoutConfig::default());
        assert!(preview.layout.page_count >= 2);
        assert!(!preview.layout.margins.is_empty());
        assert_eq!(preview.blocks.len(), preview.layout.placements.len());
    }

    #[test]
    fn test_continuous_template_never_pushes() {
        let preview = compute_preview(&long_cv(12), Template::Modern, &LayoutConfig::default());
        assert!(preview.layout.margins.is_empty());
        assert!(preview.layout.page_count >= 2);
        assert!(preview.layout.placements.iter().all(|p| !p.pushed));
    }

    #[test]
    fn test_classic_needs_at_least_as_many_pages_as_raw_height() {
        let doc = long_cv(12);
        let config = LayoutConfig::default();
        let preview = compute_preview(&doc, Template::Classic, &config);
        let raw_height = preview
            .blocks
            .iter()
            .map(|b| b.offset_px + b.height_px)
            .fold(0.0, f64::max);
        assert!(preview.layout.page_count >= page_count_for_height(raw_height, config.page_height_px));
    }
}

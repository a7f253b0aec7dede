//! Section Renderer: flattens a `CvDocument` into typed content blocks in document order.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use crate::layout::page_break::BlockCategory;
use crate::models::cv::CvDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Heading,
    EntryHeader,
    Paragraph,
    ListItem,
}

impl ContentKind {
    pub fn category(&self) -> BlockCategory {
        match self {
            ContentKind::Heading => BlockCategory::SectionTitle,
            ContentKind::EntryHeader => BlockCategory::EntryHeader,
            ContentKind::Paragraph | ContentKind::ListItem => BlockCategory::TextUnit,
        }
    }
}

/// One renderable unit. `lines` are the text rows the template prints for it
/// (an entry header has a title row and a meta row, everything else has one logical row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: String,
    pub kind: ContentKind,
    pub lines: Vec<String>,
}

impl ContentBlock {
    fn new(id: String, kind: ContentKind, lines: Vec<String>) -> Self {
        Self { id, kind, lines }
    }
}

/// Renders every non-empty section. Order: header, summary, experience, education,
/// projects, skills, languages, certifications.
pub fn render_sections(doc: &CvDocument) -> Vec<ContentBlock> {
    let mut out = Vec::new();

    render_personal(doc, &mut out);

    if !doc.summary.trim().is_empty() {
        out.push(heading("summary", "Summary"));
        push_rich_text(&mut out, "summary", &doc.summary);
    }

    if !doc.experience.is_empty() {
        out.push(heading("experience", "Experience"));
        for (i, entry) in doc.experience.iter().enumerate() {
            let prefix = format!("experience-{i}");
            let end = if entry.current {
                "Present"
            } else {
                entry.end_date.as_str()
            };
            out.push(ContentBlock::new(
                format!("{prefix}-header"),
                ContentKind::EntryHeader,
                non_empty(vec![
                    join_present(&[&entry.position, &entry.company], " — "),
                    join_present(&[&date_range(&entry.start_date, end), &entry.location], " | "),
                ]),
            ));
            push_rich_text(&mut out, &prefix, &entry.description);
        }
    }

    if !doc.education.is_empty() {
        out.push(heading("education", "Education"));
        for (i, entry) in doc.education.iter().enumerate() {
            let prefix = format!("education-{i}");
            out.push(ContentBlock::new(
                format!("{prefix}-header"),
                ContentKind::EntryHeader,
                non_empty(vec![
                    join_present(&[&entry.degree, &entry.institution], " — "),
                    join_present(
                        &[&date_range(&entry.start_date, &entry.end_date), &entry.location],
                        " | ",
                    ),
                ]),
            ));
            push_rich_text(&mut out, &prefix, &entry.description);
        }
    }

    if !doc.projects.is_empty() {
        out.push(heading("projects", "Projects"));
        for (i, project) in doc.projects.iter().enumerate() {
            let prefix = format!("projects-{i}");
            out.push(ContentBlock::new(
                format!("{prefix}-header"),
                ContentKind::EntryHeader,
                non_empty(vec![project.name.clone(), project.link.clone()]),
            ));
            push_rich_text(&mut out, &prefix, &project.description);
        }
    }

    if !doc.skills.is_empty() {
        out.push(heading("skills", "Skills"));
        for (i, skill) in doc.skills.iter().enumerate() {
            out.push(ContentBlock::new(
                format!("skills-{i}"),
                ContentKind::ListItem,
                vec![labelled(&skill.name, &skill.level)],
            ));
        }
    }

    if !doc.languages.is_empty() {
        out.push(heading("languages", "Languages"));
        for (i, language) in doc.languages.iter().enumerate() {
            out.push(ContentBlock::new(
                format!("languages-{i}"),
                ContentKind::ListItem,
                vec![labelled(&language.name, &language.proficiency)],
            ));
        }
    }

    if !doc.certifications.is_empty() {
        out.push(heading("certifications", "Certifications"));
        for (i, cert) in doc.certifications.iter().enumerate() {
            out.push(ContentBlock::new(
                format!("certifications-{i}"),
                ContentKind::ListItem,
                vec![join_present(&[&cert.name, &cert.issuer, &cert.date], ", ")],
            ));
        }
    }

    out
}

fn render_personal(doc: &CvDocument, out: &mut Vec<ContentBlock>) {
    let p = &doc.personal;
    if !p.full_name.trim().is_empty() || !p.job_title.trim().is_empty() {
        out.push(ContentBlock::new(
            "personal-name".to_string(),
            ContentKind::Paragraph,
            non_empty(vec![p.full_name.clone(), p.job_title.clone()]),
        ));
    }
    let contact = join_present(
        &[&p.email, &p.phone, &p.location, &p.website, &p.linkedin],
        " · ",
    );
    if !contact.is_empty() {
        out.push(ContentBlock::new(
            "personal-contact".to_string(),
            ContentKind::Paragraph,
            vec![contact],
        ));
    }
}

fn heading(section: &str, title: &str) -> ContentBlock {
    ContentBlock::new(
        format!("{section}-title"),
        ContentKind::Heading,
        vec![title.to_string()],
    )
}

/// Splits editor HTML into paragraphs and list items and appends them under `prefix`.
fn push_rich_text(out: &mut Vec<ContentBlock>, prefix: &str, html: &str) {
    let mut paragraph_idx = 0;
    let mut item_idx = 0;
    for segment in flatten_rich_text(html) {
        let (id, kind) = match segment.kind {
            SegmentKind::Paragraph => {
                paragraph_idx += 1;
                (format!("{prefix}-p-{}", paragraph_idx - 1), ContentKind::Paragraph)
            }
            SegmentKind::ListItem => {
                item_idx += 1;
                (format!("{prefix}-item-{}", item_idx - 1), ContentKind::ListItem)
            }
        };
        out.push(ContentBlock::new(id, kind, vec![segment.text]));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rich text flattening
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Paragraph,
    ListItem,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

/// Tags that end the running paragraph.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
];

/// Splits rich-text editor output into paragraphs and list items.
/// HTML goes through `scraper` (entities are decoded by the parser); inline formatting
/// is dropped. Plain text without tags splits on blank lines and `- ` / `• ` prefixed lines.
pub(crate) fn flatten_rich_text(input: &str) -> Vec<Segment> {
    if !input.contains('<') {
        return flatten_plain_text(&html_escape::decode_html_entities(input));
    }

    let fragment = Html::parse_fragment(input);
    let mut flattener = Flattener::default();
    flattener.walk(fragment.root_element(), SegmentKind::Paragraph);
    flattener.flush(SegmentKind::Paragraph);
    flattener.segments
}

#[derive(Default)]
struct Flattener {
    segments: Vec<Segment>,
    current: String,
}

impl Flattener {
    fn walk(&mut self, element: ElementRef<'_>, kind: SegmentKind) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.current.push_str(text);
            } else if let Some(child_element) = ElementRef::wrap(child) {
                match child_element.value().name() {
                    "br" => self.current.push(' '),
                    "script" | "style" => {}
                    "li" => {
                        self.flush(kind);
                        self.walk(child_element, SegmentKind::ListItem);
                        self.flush(SegmentKind::ListItem);
                    }
                    name if BLOCK_TAGS.contains(&name) => {
                        self.flush(kind);
                        self.walk(child_element, kind);
                        self.flush(kind);
                    }
                    _ => self.walk(child_element, kind),
                }
            }
        }
    }

    fn flush(&mut self, kind: SegmentKind) {
        let text = collapse_whitespace(&self.current);
        if !text.is_empty() {
            self.segments.push(Segment { kind, text });
        }
        self.current.clear();
    }
}

fn flatten_plain_text(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut paragraph = String::new();

    let push_paragraph = |paragraph: &mut String, segments: &mut Vec<Segment>| {
        let text = collapse_whitespace(paragraph);
        if !text.is_empty() {
            segments.push(Segment {
                kind: SegmentKind::Paragraph,
                text,
            });
        }
        paragraph.clear();
    };

    for line in input.lines() {
        let trimmed = line.trim();
        let bullet = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("• "))
            .or_else(|| trimmed.strip_prefix("* "));
        if let Some(item) = bullet {
            push_paragraph(&mut paragraph, &mut segments);
            let text = collapse_whitespace(item);
            if !text.is_empty() {
                segments.push(Segment {
                    kind: SegmentKind::ListItem,
                    text,
                });
            }
        } else if trimmed.is_empty() {
            push_paragraph(&mut paragraph, &mut segments);
        } else {
            paragraph.push(' ');
            paragraph.push_str(trimmed);
        }
    }
    push_paragraph(&mut paragraph, &mut segments);
    segments
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_present(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn date_range(start: &str, end: &str) -> String {
    join_present(&[start, end], " – ")
}

fn labelled(name: &str, detail: &str) -> String {
    if detail.trim().is_empty() {
        name.trim().to_string()
    } else {
        format!("{}: {}", name.trim(), detail.trim())
    }
}

fn non_empty(lines: Vec<String>) -> Vec<String> {
    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{PersonalInfo, SkillEntry, WorkEntry};

    fn sample_doc() -> CvDocument {
        CvDocument {
            personal: PersonalInfo {
                full_name: "Grace Hopper".to_string(),
                job_title: "Rear Admiral".to_string(),
                email: "grace@navy.mil".to_string(),
                ..Default::default()
            },
            summary: "Pioneer of compilers.".to_string(),
            experience: vec![WorkEntry {
                position: "Programmer".to_string(),
                company: "Harvard".to_string(),
                start_date: "1944".to_string(),
                current: true,
                description: "<p>Worked on the Mark I.</p><ul><li>Wrote the manual</li><li>Found a moth</li></ul>"
                    .to_string(),
                ..Default::default()
            }],
            skills: vec![SkillEntry {
                name: "COBOL".to_string(),
                level: "Expert".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_sections_order_and_ids() {
        let blocks = render_sections(&sample_doc());
        let ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "personal-name",
                "personal-contact",
                "summary-title",
                "summary-p-0",
                "experience-title",
                "experience-0-header",
                "experience-0-p-0",
                "experience-0-item-0",
                "experience-0-item-1",
                "skills-title",
                "skills-0",
            ]
        );
    }

    #[test]
    fn test_kinds_map_to_categories() {
        assert_eq!(ContentKind::Heading.category(), BlockCategory::SectionTitle);
        assert_eq!(ContentKind::EntryHeader.category(), BlockCategory::EntryHeader);
        assert_eq!(ContentKind::Paragraph.category(), BlockCategory::TextUnit);
        assert_eq!(ContentKind::ListItem.category(), BlockCategory::TextUnit);
    }

    #[test]
    fn test_entry_header_shows_present_for_current_role() {
        let blocks = render_sections(&sample_doc());
        let header = blocks.iter().find(|b| b.id == "experience-0-header").unwrap();
        assert_eq!(header.lines[0], "Programmer — Harvard");
        assert_eq!(header.lines[1], "1944 – Present");
    }

    #[test]
    fn test_empty_document_renders_nothing() {
        assert!(render_sections(&CvDocument::default()).is_empty());
    }

    #[test]
    fn test_flatten_rich_text_entities_and_breaks() {
        let segments = flatten_rich_text("<p>R&amp;D<br/>lead &lt;team&gt;</p>");
        assert_eq!(
            segments,
            vec![Segment {
                kind: SegmentKind::Paragraph,
                text: "R&D lead <team>".to_string()
            }]
        );
    }

    #[test]
    fn test_flatten_rich_text_list_items() {
        let segments = flatten_rich_text("<ul><li><strong>Shipped</strong> v2</li><li></li><li>Cut costs</li></ul>");
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::ListItem));
        assert_eq!(segments[0].text, "Shipped v2");
    }

    #[test]
    fn test_flatten_plain_text_bullets_and_paragraphs() {
        let segments = flatten_rich_text("Led the team.\nAcross two sites.\n\n- Hired 4\n• Cut churn");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].kind, SegmentKind::Paragraph);
        assert_eq!(segments[0].text, "Led the team. Across two sites.");
        assert_eq!(segments[1].kind, SegmentKind::ListItem);
        assert_eq!(segments[2].text, "Cut churn");
    }

    #[test]
    fn test_flatten_rich_text_decodes_named_and_numeric_entities() {
        let segments =
            flatten_rich_text("<p>Caf&eacute; lead &#8211; shipped &rsquo;v2&rsquo; &copy;</p>");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Café lead \u{2013} shipped \u{2019}v2\u{2019} ©");
    }

    #[test]
    fn test_flatten_plain_text_decodes_entities() {
        let segments = flatten_rich_text("R&amp;D &#8211; infra\n- Caf&#233; ops");
        assert_eq!(segments[0].text, "R&D \u{2013} infra");
        assert_eq!(segments[1].kind, SegmentKind::ListItem);
        assert_eq!(segments[1].text, "Café ops");
    }

    #[test]
    fn test_flatten_rich_text_text_around_lists() {
        let segments = flatten_rich_text("Intro<ol><li>One</li><li>Two<br>lines</li></ol>Outro");
        let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Paragraph,
                SegmentKind::ListItem,
                SegmentKind::ListItem,
                SegmentKind::Paragraph,
            ]
        );
        assert_eq!(segments[2].text, "Two lines");
        assert_eq!(segments[3].text, "Outro");
    }

    #[test]
    fn test_unterminated_tag_is_kept_as_text() {
        let segments = flatten_rich_text("<p>a < b");
        assert_eq!(segments[0].text, "a < b");
    }
}

//! Report outline and output naming.
//!
//! The outline is a format-agnostic list of sections; the shell maps it onto
//! PDF blocks and decides what goes where [`ReportItem::Diagram`] sits.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::architecture::{complexity_narrative, tech_recommendation};
use crate::project::ProjectData;

const MAX_TEXT_SNIPPETS: usize = 10;
const SNIPPET_PREVIEW_CHARS: usize = 30;
const MAX_SLUG_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportItem {
    Paragraph(String),
    Preformatted(Vec<String>),
    KeyValues(Vec<(String, String)>),
    Bullets(Vec<String>),
    /// Where the architecture diagram belongs.
    Diagram,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub heading: String,
    /// Start the section on a fresh page.
    pub new_page: bool,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutline {
    pub title: String,
    pub metadata: Vec<String>,
    pub sections: Vec<ReportSection>,
}

impl ReportSection {
    fn new(heading: impl Into<String>, items: Vec<ReportItem>) -> Self {
        Self {
            heading: heading.into(),
            new_page: false,
            items,
        }
    }

    fn on_new_page(mut self) -> Self {
        self.new_page = true;
        self
    }
}

/// Lay out the report's sections for `project`.
///
/// `generated_at` is an input so that identical inputs produce an identical outline.
pub fn build_outline(project: &ProjectData, generated_at: DateTime<Utc>) -> ReportOutline {
    let mut metadata = vec![
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Source: {}", project.source_link),
    ];
    if !project.content_hash.is_empty() {
        metadata.push(format!("Content Hash: {}", project.content_hash));
    }

    let mut sections = Vec::new();

    if let Some(overview) = &project.overview {
        sections.push(ReportSection::new(
            "Overview",
            vec![ReportItem::Paragraph(overview.clone())],
        ));
    }

    sections.push(ReportSection::new(
        "Document Summary",
        vec![ReportItem::KeyValues(vec![
            ("File name".to_string(), project.project_name.clone()),
            (
                "Last modified".to_string(),
                project
                    .last_modified
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            ),
            ("Pages".to_string(), project.pages.len().to_string()),
            ("Frames".to_string(), project.frames.len().to_string()),
            ("Components".to_string(), project.components.len().to_string()),
            ("Text nodes".to_string(), project.text_nodes.len().to_string()),
            ("Color styles".to_string(), project.colors.len().to_string()),
        ])],
    ));

    sections.push(ReportSection::new(
        "Screen Analysis",
        vec![ReportItem::Preformatted(screen_analysis(project))],
    ));
    sections.push(ReportSection::new(
        "Component Analysis",
        vec![ReportItem::Preformatted(component_analysis(project))],
    ));
    sections.push(ReportSection::new(
        "Page Structure",
        vec![ReportItem::Preformatted(page_structure(project))],
    ));
    sections.push(ReportSection::new(
        "Text Content Analysis",
        vec![ReportItem::Preformatted(text_analysis(project))],
    ));

    let mut architecture = vec![
        ReportItem::Diagram,
        ReportItem::Paragraph(complexity_narrative(
            project.frames.len(),
            project.components.len(),
        )),
    ];
    let relations = relation_lines(project);
    if !relations.is_empty() {
        architecture.push(ReportItem::Bullets(relations));
    }
    sections.push(ReportSection::new("System Architecture", architecture).on_new_page());

    if !project.key_features.is_empty() {
        sections.push(ReportSection::new(
            "Key Features",
            vec![ReportItem::Bullets(project.key_features.clone())],
        ));
    }

    let rec = tech_recommendation(project.frames.len(), project.components.len());
    let stack = project
        .tech_recommendations
        .clone()
        .unwrap_or(rec.stack);
    sections.push(
        ReportSection::new(
            "Technical Recommendations",
            vec![ReportItem::KeyValues(vec![
                ("Recommended tech stack".to_string(), stack),
                ("Deployment strategy".to_string(), rec.deployment),
                (
                    "Complexity score".to_string(),
                    format!(
                        "{} (Frames: {}, Components: {}, Text: {})",
                        rec.score,
                        project.frames.len(),
                        project.components.len(),
                        project.text_nodes.len()
                    ),
                ),
            ])],
        )
        .on_new_page(),
    );

    for extra in &project.sections {
        sections.push(ReportSection::new(
            extra.title.trim(),
            vec![ReportItem::Paragraph(extra.body.clone())],
        ));
    }

    sections.push(ReportSection::new(
        "Developer Handoff Checklist",
        vec![ReportItem::KeyValues(vec![
            ("Screen designs included".to_string(), yes_no(!project.frames.is_empty())),
            ("Text copy exported".to_string(), yes_no(!project.text_nodes.is_empty())),
            ("Components documented".to_string(), yes_no(!project.components.is_empty())),
            ("Architecture facts".to_string(), project.architecture.len().to_string()),
            (
                "Suggested API services".to_string(),
                "Auth, Content, Component Data, File Export".to_string(),
            ),
        ])],
    ));

    ReportOutline {
        title: format!("Design Analysis: {}", project.project_name),
        metadata,
        sections,
    }
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

fn screen_analysis(project: &ProjectData) -> Vec<String> {
    let mut lines = vec![format!("Screen Count: {}", project.frames.len())];
    if project.frames.is_empty() {
        lines.push("- No frames detected".to_string());
    }
    lines.extend(project.frames.iter().map(|f| {
        format!(
            "- {} ({}x{}, {} children{})",
            f.name,
            f.width,
            f.height,
            f.children_count,
            if f.visible { "" } else { ", hidden" }
        )
    }));
    lines
}

fn component_analysis(project: &ProjectData) -> Vec<String> {
    let mut lines = vec![format!("Components Detected: {}", project.components.len())];
    if project.components.is_empty() {
        lines.push("- No reusable components found".to_string());
    }
    lines.extend(project.components.iter().map(|c| match &c.description {
        Some(description) => format!("- {} / {} ({}): {}", c.name, c.kind, c.page, description),
        None => format!("- {} / {} ({})", c.name, c.kind, c.page),
    }));
    lines
}

fn page_structure(project: &ProjectData) -> Vec<String> {
    let mut lines = vec![format!("Page Structure: {} pages", project.pages.len())];
    lines.extend(
        project
            .pages
            .iter()
            .map(|p| format!("- {}: {} frames", p.name, p.frame_count)),
    );
    lines
}

fn text_analysis(project: &ProjectData) -> Vec<String> {
    let mut lines = vec![format!(
        "Text Content: {} text elements",
        project.text_nodes.len()
    )];

    let mut seen = BTreeSet::new();
    for text in &project.text_nodes {
        let content = text.content.trim();
        if content.chars().count() <= 5 {
            continue;
        }
        let preview: String = content
            .chars()
            .take(SNIPPET_PREVIEW_CHARS)
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect();
        if seen.insert(preview.clone()) {
            lines.push(format!("- \"{preview}...\""));
        }
        if seen.len() == MAX_TEXT_SNIPPETS {
            break;
        }
    }
    lines
}

fn relation_lines(project: &ProjectData) -> Vec<String> {
    project
        .architecture
        .iter()
        .filter(|(_, targets)| !targets.is_empty())
        .map(|(source, targets)| format!("{source} -> {}", targets.join(", ")))
        .collect()
}

/// Request-scoped identifier: a UTC timestamp plus a random nonce.
pub fn request_id(at: DateTime<Utc>, nonce: u32) -> String {
    format!("{}-{nonce:08x}", at.format("%Y%m%d%H%M%S"))
}

/// Filesystem- and URL-safe version of a project name.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SLUG_CHARS)
        .collect();

    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}

/// Name of the PDF generated for `project_name` within request `request_id`.
pub fn pdf_filename(project_name: &str, request_id: &str) -> String {
    format!("{}_{}.pdf", slugify(project_name), request_id)
}

/// Whether `name` could have been produced by [`pdf_filename`].
///
/// Used to reject path traversal on the download route.
pub fn is_safe_filename(name: &str) -> bool {
    name.len() > 4
        && name.ends_with(".pdf")
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ExtraSection, FrameSummary, TextSummary, DEFAULT_PROJECT_NAME};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn text(content: &str) -> TextSummary {
        TextSummary {
            name: "Text".to_string(),
            page: "Home".to_string(),
            content: content.to_string(),
            font_family: None,
            font_size: None,
        }
    }

    #[test]
    fn test_outline_title_uses_default_name() {
        let project = ProjectData::new(None, "https://figma.com/file/abc123/Sample", "abc123");
        let outline = build_outline(&project, at());

        assert_eq!(outline.title, format!("Design Analysis: {DEFAULT_PROJECT_NAME}"));
        assert_eq!(outline.metadata[0], "Generated: 2024-05-01 12:30:00 UTC");
    }

    #[test]
    fn test_outline_always_has_diagram_slot() {
        let project = ProjectData::new(Some("Shop"), "link", "key");
        let outline = build_outline(&project, at());

        let architecture = outline
            .sections
            .iter()
            .find(|s| s.heading == "System Architecture")
            .unwrap();
        assert!(architecture.new_page);
        assert_eq!(architecture.items[0], ReportItem::Diagram);
    }

    #[test]
    fn test_outline_includes_uploaded_content() {
        let mut project = ProjectData::new(Some("Shop"), "link", "key");
        project.overview = Some("A storefront".to_string());
        project.key_features = vec!["Search".to_string()];
        project.tech_recommendations = Some("Rust + Postgres".to_string());
        project.sections = vec![ExtraSection {
            title: "Risks".to_string(),
            body: "Payments".to_string(),
        }];

        let outline = build_outline(&project, at());
        let headings: Vec<&str> = outline.sections.iter().map(|s| s.heading.as_str()).collect();

        assert_eq!(headings[0], "Overview");
        assert!(headings.contains(&"Key Features"));
        assert!(headings.contains(&"Risks"));
        assert_eq!(headings.last(), Some(&"Developer Handoff Checklist"));

        let tech = outline
            .sections
            .iter()
            .find(|s| s.heading == "Technical Recommendations")
            .unwrap();
        match &tech.items[0] {
            ReportItem::KeyValues(pairs) => assert_eq!(pairs[0].1, "Rust + Postgres"),
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn test_outline_is_deterministic() {
        let mut project = ProjectData::new(Some("Shop"), "link", "key");
        project.frames.push(FrameSummary {
            name: "Home".to_string(),
            page: "Main".to_string(),
            width: 375.0,
            height: 812.0,
            children_count: 4,
            visible: true,
        });
        assert_eq!(build_outline(&project, at()), build_outline(&project, at()));
    }

    #[test]
    fn test_text_analysis_dedups_and_skips_short() {
        let mut project = ProjectData::new(Some("Shop"), "link", "key");
        project.text_nodes = vec![
            text("OK"),
            text("Welcome to the shop"),
            text("Welcome to the shop"),
            text("Checkout\nnow please"),
        ];

        let lines = text_analysis(&project);
        assert_eq!(lines[0], "Text Content: 4 text elements");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "- \"Checkout now please...\"");
    }

    #[test]
    fn test_request_id_format() {
        assert_eq!(request_id(at(), 0xdead_beef), "20240501123000-deadbeef");
        assert_eq!(request_id(at(), 1), "20240501123000-00000001");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My App / v2"), "My_App___v2");
        assert_eq!(slugify("  "), "report");
        assert_eq!(slugify("???"), "report");
        assert_eq!(slugify(&"x".repeat(100)).len(), MAX_SLUG_CHARS);
    }

    #[test]
    fn test_pdf_filename_differs_per_request() {
        let a = pdf_filename("Sample", &request_id(at(), 1));
        let b = pdf_filename("Sample", &request_id(at(), 2));

        assert_ne!(a, b);
        assert!(a.ends_with(".pdf"));
        assert!(is_safe_filename(&a));
    }

    #[test]
    fn test_is_safe_filename() {
        assert!(is_safe_filename("Sample_20240501123000-deadbeef.pdf"));
        assert!(!is_safe_filename("../etc/passwd.pdf"));
        assert!(!is_safe_filename("a/b.pdf"));
        assert!(!is_safe_filename(".pdf"));
        assert!(!is_safe_filename("report.txt"));
        assert!(!is_safe_filename("..pdf"));
    }
}

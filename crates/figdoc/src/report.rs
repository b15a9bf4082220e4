use chrono::{DateTime, Utc};
use figdoc_core::project::ProjectData;
use figdoc_core::report::{build_outline, pdf_filename, ReportItem, ReportOutline};
use pdf::{Block, DocumentSpec, EmbeddedImage};

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] pdf::PdfError),

    #[error("Could not store the generated PDF: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// A composed report held in memory.
#[derive(Debug, Clone)]
pub struct PdfArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub pages: usize,
}

const DIAGRAM_CAPTION: &str = "Figure 1: System architecture derived from the design";
const DIAGRAM_UNAVAILABLE: &str =
    "The architecture diagram could not be rendered for this design. The component relations are listed below.";

/// Compose the PDF report for `project`.
///
/// `diagram` may be missing or undecodable; the architecture section then
/// becomes text-only instead of failing the request.
pub fn compose(
    project: &ProjectData,
    diagram: Option<&[u8]>,
    generated_at: DateTime<Utc>,
    request_id: &str,
) -> Result<PdfArtifact, ComposeError> {
    let outline = build_outline(project, generated_at);

    let image = diagram.and_then(|bytes| match pdf::images::prepare_image(bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("[{request_id}] Diagram could not be embedded, using text-only page: {e}");
            None
        }
    });

    let spec = document_spec(&outline, project, image, generated_at);
    let bytes = pdf::compose(&spec)?;
    let pages = pdf::info(&bytes)?.page_count;

    Ok(PdfArtifact {
        bytes,
        filename: pdf_filename(&project.project_name, request_id),
        pages,
    })
}

fn document_spec(
    outline: &ReportOutline,
    project: &ProjectData,
    image: Option<EmbeddedImage>,
    generated_at: DateTime<Utc>,
) -> DocumentSpec {
    let mut blocks = vec![Block::Title(outline.title.clone())];
    blocks.extend(outline.metadata.iter().cloned().map(Block::Meta));

    let mut image = image;
    for section in &outline.sections {
        if section.new_page {
            blocks.push(Block::PageBreak);
        }
        blocks.push(Block::Heading(section.heading.clone()));

        for item in &section.items {
            match item {
                ReportItem::Paragraph(text) => blocks.push(Block::Paragraph(text.clone())),
                ReportItem::Preformatted(lines) => blocks.push(Block::Preformatted(lines.clone())),
                ReportItem::KeyValues(pairs) => blocks.push(Block::KeyValues(pairs.clone())),
                ReportItem::Bullets(items) => blocks.push(Block::Bullets(items.clone())),
                ReportItem::Diagram => match image.take() {
                    Some(image) => {
                        blocks.push(Block::Image(image));
                        blocks.push(Block::Caption(DIAGRAM_CAPTION.to_string()));
                    }
                    None => {
                        blocks.push(Block::Paragraph(DIAGRAM_UNAVAILABLE.to_string()));
                        if project.architecture.is_empty() {
                            blocks.push(Block::Paragraph(
                                "No architecture facts available.".to_string(),
                            ));
                        }
                    }
                },
            }
        }
    }

    DocumentSpec {
        title: outline.title.clone(),
        author: Some("figdoc".to_string()),
        subject: Some(project.source_link.clone()),
        created: Some(generated_at.format("D:%Y%m%d%H%M%SZ").to_string()),
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use figdoc_core::project::{FrameSummary, DEFAULT_PROJECT_NAME};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn project() -> ProjectData {
        let mut project = ProjectData::new(
            Some("Sample"),
            "https://figma.com/file/abc123/Sample",
            "abc123",
        );
        project.frames.push(FrameSummary {
            name: "Landing".to_string(),
            page: "Home".to_string(),
            width: 375.0,
            height: 812.0,
            children_count: 2,
            visible: true,
        });
        project
            .architecture
            .insert("Page: Home".to_string(), vec!["Landing".to_string()]);
        project
    }

    fn diagram_png() -> Vec<u8> {
        crate::diagram::render(&project()).unwrap().png
    }

    #[test]
    fn test_compose_with_diagram() {
        let artifact = compose(
            &project(),
            Some(diagram_png().as_slice()),
            at(),
            "20240501123000-00000001",
        )
        .unwrap();

        assert_eq!(artifact.filename, "Sample_20240501123000-00000001.pdf");
        assert!(artifact.pages >= 2);
        assert!(artifact.bytes.len() > 50_000);

        let text = pdf::extract_text(&artifact.bytes).unwrap();
        assert!(text.contains("Design Analysis: Sample"));
        assert!(text.contains("Figure 1"));
    }

    #[test]
    fn test_compose_corrupt_diagram_is_text_only() {
        let artifact = compose(&project(), Some(b"\x89PNG\r\n\x1a\ngarbage".as_slice()), at(), "id").unwrap();

        let text = pdf::extract_text(&artifact.bytes).unwrap();
        assert!(text.contains("could not be rendered"));
        assert!(text.contains("Page: Home -> Landing"));
    }

    #[test]
    fn test_compose_without_diagram() {
        let project = ProjectData::new(None, "link", "key");
        let artifact = compose(&project, None, at(), "id").unwrap();

        let text = pdf::extract_text(&artifact.bytes).unwrap();
        assert!(text.contains(DEFAULT_PROJECT_NAME));
        assert!(artifact.filename.starts_with("Untitled_Project_"));
    }

    #[test]
    fn test_compose_layout_is_idempotent() {
        let png = diagram_png();
        let a = compose(&project(), Some(png.as_slice()), at(), "20240501123000-00000001").unwrap();
        let b = compose(&project(), Some(png.as_slice()), at(), "20240501123000-00000002").unwrap();

        assert_eq!(a.pages, b.pages);
        assert_eq!(
            pdf::extract_text(&a.bytes).unwrap(),
            pdf::extract_text(&b.bytes).unwrap()
        );
        assert_ne!(a.filename, b.filename);
    }
}

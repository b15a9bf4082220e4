use std::sync::{Arc, LazyLock};

use figdoc_core::diagram::{placeholder_svg, project_svg};
use figdoc_core::project::ProjectData;
use resvg::usvg::fontdb;

const MAX_DIMENSION: u32 = 4096;

/// System fonts, loaded once and shared by every rasterization.
static FONTDB: LazyLock<Arc<fontdb::Database>> = LazyLock::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    log::debug!("Loaded {} font faces from system", db.len());
    Arc::new(db)
});

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid diagram SVG: {0}")]
    Svg(String),

    #[error("Diagram size out of range: {0}x{1}")]
    Size(u32, u32),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// A rendered diagram held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramArtifact {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// True when the project had no architecture facts to draw.
    pub placeholder: bool,
}

/// Rasterize an SVG document to PNG on a white background.
pub fn svg_to_png(svg: &str) -> Result<(Vec<u8>, u32, u32), RenderError> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    let opts = resvg::usvg::Options {
        fontdb: FONTDB.clone(),
        ..Default::default()
    };
    let tree =
        resvg::usvg::Tree::from_str(svg, &opts).map_err(|e| RenderError::Svg(e.to_string()))?;

    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RenderError::Size(width, height));
    }

    let mut pixmap =
        resvg::tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Size(width, height))?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(pixmap.data(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok((png, width, height))
}

/// Render the architecture diagram of `project`.
///
/// A project without architecture facts yields the placeholder diagram.
pub fn render(project: &ProjectData) -> Result<DiagramArtifact, RenderError> {
    let placeholder = project.architecture.is_empty();
    let (png, width, height) = svg_to_png(&project_svg(project))?;

    Ok(DiagramArtifact {
        png,
        width,
        height,
        placeholder,
    })
}

/// Render `project`, degrading to the placeholder and then to nothing.
pub fn render_with_fallback(project: &ProjectData) -> Option<DiagramArtifact> {
    degrade(render(project), &project.project_name)
}

fn degrade(
    rendered: Result<DiagramArtifact, RenderError>,
    project_name: &str,
) -> Option<DiagramArtifact> {
    match rendered {
        Ok(artifact) => return Some(artifact),
        Err(e) => log::warn!("Diagram rendering failed, using placeholder: {e}"),
    }

    match svg_to_png(&placeholder_svg(project_name)) {
        Ok((png, width, height)) => Some(DiagramArtifact {
            png,
            width,
            height,
            placeholder: true,
        }),
        Err(e) => {
            log::warn!("Placeholder rendering failed, report will be text-only: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figdoc_core::diagram::{CANVAS_HEIGHT, CANVAS_WIDTH};

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_render_empty_facts_yields_png() {
        let project = ProjectData::new(None, "link", "key");
        let artifact = render(&project).unwrap();

        assert!(artifact.placeholder);
        assert_eq!(&artifact.png[..8], &PNG_MAGIC);
        assert_eq!(artifact.width, CANVAS_WIDTH as u32);
        assert_eq!(artifact.height, CANVAS_HEIGHT as u32);
    }

    #[test]
    fn test_render_with_facts() {
        let mut project = ProjectData::new(Some("Shop"), "link", "key");
        project
            .architecture
            .insert("Web".to_string(), vec!["API".to_string()]);
        project
            .architecture
            .insert("API".to_string(), vec!["DB".to_string()]);

        let artifact = render(&project).unwrap();
        assert!(!artifact.placeholder);

        let decoded = image::load_from_memory(&artifact.png).unwrap();
        assert_eq!(decoded.width(), artifact.width);
    }

    #[test]
    fn test_render_is_deterministic() {
        let project = ProjectData::new(Some("Shop"), "link", "key");
        assert_eq!(render(&project).unwrap(), render(&project).unwrap());
    }

    #[test]
    fn test_svg_to_png_rejects_garbage() {
        assert!(matches!(svg_to_png("not svg"), Err(RenderError::Svg(_))));
    }

    #[test]
    fn test_svg_to_png_rejects_huge_canvas() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10000" height="10" viewBox="0 0 10000 10"/>"#;
        assert!(matches!(svg_to_png(svg), Err(RenderError::Size(10000, 10))));
    }

    #[test]
    fn test_failed_render_degrades_to_placeholder() {
        let failed = svg_to_png("<svg").map(|(png, width, height)| DiagramArtifact {
            png,
            width,
            height,
            placeholder: false,
        });
        assert!(failed.is_err());

        let artifact = degrade(failed, "Shop").unwrap();

        assert!(artifact.placeholder);
        assert_eq!(&artifact.png[..8], &PNG_MAGIC);
        assert_eq!(artifact.width, CANVAS_WIDTH as u32);
    }

    #[test]
    fn test_render_with_fallback_always_produces_image() {
        let project = ProjectData::new(Some("R&D <Portal>"), "link", "key");
        let artifact = render_with_fallback(&project).unwrap();
        assert_eq!(&artifact.png[..8], &PNG_MAGIC);
    }
}

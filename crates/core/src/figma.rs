//! Figma link parsing and file payload transformation.
//!
//! The shell fetches `GET /v1/files/{key}`; everything between the raw JSON and
//! a populated [`ProjectData`] happens here, without I/O.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::architecture::derive_facts;
use crate::project::{
    ComponentSummary, FrameSummary, PageSummary, ProjectData, TextSummary,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("figma_link is required")]
    Blank,
    #[error("Invalid Figma URL - could not extract file key")]
    Unrecognized,
}

/// Extract the file key from any Figma file, design, prototype or community link.
///
/// Version suffixes such as `abc123:v42` are stripped.
pub fn extract_file_key(link: &str) -> Result<String, LinkError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(LinkError::Blank);
    }

    let patterns = [
        r"figma\.com/(?:file|design|proto)/([A-Za-z0-9:]+)",
        r"figma\.com/community/file/(\d+)",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(key) = re.captures(link).and_then(|c| c.get(1)) {
            let key = key.as_str().split(':').next().unwrap_or_default();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }
    }

    Err(LinkError::Unrecognized)
}

/// Top-level response of the Figma files endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FigmaFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "lastModified")]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub document: FigmaNode,
    #[serde(default)]
    pub styles: BTreeMap<String, FigmaStyle>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FigmaNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub children: Vec<FigmaNode>,
    #[serde(default, rename = "absoluteBoundingBox")]
    pub bounds: Option<BoundingBox>,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextStyle {
    #[serde(default, rename = "fontFamily")]
    pub font_family: Option<String>,
    #[serde(default, rename = "fontSize")]
    pub font_size: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FigmaStyle {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "styleType")]
    pub style_type: Option<String>,
}

/// Short digest identifying one state of a design file.
pub fn content_hash(
    name: &str,
    last_modified: &str,
    frame_count: usize,
    component_count: usize,
) -> String {
    let digest = md5::compute(format!("{name}{last_modified}{frame_count}{component_count}"));
    format!("{digest:x}")[..8].to_string()
}

/// Transform a Figma file payload into project data.
///
/// A missing or blank file name becomes [`crate::project::DEFAULT_PROJECT_NAME`].
pub fn parse_project(file: FigmaFile, source_link: &str, file_key: &str) -> ProjectData {
    let mut project = ProjectData::new(file.name.as_deref(), source_link, file_key);
    project.last_modified = file.last_modified.clone();

    for page in file
        .document
        .children
        .iter()
        .filter(|n| n.node_type == "CANVAS")
    {
        let page_name = if page.name.trim().is_empty() {
            "Page".to_string()
        } else {
            page.name.clone()
        };

        let before = project.frames.len();
        walk(page, &page_name, &mut project);

        project.pages.push(PageSummary {
            id: page.id.clone(),
            name: page_name,
            frame_count: project.frames.len() - before,
        });
    }

    project.colors = file
        .styles
        .iter()
        .filter(|(_, style)| style.style_type.as_deref() == Some("FILL"))
        .map(|(id, style)| style.name.clone().unwrap_or_else(|| id.clone()))
        .collect();

    project.content_hash = content_hash(
        file.name.as_deref().unwrap_or_default(),
        file.last_modified.as_deref().unwrap_or_default(),
        project.frames.len(),
        project.components.len(),
    );

    project.architecture = derive_facts(&project);
    project
}

fn walk(node: &FigmaNode, page: &str, project: &mut ProjectData) {
    match node.node_type.as_str() {
        "FRAME" => {
            let bounds = node.bounds.unwrap_or_default();
            project.frames.push(FrameSummary {
                name: node.name.clone(),
                page: page.to_string(),
                width: bounds.width,
                height: bounds.height,
                children_count: node.children.len(),
                visible: node.visible.unwrap_or(true),
            });
        }
        "COMPONENT" | "INSTANCE" => {
            project.components.push(ComponentSummary {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: node.node_type.clone(),
                page: page.to_string(),
                description: node
                    .description
                    .clone()
                    .filter(|d| !d.trim().is_empty()),
            });
        }
        "TEXT" => {
            let content = node.characters.clone().unwrap_or_default();
            if !content.trim().is_empty() {
                let style = node.style.clone().unwrap_or_default();
                project.text_nodes.push(TextSummary {
                    name: node.name.clone(),
                    page: page.to_string(),
                    content,
                    font_family: style.font_family,
                    font_size: style.font_size,
                });
            }
        }
        _ => {}
    }

    for child in &node.children {
        walk(child, page, project);
    }
}

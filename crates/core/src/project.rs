//! Project data model shared by every pipeline stage.
//!
//! [`ProjectData`] is what the fetcher produces, what the diagram layout reads,
//! and what the report outline is built from. Its `project_name` is always
//! populated: every constructor and merge path runs through
//! [`normalize_project_name`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name used whenever a design or an uploaded report does not provide one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// Component name mapped to the names of the components it talks to.
pub type ArchitectureFacts = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: String,
    pub name: String,
    pub frame_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub name: String,
    pub page: String,
    pub width: f64,
    pub height: f64,
    pub children_count: usize,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub page: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSummary {
    pub name: String,
    pub page: String,
    pub content: String,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
}

/// Free-form section supplied by an uploaded report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraSection {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Everything the diagram and the report need to know about one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub project_name: String,
    pub source_link: String,
    pub file_key: String,
    pub last_modified: Option<String>,
    pub content_hash: String,
    pub pages: Vec<PageSummary>,
    pub frames: Vec<FrameSummary>,
    pub components: Vec<ComponentSummary>,
    pub text_nodes: Vec<TextSummary>,
    pub colors: Vec<String>,
    pub overview: Option<String>,
    pub key_features: Vec<String>,
    pub tech_recommendations: Option<String>,
    pub sections: Vec<ExtraSection>,
    pub architecture: ArchitectureFacts,
}

impl ProjectData {
    /// An empty project for `link`, named after `project_name` or the default.
    pub fn new(project_name: Option<&str>, source_link: &str, file_key: &str) -> Self {
        Self {
            project_name: normalize_project_name(project_name),
            source_link: source_link.to_string(),
            file_key: file_key.to_string(),
            last_modified: None,
            content_hash: String::new(),
            pages: Vec::new(),
            frames: Vec::new(),
            components: Vec::new(),
            text_nodes: Vec::new(),
            colors: Vec::new(),
            overview: None,
            key_features: Vec::new(),
            tech_recommendations: None,
            sections: Vec::new(),
            architecture: ArchitectureFacts::new(),
        }
    }
}

/// Trim `name` and fall back to [`DEFAULT_PROJECT_NAME`] when it is missing or blank.
pub fn normalize_project_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_PROJECT_NAME.to_string(),
    }
}

/// JSON report a user may upload alongside the design link.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadedReport {
    #[serde(default, alias = "name")]
    pub project_name: Option<String>,
    #[serde(default, alias = "description")]
    pub overview: Option<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub tech_recommendations: Option<String>,
    #[serde(default)]
    pub architecture: ArchitectureFacts,
    #[serde(default)]
    pub sections: Vec<ExtraSection>,
}

/// Parse the raw bytes of an uploaded report.
///
/// The upload must be a JSON object; every key inside it is optional.
pub fn parse_uploaded_report(bytes: &[u8]) -> Result<UploadedReport, String> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| format!("report_file is not valid JSON: {e}"))?;

    if !value.is_object() {
        return Err("report_file must contain a JSON object".to_string());
    }

    serde_json::from_value(value).map_err(|e| format!("report_file has an unexpected shape: {e}"))
}

/// Overlay an uploaded report on top of fetched project data.
///
/// Non-blank values from the report win. Architecture facts are replaced
/// wholesale when the report carries any; sections are appended.
pub fn merge_report(mut project: ProjectData, report: UploadedReport) -> ProjectData {
    if let Some(name) = report.project_name.as_deref() {
        if !name.trim().is_empty() {
            project.project_name = normalize_project_name(Some(name));
        }
    }

    if let Some(overview) = non_blank(report.overview) {
        project.overview = Some(overview);
    }

    if let Some(tech) = non_blank(report.tech_recommendations) {
        project.tech_recommendations = Some(tech);
    }

    project.key_features.extend(
        report
            .key_features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty()),
    );

    if !report.architecture.is_empty() {
        project.architecture = report.architecture;
    }

    project.sections.extend(
        report
            .sections
            .into_iter()
            .filter(|s| !s.title.trim().is_empty()),
    );

    project
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

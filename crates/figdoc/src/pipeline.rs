//! Fetch, render and compose, in that order, for one request.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use figdoc_core::figma::{extract_file_key, LinkError};
use figdoc_core::project::{merge_report, parse_uploaded_report, UploadedReport};
use figdoc_core::report::request_id;

use crate::diagram;
use crate::error::Error;
use crate::figma::DesignSource;
use crate::report::{self, ComposeError};
use crate::store::PdfStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Fetching,
    Rendering,
    Composing,
    Responded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Fetching => "fetching",
            Stage::Rendering => "rendering",
            Stage::Composing => "composing",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

struct Progress {
    request_id: String,
    stage: Stage,
}

impl Progress {
    fn advance(&mut self, next: Stage) {
        log::debug!("[{}] {} -> {}", self.request_id, self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, err: Error) -> Error {
        log::debug!("[{}] {} -> {}: {err}", self.request_id, self.stage, Stage::Failed);
        self.stage = Stage::Failed;
        err
    }
}

/// Outcome of a successful generation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Generated {
    pub request_id: String,
    pub project_name: String,
    pub filename: String,
    pub size: usize,
    pub pages: usize,
    pub placeholder_diagram: bool,
    pub text_only: bool,
}

/// Check that `link` is present and names a Figma file.
pub fn validate_link(link: Option<&str>) -> Result<String, Error> {
    let link = link.map(str::trim).unwrap_or_default();
    if link.is_empty() {
        return Err(Error::Validation(LinkError::Blank.to_string()));
    }
    extract_file_key(link).map_err(|e| Error::Validation(e.to_string()))?;
    Ok(link.to_string())
}

/// Parse an optional uploaded report before any work starts.
pub fn validate_report(bytes: Option<&[u8]>) -> Result<Option<UploadedReport>, Error> {
    match bytes {
        Some(bytes) if !bytes.is_empty() => parse_uploaded_report(bytes)
            .map(Some)
            .map_err(Error::Validation),
        _ => Ok(None),
    }
}

pub fn new_request_id() -> String {
    request_id(Utc::now(), rand::random::<u32>())
}

async fn run_blocking<T, F>(f: F) -> Result<T, ComposeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ComposeError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ComposeError::Task(e.to_string()))?
}

/// Run the whole pipeline for a validated link and store the PDF.
pub async fn generate<S: DesignSource>(
    source: &S,
    store: &PdfStore,
    link: &str,
    uploaded: Option<UploadedReport>,
) -> Result<Generated, Error> {
    let mut progress = Progress {
        request_id: new_request_id(),
        stage: Stage::Received,
    };
    let request_id = progress.request_id.clone();

    progress.advance(Stage::Fetching);
    let project = match source.fetch(link).await {
        Ok(project) => project,
        Err(e) => return Err(progress.fail(e.into())),
    };
    let project = match uploaded {
        Some(uploaded) => merge_report(project, uploaded),
        None => project,
    };
    let project = Arc::new(project);

    progress.advance(Stage::Rendering);
    let diagram = {
        let project = project.clone();
        match tokio::task::spawn_blocking(move || diagram::render_with_fallback(&project)).await {
            Ok(diagram) => diagram,
            Err(e) => {
                log::warn!("[{request_id}] Diagram task failed: {e}");
                None
            }
        }
    };
    let placeholder_diagram = diagram.as_ref().is_none_or(|d| d.placeholder);
    let text_only = diagram.is_none();

    progress.advance(Stage::Composing);
    let artifact = {
        let project = project.clone();
        let request_id = request_id.clone();
        let generated_at = Utc::now();
        run_blocking(move || {
            report::compose(
                &project,
                diagram.as_ref().map(|d| d.png.as_slice()),
                generated_at,
                &request_id,
            )
        })
        .await
    };
    let artifact = match artifact {
        Ok(artifact) => artifact,
        Err(e) => return Err(progress.fail(e.into())),
    };

    let size = artifact.bytes.len();
    if let Err(e) = store.save(&artifact.filename, artifact.bytes).await {
        return Err(progress.fail(ComposeError::Storage(e).into()));
    }

    progress.advance(Stage::Responded);
    log::info!(
        "[{request_id}] Generated {} ({} pages, {size} bytes) for \"{}\"",
        artifact.filename,
        artifact.pages,
        project.project_name
    );

    Ok(Generated {
        request_id,
        project_name: project.project_name.clone(),
        filename: artifact.filename,
        size,
        pages: artifact.pages,
        placeholder_diagram,
        text_only,
    })
}

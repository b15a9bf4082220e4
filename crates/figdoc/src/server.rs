use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use figdoc_core::project::{ArchitectureFacts, ProjectData};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::diagram;
use crate::figma::{DesignSource, FigmaClient};
use crate::pipeline::{self, validate_link, validate_report};
use crate::prelude::{eprintln, *};
use crate::store::PdfStore;

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Host to bind to
    #[arg(long, env = "FIGDOC_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "FIGDOC_PORT", default_value = "8002")]
    pub port: u16,

    /// Directory holding generated PDFs until they are downloaded
    #[arg(long, env = "FIGDOC_OUTPUT_DIR", default_value = "generated_pdfs")]
    pub output_dir: PathBuf,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "FIGDOC_MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,

    /// Seconds an undownloaded PDF is kept before it is swept
    #[arg(long, env = "FIGDOC_RETENTION_SECS", default_value = "900")]
    pub retention_secs: u64,
}

pub struct AppState<S> {
    pub source: Arc<S>,
    pub store: PdfStore,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            store: self.store.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub pdf_url: String,
    pub pdf_filename: String,
}

#[derive(Debug, Deserialize)]
pub struct DiagramRequest {
    #[serde(default, alias = "name")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub architecture: ArchitectureFacts,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let client = FigmaClient::new(global.figma_config())
        .map_err(|e| eyre!("Failed to build the Figma client: {e}"))?;
    let store = PdfStore::new(&options.output_dir)
        .with_context(|| f!("Failed to create {}", options.output_dir.display()))?
        .with_retention(std::time::Duration::from_secs(options.retention_secs));

    let swept = store
        .sweep()
        .await
        .with_context(|| f!("Failed to sweep {}", store.dir().display()))?;
    if swept > 0 {
        log::info!("Removed {swept} expired PDFs from {}", store.dir().display());
    }

    if global.verbose {
        eprintln!("Starting figdoc on {}:{}...", options.host, options.port);
        eprintln!("Figma API: {}", global.figma_api_url);
        eprintln!("Output directory: {}", store.dir().display());
    }

    let addr = format!("{}:{}", options.host, options.port);
    let state = AppState {
        source: Arc::new(client),
        store,
    };
    let app_router = router(state, options.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("figdoc listening on http://{addr}");

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router<S: DesignSource>(state: AppState<S>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/generate-pdf", post(generate_pdf::<S>))
        .route("/api/generate-diagram", post(generate_diagram))
        .route("/api/download/{filename}", get(download::<S>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "figdoc",
    }))
}

async fn generate_pdf<S: DesignSource>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, Error> {
    let mut link: Option<String> = None;
    let mut report: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "figma_link" => {
                link = Some(field.text().await.map_err(|e| {
                    Error::Validation(format!("Could not read figma_link: {e}"))
                })?);
            }
            "report_file" => {
                report = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| Error::Validation(format!("Could not read report_file: {e}")))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let link = validate_link(link.as_deref())?;
    let uploaded = validate_report(report.as_deref())?;

    let generated = pipeline::generate(state.source.as_ref(), &state.store, &link, uploaded).await?;

    Ok(Json(GenerateResponse {
        success: true,
        pdf_url: format!("/api/download/{}", generated.filename),
        pdf_filename: generated.filename,
    }))
}

async fn download<S: DesignSource>(
    State(state): State<AppState<S>>,
    Path(filename): Path<String>,
) -> Result<Response, Error> {
    let bytes = state
        .store
        .take(&filename)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
        .ok_or_else(|| Error::NotFound("PDF file not found".to_string()))?;

    log::debug!("Serving {filename} ({} bytes)", bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn generate_diagram(
    Json(request): Json<DiagramRequest>,
) -> Result<Json<serde_json::Value>, Error> {
    let mut project = ProjectData::new(request.project_name.as_deref(), "", "");
    project.architecture = request.architecture;

    let artifact = tokio::task::spawn_blocking(move || diagram::render(&project))
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
        .map_err(|e| Error::Internal(e.to_string()))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&artifact.png);

    Ok(Json(serde_json::json!({
        "success": true,
        "image_b64": format!("data:image/png;base64,{encoded}"),
        "width": artifact.width,
        "height": artifact.height,
    })))
}

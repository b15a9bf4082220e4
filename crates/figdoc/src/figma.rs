use std::future::Future;
use std::time::Duration;

use figdoc_core::figma::{extract_file_key, parse_project, FigmaFile, LinkError};
use figdoc_core::project::ProjectData;

pub const DEFAULT_API_URL: &str = "https://api.figma.com";

#[derive(Debug, Clone)]
pub struct FigmaConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for FigmaConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidLink(#[from] LinkError),

    #[error("Figma denied access to the file (HTTP {status}); check the access token")]
    Unauthorized { status: u16 },

    #[error("Figma file not found (HTTP {status})")]
    NotFound { status: u16 },

    #[error("Figma API returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("Could not reach the Figma API: {0}")]
    Network(String),

    #[error("Unexpected response from the Figma API: {0}")]
    Decode(String),
}

impl FetchError {
    fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FetchError::Unauthorized { status },
            404 => FetchError::NotFound { status },
            _ => FetchError::Upstream { status },
        }
    }

    /// Upstream HTTP status, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Unauthorized { status }
            | FetchError::NotFound { status }
            | FetchError::Upstream { status } => Some(*status),
            _ => None,
        }
    }
}

/// Anything that can turn a design link into project data.
pub trait DesignSource: Send + Sync + 'static {
    fn fetch(&self, link: &str) -> impl Future<Output = Result<ProjectData, FetchError>> + Send;
}

/// [`DesignSource`] backed by the Figma REST API.
#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: reqwest::Client,
    config: FigmaConfig,
}

impl FigmaClient {
    pub fn new(config: FigmaConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn file_url(&self, key: &str) -> String {
        format!("{}/v1/files/{key}", self.config.api_url.trim_end_matches('/'))
    }
}

impl DesignSource for FigmaClient {
    async fn fetch(&self, link: &str) -> Result<ProjectData, FetchError> {
        let link = link.trim();
        let key = extract_file_key(link)?;
        let url = self.file_url(&key);

        log::debug!("Fetching Figma file {key}");

        let mut request = self.http.get(&url);
        if let Some(token) = &self.config.token {
            request = request.header("X-Figma-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let file: FigmaFile = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(parse_project(file, link, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figdoc_core::project::DEFAULT_PROJECT_NAME;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> FigmaClient {
        FigmaClient::new(FigmaConfig {
            api_url: server.uri(),
            token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "name": "Sample",
            "lastModified": "2024-05-01T10:00:00Z",
            "document": {
                "id": "0:0",
                "type": "DOCUMENT",
                "children": [{
                    "id": "0:1",
                    "name": "Home",
                    "type": "CANVAS",
                    "children": [{"id": "1:1", "name": "Landing", "type": "FRAME", "children": []}]
                }]
            },
            "styles": {}
        })
    }

    #[tokio::test]
    async fn test_fetch_sends_token_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/files/abc123"))
            .and(header("X-Figma-Token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&server)
            .await;

        let project = client(&server, Some("secret"))
            .fetch("https://www.figma.com/file/abc123/Sample")
            .await
            .unwrap();

        assert_eq!(project.project_name, "Sample");
        assert_eq!(project.file_key, "abc123");
        assert_eq!(project.frames.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_missing_name_gets_default() {
        let server = MockServer::start().await;
        let mut body = payload();
        body.as_object_mut().unwrap().remove("name");
        Mock::given(method("GET"))
            .and(path("/v1/files/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let project = client(&server, None)
            .fetch("https://figma.com/file/abc123/Sample")
            .await
            .unwrap();

        assert_eq!(project.project_name, DEFAULT_PROJECT_NAME);
    }

    #[tokio::test]
    async fn test_fetch_maps_status_codes() {
        for (code, expected) in [(403, Some(403)), (404, Some(404)), (500, Some(500))] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(code))
                .mount(&server)
                .await;

            let err = client(&server, None)
                .fetch("https://figma.com/file/abc123/Sample")
                .await
                .unwrap_err();
            assert_eq!(err.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_fetch_unauthorized_variant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch("https://figma.com/file/abc123/Sample")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized { status: 401 }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch("https://figma.com/file/abc123/Sample")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unknown_link_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch("https://example.com/not-figma")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidLink(LinkError::Unrecognized)));
    }
}

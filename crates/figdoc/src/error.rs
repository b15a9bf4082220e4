use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::figma::FetchError;
use crate::report::ComposeError;

/// Every way a request can fail, grouped by who has to act on it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Fetch(err) => match err {
                FetchError::InvalidLink(_) => StatusCode::BAD_REQUEST,
                FetchError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                FetchError::NotFound { .. } => StatusCode::NOT_FOUND,
                FetchError::Upstream { .. } | FetchError::Network(_) | FetchError::Decode(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Compose(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Never carries paths or internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Error::Compose(_) | Error::Internal(_) => {
                "Failed to generate the PDF report".to_string()
            }
            // The underlying text may name the configured API address.
            Error::Fetch(FetchError::Network(_) | FetchError::Decode(_)) => {
                "Could not reach the Figma API".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Compose(_) | Error::Internal(_) => {
                log::error!("Request failed: {self}");
            }
            Error::Fetch(_) => {
                log::warn!("Design fetch failed: {self}");
            }
            Error::Validation(_) | Error::NotFound(_) => {
                log::debug!("Client error: {self}");
            }
        }

        let body = serde_json::json!({
            "success": false,
            "detail": self.user_message(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figdoc_core::figma::LinkError;

    #[test]
    fn test_fetch_status_mapping() {
        let cases = [
            (FetchError::Unauthorized { status: 401 }, StatusCode::FORBIDDEN),
            (FetchError::NotFound { status: 404 }, StatusCode::NOT_FOUND),
            (FetchError::Upstream { status: 500 }, StatusCode::BAD_GATEWAY),
            (FetchError::Network("timeout".to_string()), StatusCode::BAD_GATEWAY),
            (FetchError::InvalidLink(LinkError::Unrecognized), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(Error::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = Error::Internal("/var/secret/path exploded".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("/var/secret"));
    }

    #[test]
    fn test_fetch_transport_errors_hide_detail() {
        let network = Error::from(FetchError::Network(
            "error sending request for url (http://10.0.0.7:9000/v1/files/abc)".to_string(),
        ));
        let decode = Error::from(FetchError::Decode("expected value at line 1".to_string()));

        for err in [network, decode] {
            assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
            assert_eq!(err.user_message(), "Could not reach the Figma API");
        }
        assert!(Error::from(FetchError::NotFound { status: 404 })
            .user_message()
            .contains("404"));
    }

    #[test]
    fn test_validation_message_is_shown() {
        let err = Error::Validation("figma_link is required".to_string());
        assert_eq!(err.user_message(), "figma_link is required");
    }
}

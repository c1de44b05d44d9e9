use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the download endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("URL is required")]
    Validation,

    #[error("{0}")]
    Extraction(String),
}

impl ApiError {
    /// Collapses any extractor failure into its human-readable message.
    pub fn extraction(err: anyhow::Error) -> Self {
        ApiError::Extraction(format!("{err:#}"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

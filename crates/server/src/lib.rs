//! Interview Avatar Server
//!
//! HTTP endpoints gluing the conversation planner, the speech pipeline,
//! and the per-user session store together.

pub mod http;
pub mod resume;
pub mod session;
pub mod state;

pub use http::create_router;
pub use session::{Session, SessionStore};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors surfaced to the client
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No resume file uploaded.")]
    MissingFile,

    #[error("Unsupported file type.")]
    UnsupportedFileType,

    #[error("Invalid audio payload.")]
    InvalidAudio,

    #[error("Failed to process resume.")]
    ResumeProcessing(#[source] avatar_core::Error),

    #[error("Failed to process text-to-speech.")]
    TtsPipeline(#[source] avatar_core::Error),

    #[error("Failed to process speech-to-text audio.")]
    StsPipeline(#[source] avatar_core::Error),

    #[error("Upstream voice provider unavailable.")]
    VoicesUpstream(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingFile
            | ServerError::UnsupportedFileType
            | ServerError::InvalidAudio => StatusCode::BAD_REQUEST,
            ServerError::ResumeProcessing(_)
            | ServerError::TtsPipeline(_)
            | ServerError::StsPipeline(_)
            | ServerError::VoicesUpstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!("request failed: {self:?}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_400() {
        assert_eq!(ServerError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::UnsupportedFileType.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_pipeline_errors_are_500() {
        let err = ServerError::TtsPipeline(avatar_core::Error::Other("x".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_bodies_match_client_contract() {
        assert_eq!(
            ServerError::UnsupportedFileType.to_string(),
            "Unsupported file type."
        );
        assert_eq!(ServerError::MissingFile.to_string(), "No resume file uploaded.");
    }
}

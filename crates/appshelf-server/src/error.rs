//! Error types for the AppShelf server.

use appshelf_core::ValidationError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::session::SessionError;

/// Failures of the artifact store, one variant per failure class.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Remote backend misconfigured or unreachable at startup.
    #[error("Remote backend unavailable: {0}")]
    Config(String),

    /// The list query failed or returned a record that could not be decoded.
    #[error("Failed to load artifacts: {0}")]
    Load(String),

    /// The draft was rejected before any backend call.
    #[error("Invalid draft: {0}")]
    Validation(#[from] ValidationError),

    /// The backend rejected the insert.
    #[error("Failed to save artifact: {0}")]
    Write(String),
}

/// The execution context itself could not be created.
///
/// Runtime errors raised by the executed code are not failures of the
/// sandbox; they are rendered inline inside the artifact's mount point.
#[derive(Debug, thiserror::Error)]
pub enum SandboxFailure {
    #[error("Failed to prepare sandbox workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Failed to start interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to pass code to interpreter: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("Sandbox is shutting down")]
    Closed,
}

/// Errors the gallery reports to its collaborators.
///
/// Backend details never cross this boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GalleryError {
    #[error("Please provide code for the app")]
    MissingCode,

    #[error("Could not save the app, please try again")]
    CouldNotSave,
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GalleryError> for AppError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::MissingCode => AppError::BadRequest(err.to_string()),
            GalleryError::CouldNotSave => AppError::Unavailable(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AppError::Unavailable(msg) => {
                let mut response = (StatusCode::SERVICE_UNAVAILABLE, msg).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("5"));
                response
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts_into_store_error() {
        let err: StoreError = ValidationError::EmptyCode.into();
        assert!(matches!(err, StoreError::Validation(ValidationError::EmptyCode)));
        assert_eq!(err.to_string(), "Invalid draft: code must not be empty");
    }

    #[test]
    fn test_gallery_errors_map_to_status_codes() {
        let missing = AppError::from(GalleryError::MissingCode).into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let unsaved = AppError::from(GalleryError::CouldNotSave).into_response();
        assert_eq!(unsaved.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unsaved.headers().get(header::RETRY_AFTER).unwrap(), "5");
    }

    #[test]
    fn test_session_errors_are_bad_requests() {
        let response = AppError::from(SessionError::BlankUserId).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = AppError::Unauthorized("unknown session".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = AppError::Internal("password=hunter2".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

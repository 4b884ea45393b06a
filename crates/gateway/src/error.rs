//! Unified error handling for the gateway API.
//!
//! `ApiError` implements `IntoResponse`, so handlers use `?` and still return
//! the right status code with a JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use session::ErrorKind;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Sign-in or refresh failure
    #[error(transparent)]
    Auth(#[from] ErrorKind),

    /// Session artifact, provider or configuration failure
    #[error(transparent)]
    Session(#[from] session::Error),

    /// Pass-through call to the backend failed in transport
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }
}

fn auth_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::DomainRejected => StatusCode::FORBIDDEN,
        ErrorKind::InvalidCredentials
        | ErrorKind::RefreshAccessTokenError
        | ErrorKind::NoSession => StatusCode::UNAUTHORIZED,
        ErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            ApiError::Auth(kind) => (
                auth_status(*kind),
                kind.as_str().to_string(),
                Some(kind.to_string()),
            ),
            ApiError::Session(e) => {
                tracing::error!("Session error: {:?}", e);
                match e {
                    session::Error::Auth(kind) => {
                        (auth_status(*kind), kind.as_str().to_string(), None)
                    }
                    session::Error::Provider(_) => (
                        StatusCode::BAD_GATEWAY,
                        "Sign-in provider unavailable".to_string(),
                        None,
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        None,
                    ),
                }
            }
            ApiError::Upstream(e) => {
                tracing::error!("Upstream error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Backend unavailable".to_string(),
                    None,
                )
            }
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                format!("{} not found", resource),
                None,
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

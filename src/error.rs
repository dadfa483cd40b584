//! Error taxonomy
//!
//! - [`ApiError`] is what handlers return; it maps onto an HTTP status and a
//!   `{"error": "..."}` body.
//! - [`LinkError`] comes out of the link registry.
//! - [`EnrichmentError`] covers the best-effort visit side effects (geo lookup,
//!   notification, log append). These are logged and never reach a caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Link not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("decoyUrl cannot be empty")]
    EmptyDestination,
    #[error("decoyUrl is not usable as a redirect target")]
    InvalidDestination,
    #[error("link not found")]
    NotFound,
    #[error("failed to generate a unique link id after {0} attempts")]
    IdSpaceExhausted(usize),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::EmptyDestination | LinkError::InvalidDestination => {
                ApiError::Validation(err.to_string())
            }
            LinkError::NotFound => ApiError::NotFound,
            LinkError::IdSpaceExhausted(_) => ApiError::Internal(anyhow::Error::new(err)),
            LinkError::Storage(inner) => ApiError::Internal(inner),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("geolocation lookup failed: {0}")]
    Geo(String),
    #[error("notification dispatch failed: {0}")]
    Notify(String),
    #[error("visit log append failed: {0}")]
    Log(#[from] std::io::Error),
}

impl EnrichmentError {
    pub fn geo(err: impl std::fmt::Display) -> Self {
        EnrichmentError::Geo(err.to_string())
    }

    pub fn notify(err: impl std::fmt::Display) -> Self {
        EnrichmentError::Notify(err.to_string())
    }
}

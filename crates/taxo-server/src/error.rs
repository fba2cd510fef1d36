//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::ResponseEnvelope;
use crate::features::shared::RequestValidationError;
use crate::features::terms::ResolveTermsError;
use crate::features::tree::BuildTreeError;

/// Errors returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request; the message is sent to the client as `reason`
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Term not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) | ApiError::MethodNotAllowed => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = match self {
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                ResponseEnvelope::failed(message)
            },
            other => ResponseEnvelope::rejected(other.to_string()),
        };

        envelope.with_status(status)
    }
}

impl From<RequestValidationError> for ApiError {
    fn from(err: RequestValidationError) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}

impl From<ResolveTermsError> for ApiError {
    fn from(err: ResolveTermsError) -> Self {
        match err {
            ResolveTermsError::InvalidArgument(e) => e.into(),
            ResolveTermsError::NotFound(ids) => {
                tracing::debug!(?ids, "No name found for requested taxa");
                ApiError::NotFound
            },
            ResolveTermsError::Source(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<BuildTreeError> for ApiError {
    fn from(err: BuildTreeError) -> Self {
        match err {
            BuildTreeError::InvalidArgument(e) => e.into(),
            BuildTreeError::NoTaxIds => ApiError::InvalidArgument(err.to_string()),
            BuildTreeError::NotFound(ids) => {
                tracing::debug!(?ids, "None of the requested taxa exist");
                ApiError::NotFound
            },
            BuildTreeError::UnnamedTaxa(_) | BuildTreeError::Source(_) => {
                ApiError::Internal(err.to_string())
            },
        }
    }
}

//! Error types for the gateway crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use algobank_core::CoreError;
use algobank_store::StoreError;
use algobank_validator::{FailureKind, ValidationFailure};

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// One or more request fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// An error propagated from the store layer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The request is malformed in a way no field validator covers.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<CoreError> for GatewayError {
    fn from(e: CoreError) -> Self {
        GatewayError::InvalidRequest(e.to_string())
    }
}

/// One `{field, reason}` entry of an error body.
#[derive(Debug, Serialize)]
pub struct FailureEntry<'a> {
    pub field: &'a str,
    pub reason: &'a str,
}

impl GatewayError {
    /// Status code the error is answered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(failure) => match failure.kind() {
                FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                FailureKind::Invalid => StatusCode::BAD_REQUEST,
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::Conflict => StatusCode::CONFLICT,
            },
            GatewayError::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            GatewayError::Store(e) if e.is_conflict() => StatusCode::CONFLICT,
            GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn failure_entries(&self) -> Vec<FailureEntry<'_>> {
        match self {
            GatewayError::Validation(failure) => failure
                .failures
                .iter()
                .flat_map(|f| {
                    f.reasons.iter().map(move |reason| FailureEntry {
                        field: &f.field,
                        reason,
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = json!({
            "ok": false,
            "error": self.to_string(),
            "failures": self.failure_entries(),
        });
        (status, Json(body)).into_response()
    }
}

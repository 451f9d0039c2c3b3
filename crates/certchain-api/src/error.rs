//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation, storage and blob errors to HTTP status codes with a JSON
//! body carrying a code, a message and the fine-grained `kind`. The message
//! is repeated as a top-level string for clients that render the body's
//! `message` directly.
//! Storage and internal failure messages are logged, never returned.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use certchain_core::ValidationError;
use certchain_registry::SubmitError;
use certchain_store::StorageWriteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::blobs::BlobError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Same text as `error.message`.
    pub message: String,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// `{"kind": ...}` with the fine-grained error kind, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed domain validation (422).
    #[error("{message}")]
    Validation { kind: &'static str, message: String },

    /// Request could not be parsed (400).
    #[error("bad request: {message}")]
    BadRequest { kind: &'static str, message: String },

    /// An uploaded blob exceeds the size ceiling (413).
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The record did not durably land (500). Message is logged only.
    #[error("storage error: {message}")]
    Storage { kind: &'static str, message: String },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            kind: "malformed_request",
            message: message.into(),
        }
    }

    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Validation { kind, .. }
            | Self::BadRequest { kind, .. }
            | Self::Storage { kind, .. } => Some(*kind),
            Self::PayloadTooLarge(_) => Some("payload_too_large"),
            Self::NotFound(_) | Self::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Storage { .. } => "The certificate could not be stored".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Storage { .. } | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
            }
            _ => tracing::debug!(error = %self, code, "request rejected"),
        }

        let body = ErrorBody {
            success: false,
            message: message.clone(),
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.kind().map(|kind| serde_json::json!({ "kind": kind })),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidContentHash { .. } => Self::BadRequest {
                kind: err.kind(),
                message: err.to_string(),
            },
            _ => Self::Validation {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

impl From<StorageWriteError> for AppError {
    fn from(err: StorageWriteError) -> Self {
        Self::Storage {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => e.into(),
            SubmitError::Storage(e) => e.into(),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            BlobError::Io { .. } => Self::Storage {
                kind: err.kind(),
                message: err.to_string(),
            },
            BlobError::InvalidRef(e) => e.into(),
            BlobError::UnsupportedMediaType { .. } | BlobError::Empty { .. } => {
                Self::Validation {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        Self::bad_request(err.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::bad_request(err.body_text())
        }
    }
}

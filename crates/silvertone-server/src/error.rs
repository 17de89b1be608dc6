//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"detail": "..."}` with a status that
//! separates client faults (4xx) from server faults (5xx).

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub detail: String,
}

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The process has no provider bound.
    #[error("{model} model is not loaded")]
    ModelNotLoaded {
        /// `"transcription"` or `"emotion"`.
        model: &'static str,
    },

    /// Uploaded audio could not be decoded.
    #[error("audio decode error: {0}")]
    BadAudio(String),

    /// The provider failed while running.
    #[error("model inference error: {0}")]
    Inference(String),

    /// Request body rejected before reaching the service.
    #[error("{message}")]
    InvalidRequest {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Extractor message.
        message: String,
    },

    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a 422 validation failure.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelNotLoaded { .. } | Self::Inference(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BadAudio(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::InvalidRequest {
                status,
                message: err.body_text(),
            }
        } else {
            Self::unprocessable(err.body_text())
        }
    }
}

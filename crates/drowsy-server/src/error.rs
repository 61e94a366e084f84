//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drowsy_core::FrameError;
use serde_json::json;
use tracing::{debug, error};

/// Failure of a request, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The multipart body is missing the `frame` field or is malformed.
    #[error("No frame provided")]
    NoFrame,

    /// The request body exceeded the configured limit.
    #[error("Frame too large")]
    PayloadTooLarge,

    /// The frame bytes do not decode.
    #[error("{0}")]
    InvalidImage(String),

    /// Anything else.
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoFrame | Self::InvalidImage(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FrameError> for ApiError {
    fn from(err: FrameError) -> Self {
        match err {
            e @ FrameError::InvalidImage(_) => Self::InvalidImage(e.to_string()),
            FrameError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        debug!("Malformed multipart body: {err}");
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::NoFrame
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(ref e) = self {
            error!("Frame processing failed: {e:#}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

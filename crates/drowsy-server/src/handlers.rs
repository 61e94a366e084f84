//! Request handlers.

use std::sync::Arc;

use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use drowsy_core::FrameVerdict;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::router::AppState;

/// Multipart field carrying the encoded frame.
const FRAME_FIELD: &str = "frame";

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /process_frame`
pub async fn process_frame(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FrameVerdict>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected multipart request: {e}");
        ApiError::NoFrame
    })?;

    let bytes = read_frame(&mut multipart).await?;
    debug!("Received frame of {} bytes", bytes.len());

    let pipeline = Arc::clone(&state.pipeline);
    let verdict = tokio::task::spawn_blocking(move || pipeline.process_frame(&bytes))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("Frame worker failed: {e}")))??;

    Ok(Json(verdict))
}

/// Returns the bytes of the first `frame` field, skipping any other fields.
async fn read_frame(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FRAME_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(ApiError::NoFrame)
}

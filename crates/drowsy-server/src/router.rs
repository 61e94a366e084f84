//! Route table and shared state.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use drowsy_core::FramePipeline;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers;

/// Default maximum request body size (16 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The loaded pipeline; read-only across requests.
    pub pipeline: Arc<FramePipeline>,
}

/// Builds the application router.
pub fn build_router(pipeline: Arc<FramePipeline>, body_limit: usize) -> Router {
    Router::new()
        .route("/process_frame", post(handlers::process_frame))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(map_response(oversized_as_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Rewrites the body limit layer's plain-text 413 into the JSON error shape.
async fn oversized_as_json(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge.into_response()
    } else {
        response
    }
}

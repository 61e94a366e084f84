//! Drowsy Server - HTTP surface for single-frame drowsiness detection.
//!
//! Exposes the frame pipeline over `POST /process_frame` and carries the
//! layered configuration shared by the `drowsy` binary.

pub mod config;
mod error;
mod handlers;
mod router;

pub use error::ApiError;
pub use router::{build_router, AppState, DEFAULT_BODY_LIMIT};

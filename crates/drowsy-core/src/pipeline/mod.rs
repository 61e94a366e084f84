//! Per-frame drowsiness pipeline.
//!
//! Decodes a frame, asks the landmark provider for the first face, crops the
//! eyes and mouth, runs both classifiers and fuses their outputs into a
//! [`FrameVerdict`](crate::domain::FrameVerdict).

mod config;
mod error;
mod frame;
pub mod fusion;

pub use config::{defaults, PipelineConfig};
pub use error::FrameError;
pub use frame::{decode_frame, FramePipeline};

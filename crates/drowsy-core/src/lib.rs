//! Drowsy Core - Domain logic, frame pipeline and inference
//!
//! This crate contains the domain types, capability ports, landmark geometry,
//! the per-frame drowsiness pipeline and the candle models behind it.

pub mod domain;
pub mod geometry;
pub mod inference;
pub mod pipeline;
pub mod ports;

pub use domain::{
    BoundingBox, EyeResult, EyeStatus, FeatureCrop, FrameVerdict, Landmarks, MouthResult,
    NormalizedCrop, Point, YawnStatus,
};
pub use pipeline::{FrameError, FramePipeline, PipelineConfig};
pub use ports::{ConfidencePredictor, LandmarkProvider};

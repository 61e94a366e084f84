//! Test support utilities for drowsy-watch.
//!
//! Provides mock capabilities, synthetic landmark sets and encoded frames for
//! exercising the frame pipeline and the HTTP surface without model weights.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use drowsy_core::{FramePipeline, PipelineConfig};
//! use drowsy_test_support::{LandmarkBuilder, MockLandmarkProvider, MockPredictor, SyntheticFrameBuilder};
//!
//! let pipeline = FramePipeline::new(
//!     Arc::new(MockLandmarkProvider::with_face(LandmarkBuilder::new().build())),
//!     Arc::new(MockPredictor::fixed(0.9)),
//!     Arc::new(MockPredictor::fixed(0.1)),
//!     PipelineConfig::default(),
//! );
//!
//! let verdict = pipeline.process_frame(&SyntheticFrameBuilder::png(640, 480)).unwrap();
//! assert_eq!(verdict.eyes.len(), 2);
//! ```

mod builders;
mod mocks;

pub use builders::{LandmarkBuilder, SyntheticFrameBuilder};
pub use mocks::{MockLandmarkProvider, MockPredictor};

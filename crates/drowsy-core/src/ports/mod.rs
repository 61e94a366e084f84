//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the frame pipeline and the
//! pretrained models it delegates to.

mod landmark_provider;
mod predictor;

pub use landmark_provider::LandmarkProvider;
pub use predictor::ConfidencePredictor;

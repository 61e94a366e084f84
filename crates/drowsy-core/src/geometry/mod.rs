//! Landmark geometry: feature index sets, region extraction and mouth aspect ratio.

mod aspect;
pub mod indices;
mod region;

pub use aspect::mouth_aspect_ratio;
pub use region::{extract_feature_region, feature_bbox};

//! Core domain types for per-frame drowsiness analysis.

mod landmarks;
mod region;
mod verdict;

pub use landmarks::{Landmarks, Point};
pub use region::{BoundingBox, FeatureCrop, NormalizedCrop};
pub use verdict::{EyeResult, EyeStatus, FrameVerdict, MouthResult, YawnStatus};

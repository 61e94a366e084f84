//! Landmark provider port for face landmark detection.

use image::RgbImage;

use crate::domain::Landmarks;

/// Port for locating facial landmarks in a frame.
pub trait LandmarkProvider: Send + Sync {
    /// Returns the landmarks of the first detected face, or `None` if no face was found.
    ///
    /// Coordinates are normalized to the dimensions of `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if detection itself fails (not when no face is present).
    fn detect(&self, frame: &RgbImage) -> anyhow::Result<Option<Landmarks>>;
}

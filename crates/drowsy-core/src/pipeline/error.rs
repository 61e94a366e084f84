//! Frame pipeline errors.

/// Failure while processing a single frame.
///
/// No-detection outcomes are not errors; they are reported through the verdict.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The submitted bytes are not a decodable image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Detection or classification failed unexpectedly.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FrameError {
    /// Returns true if the caller supplied bad input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidImage(_))
    }
}

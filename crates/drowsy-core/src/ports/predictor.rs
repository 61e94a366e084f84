//! Classifier port for binary crop classification.

use crate::domain::NormalizedCrop;

/// Port for a pretrained binary classifier over fixed-size crops.
pub trait ConfidencePredictor: Send + Sync {
    /// Returns the positive-class confidence in `[0, 1]` for a single crop.
    ///
    /// # Errors
    ///
    /// Returns an error if the crop does not match the model input or inference fails.
    fn predict(&self, input: &NormalizedCrop) -> anyhow::Result<f32>;
}

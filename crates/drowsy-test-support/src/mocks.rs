//! Mock implementations of core port traits.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use anyhow::anyhow;
use drowsy_core::domain::{Landmarks, NormalizedCrop};
use drowsy_core::ports::{ConfidencePredictor, LandmarkProvider};
use image::RgbImage;

enum Detection {
    Face(Landmarks),
    NoFace,
    Fail(String),
}

/// Mock implementation of `LandmarkProvider` for testing.
///
/// Returns a canned detection and records the size of every frame it sees.
pub struct MockLandmarkProvider {
    detection: Detection,
    frames: Mutex<Vec<(u32, u32)>>,
}

impl MockLandmarkProvider {
    fn new(detection: Detection) -> Self {
        Self {
            detection,
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Always reports a face with the given landmarks.
    #[must_use]
    pub fn with_face(landmarks: Landmarks) -> Self {
        Self::new(Detection::Face(landmarks))
    }

    /// Never finds a face.
    #[must_use]
    pub fn no_face() -> Self {
        Self::new(Detection::NoFace)
    }

    /// Fails every call with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(Detection::Fail(message.into()))
    }

    /// Dimensions of each frame passed to `detect`, in call order.
    #[must_use]
    pub fn frames(&self) -> Vec<(u32, u32)> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `detect` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl LandmarkProvider for MockLandmarkProvider {
    fn detect(&self, frame: &RgbImage) -> anyhow::Result<Option<Landmarks>> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.dimensions());

        match &self.detection {
            Detection::Face(landmarks) => Ok(Some(landmarks.clone())),
            Detection::NoFace => Ok(None),
            Detection::Fail(message) => Err(anyhow!("{message}")),
        }
    }
}

/// Mock implementation of `ConfidencePredictor` for testing.
///
/// Yields queued confidences in order, repeating the last one once the queue
/// is drained. Records the dimensions of every crop it is given.
pub struct MockPredictor {
    queue: Mutex<VecDeque<f32>>,
    last: Mutex<f32>,
    failure: Option<String>,
    inputs: Mutex<Vec<(u32, u32)>>,
}

impl MockPredictor {
    /// Always returns `confidence`.
    #[must_use]
    pub fn fixed(confidence: f32) -> Self {
        Self::sequence(vec![confidence])
    }

    /// Returns `confidences` in order, then keeps repeating the last value.
    #[must_use]
    pub fn sequence(confidences: Vec<f32>) -> Self {
        let last = confidences.last().copied().unwrap_or(0.0);
        Self {
            queue: Mutex::new(confidences.into()),
            last: Mutex::new(last),
            failure: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::fixed(0.0)
        }
    }

    /// Crop dimensions passed to `predict`, in call order.
    #[must_use]
    pub fn inputs(&self) -> Vec<(u32, u32)> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `predict` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ConfidencePredictor for MockPredictor {
    fn predict(&self, input: &NormalizedCrop) -> anyhow::Result<f32> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((input.width, input.height));

        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            *last = next;
        }
        Ok(*last)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn crop(side: u32) -> NormalizedCrop {
        NormalizedCrop::from_image(&RgbImage::new(4, 4), side, side)
    }

    #[test]
    fn test_mock_provider_no_face() {
        let provider = MockLandmarkProvider::no_face();
        assert!(provider.detect(&RgbImage::new(8, 6)).unwrap().is_none());
        assert_eq!(provider.frames(), vec![(8, 6)]);
    }

    #[test]
    fn test_mock_provider_face() {
        let provider = MockLandmarkProvider::with_face(Landmarks::new(vec![]));
        assert!(provider.detect(&RgbImage::new(8, 6)).unwrap().is_some());
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_mock_provider_failing() {
        let provider = MockLandmarkProvider::failing("mesh crashed");
        let err = provider.detect(&RgbImage::new(8, 6)).unwrap_err();
        assert_eq!(err.to_string(), "mesh crashed");
    }

    #[test]
    fn test_mock_predictor_sequence_repeats_last() {
        let predictor = MockPredictor::sequence(vec![0.2, 0.9]);
        assert!((predictor.predict(&crop(4)).unwrap() - 0.2).abs() < f32::EPSILON);
        assert!((predictor.predict(&crop(4)).unwrap() - 0.9).abs() < f32::EPSILON);
        assert!((predictor.predict(&crop(4)).unwrap() - 0.9).abs() < f32::EPSILON);
        assert_eq!(predictor.call_count(), 3);
    }

    #[test]
    fn test_mock_predictor_records_inputs() {
        let predictor = MockPredictor::fixed(0.5);
        predictor.predict(&crop(16)).unwrap();
        predictor.predict(&crop(8)).unwrap();
        assert_eq!(predictor.inputs(), vec![(16, 16), (8, 8)]);
    }

    #[test]
    fn test_mock_predictor_failing() {
        let predictor = MockPredictor::failing("boom");
        assert!(predictor.predict(&crop(4)).is_err());
        assert_eq!(predictor.call_count(), 1);
    }
}

//! Frame pipeline orchestration.

use std::sync::Arc;

use anyhow::Context;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use super::fusion::{eye_status_for, fuse_eye_statuses, yawn_status};
use super::{FrameError, PipelineConfig};
use crate::domain::{
    EyeResult, FeatureCrop, FrameVerdict, Landmarks, MouthResult, NormalizedCrop, YawnStatus,
};
use crate::geometry::{extract_feature_region, indices, mouth_aspect_ratio};
use crate::ports::{ConfidencePredictor, LandmarkProvider};

/// Decodes raw image bytes into an RGB frame of the canonical size.
///
/// # Errors
///
/// Returns [`FrameError::InvalidImage`] if the bytes are empty or not a supported image.
pub fn decode_frame(bytes: &[u8], (width, height): (u32, u32)) -> Result<RgbImage, FrameError> {
    if bytes.is_empty() {
        return Err(FrameError::InvalidImage("empty frame".to_string()));
    }

    let decoded =
        image::load_from_memory(bytes).map_err(|e| FrameError::InvalidImage(e.to_string()))?;
    let rgb = decoded.to_rgb8();

    if rgb.dimensions() == (width, height) {
        return Ok(rgb);
    }

    debug!(
        "Resizing frame {}x{} -> {width}x{height}",
        rgb.width(),
        rgb.height()
    );
    Ok(imageops::resize(&rgb, width, height, FilterType::Triangle))
}

/// Drowsiness pipeline over injected landmark and classifier capabilities.
///
/// Holds only read-only handles, so one instance can serve concurrent requests.
pub struct FramePipeline {
    landmarks: Arc<dyn LandmarkProvider>,
    eye_model: Arc<dyn ConfidencePredictor>,
    yawn_model: Arc<dyn ConfidencePredictor>,
    config: PipelineConfig,
}

impl FramePipeline {
    /// Creates a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        landmarks: Arc<dyn LandmarkProvider>,
        eye_model: Arc<dyn ConfidencePredictor>,
        yawn_model: Arc<dyn ConfidencePredictor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            landmarks,
            eye_model,
            yawn_model,
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decodes `bytes` and analyzes the frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidImage`] for undecodable input and
    /// [`FrameError::Internal`] if a model fails.
    pub fn process_frame(&self, bytes: &[u8]) -> Result<FrameVerdict, FrameError> {
        let frame = decode_frame(bytes, self.config.frame_size)?;
        self.analyze(&frame)
    }

    /// Analyzes an already decoded frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Internal`] if landmark detection or classification fails.
    pub fn analyze(&self, frame: &RgbImage) -> Result<FrameVerdict, FrameError> {
        let Some(landmarks) = self
            .landmarks
            .detect(frame)
            .context("Landmark detection failed")?
        else {
            debug!("No face detected");
            return Ok(FrameVerdict::no_face());
        };

        debug!("Face found with {} landmarks", landmarks.len());

        let eyes = self.classify_eyes(frame, &landmarks)?;
        let eye_status = fuse_eye_statuses(eyes.iter().map(|e| e.status));

        let mouth = self.classify_mouth(frame, &landmarks)?;
        let yawn_status = mouth.as_ref().map_or(YawnStatus::NotDetected, |m| m.status);

        debug!("Verdict: eyes={eye_status}, yawn={yawn_status}");

        Ok(FrameVerdict {
            eye_status,
            eyes,
            yawn_status,
            mouth,
        })
    }

    /// Classifies the left and then the right eye, skipping any that cannot be cropped.
    fn classify_eyes(
        &self,
        frame: &RgbImage,
        landmarks: &Landmarks,
    ) -> Result<Vec<EyeResult>, FrameError> {
        let mut results = Vec::with_capacity(2);

        for (side, eye_indices) in [("left", indices::LEFT_EYE), ("right", indices::RIGHT_EYE)] {
            let Some(crop) =
                extract_feature_region(frame, landmarks, eye_indices, self.config.eye_padding)
            else {
                debug!("{side} eye region not extractable");
                continue;
            };

            let confidence = predict(self.eye_model.as_ref(), &crop, self.config.eye_input_size)
                .with_context(|| format!("Eye classification failed ({side})"))?;
            let status = eye_status_for(confidence, self.config.eye_open_threshold);

            debug!("{side} eye at {:?}: p_open={confidence:.3}, {status}", crop.bbox);
            results.push(EyeResult {
                bbox: crop.bbox,
                status,
            });
        }

        Ok(results)
    }

    fn classify_mouth(
        &self,
        frame: &RgbImage,
        landmarks: &Landmarks,
    ) -> Result<Option<MouthResult>, FrameError> {
        let Some(crop) = extract_feature_region(
            frame,
            landmarks,
            indices::MOUTH_OUTLINE,
            self.config.mouth_padding,
        ) else {
            debug!("Mouth region not extractable");
            return Ok(None);
        };

        let confidence = predict(self.yawn_model.as_ref(), &crop, self.config.yawn_input_size)
            .context("Yawn classification failed")?;
        let mar = mouth_aspect_ratio(landmarks, frame.width(), frame.height());
        let status = yawn_status(
            confidence,
            mar,
            self.config.yawn_threshold,
            self.config.mar_threshold,
        );

        debug!(
            "Mouth at {:?}: p_yawn={confidence:.3}, mar={mar:.3}, {status}",
            crop.bbox
        );

        Ok(Some(MouthResult {
            bbox: crop.bbox,
            status,
            confidence,
        }))
    }
}

fn predict(
    model: &dyn ConfidencePredictor,
    crop: &FeatureCrop,
    (width, height): (u32, u32),
) -> anyhow::Result<f32> {
    let input = NormalizedCrop::from_image(&crop.image, width, height);
    model.predict(&input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap_or_else(|e| panic!("encode: {e}"));
        bytes
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_frame(b"definitely not an image", (640, 480));
        assert!(matches!(err, Err(FrameError::InvalidImage(_))));
    }

    #[test]
    fn test_decode_rejects_empty() {
        let err = decode_frame(&[], (640, 480));
        assert!(matches!(err, Err(ref e) if e.is_client_error()));
    }

    #[test]
    fn test_decode_resizes_to_canonical() {
        let bytes = encode_png(&RgbImage::new(32, 20));
        let frame = decode_frame(&bytes, (640, 480)).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(frame.dimensions(), (640, 480));
    }

    #[test]
    fn test_decode_converts_grayscale_to_rgb() {
        let gray = image::GrayImage::from_pixel(8, 8, image::Luma([200]));
        let mut bytes = Vec::new();
        gray.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap_or_else(|e| panic!("encode: {e}"));

        let frame = decode_frame(&bytes, (8, 8)).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(frame.get_pixel(3, 3).0, [200, 200, 200]);
    }
}

//! [`LandmarkProvider`] backed by the face detector and the face mesh.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use super::blazeface::{BlazeFace, FaceDetection};
use super::face_mesh::{FaceMesh, INPUT_SIZE as MESH_SIZE};
use crate::domain::{Landmarks, Point};
use crate::geometry::indices::{BASE_LANDMARK_COUNT, REFINED_LANDMARK_COUNT};
use crate::ports::LandmarkProvider;

/// Expansion applied to the detector box before running the mesh.
const ROI_SCALE: f32 = 1.5;

/// Landmark model settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSettings {
    /// Upper bound on faces taken from the detector. Only the best is analyzed.
    pub max_num_faces: usize,
    /// Use the iris-refined 478-point mesh.
    pub refine_landmarks: bool,
    /// Minimum detector score for a face.
    pub min_detection_confidence: f32,
    /// Minimum mesh presence score for a face.
    pub min_tracking_confidence: f32,
}

impl Default for LandmarkSettings {
    fn default() -> Self {
        Self {
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl LandmarkSettings {
    /// Number of landmarks the mesh weights must regress.
    #[must_use]
    pub const fn num_landmarks(&self) -> usize {
        if self.refine_landmarks {
            REFINED_LANDMARK_COUNT
        } else {
            BASE_LANDMARK_COUNT
        }
    }
}

/// Pixel-space region `(x, y, width, height)` of the frame fed to the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Square region centered on the detection, expanded and clamped to the frame.
    pub(crate) fn around(det: &FaceDetection, frame_w: u32, frame_h: u32) -> Option<Self> {
        let (fw, fh) = (frame_w as f32, frame_h as f32);
        let [cx, cy] = det.center();
        let side = ((det.bbox[2] - det.bbox[0]) * fw)
            .max((det.bbox[3] - det.bbox[1]) * fh)
            * ROI_SCALE;
        if side < 1.0 {
            return None;
        }

        let half = side / 2.0;
        let x0 = (cx * fw - half).max(0.0) as u32;
        let y0 = (cy * fh - half).max(0.0) as u32;
        let x1 = ((cx * fw + half).min(fw) as u32).min(frame_w);
        let y1 = ((cy * fh + half).min(fh) as u32).min(frame_h);

        (x1 > x0 && y1 > y0).then_some(Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    /// Maps a point in mesh input space back to frame-normalized coordinates.
    pub(crate) fn to_frame(self, mesh_x: f32, mesh_y: f32, frame_w: u32, frame_h: u32) -> Point {
        let size = MESH_SIZE as f32;
        Point::new(
            (self.width as f32).mul_add(mesh_x / size, self.x as f32) / frame_w as f32,
            (self.height as f32).mul_add(mesh_y / size, self.y as f32) / frame_h as f32,
        )
    }
}

/// Two-stage landmark detection: face detector, then face mesh on the best face.
pub struct MeshLandmarkProvider {
    detector: BlazeFace,
    mesh: FaceMesh,
    settings: LandmarkSettings,
}

impl MeshLandmarkProvider {
    /// Combines loaded models.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh landmark count does not match the settings.
    pub fn new(detector: BlazeFace, mesh: FaceMesh, settings: LandmarkSettings) -> Result<Self> {
        anyhow::ensure!(
            mesh.num_landmarks() == settings.num_landmarks(),
            "Face mesh regresses {} landmarks but settings require {}",
            mesh.num_landmarks(),
            settings.num_landmarks()
        );

        Ok(Self {
            detector,
            mesh,
            settings,
        })
    }
}

impl LandmarkProvider for MeshLandmarkProvider {
    fn detect(&self, frame: &RgbImage) -> Result<Option<Landmarks>> {
        let (frame_w, frame_h) = frame.dimensions();

        let mut detections = self
            .detector
            .detect(frame, self.settings.min_detection_confidence)
            .context("Face detection failed")?;
        detections.truncate(self.settings.max_num_faces);

        let Some(best) = detections.first() else {
            debug!("No face detected");
            return Ok(None);
        };

        let Some(roi) = Roi::around(best, frame_w, frame_h) else {
            debug!(bbox = ?best.bbox, "Face box has no usable area");
            return Ok(None);
        };

        let side = MESH_SIZE as u32;
        let crop = imageops::crop_imm(frame, roi.x, roi.y, roi.width, roi.height).to_image();
        let crop = imageops::resize(&crop, side, side, FilterType::Triangle);

        let output = self.mesh.run(&crop)?;
        if output.presence < self.settings.min_tracking_confidence {
            debug!(presence = output.presence, "Face mesh rejected the region");
            return Ok(None);
        }

        let points: Vec<Point> = output
            .coords
            .iter()
            .map(|&[x, y, _]| roi.to_frame(x, y, frame_w, frame_h))
            .collect();

        debug!(
            score = best.score,
            presence = output.presence,
            landmarks = points.len(),
            "Face landmarks detected"
        );

        Ok(Some(Landmarks::new(points)))
    }
}

//! `BlazeFace` short-range face detector.
//!
//! Locates faces so the face mesh can run on a tight region of interest.
//! Architecture follows "`BlazeFace`: Sub-millisecond Neural Face Detection on
//! Mobile GPUs" (front model, 128x128 input) with BatchNorm folded into the
//! convolution biases.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::imageops::{self, FilterType};
use image::RgbImage;

use super::blocks::{forward_all, Activation, ResidualBlock};
use super::utils::{rgb_to_tensor, sigmoid};

/// Input image size for `BlazeFace`.
pub const INPUT_SIZE: usize = 128;

/// Anchors on the 16x16 feature map (2 per cell).
const ANCHORS_16: usize = 16 * 16 * 2;
/// Anchors on the 8x8 feature map (6 per cell).
const ANCHORS_8: usize = 8 * 8 * 6;

/// Box + 6 keypoints, each as `(x, y)`.
const REGRESSION_LEN: usize = 16;

/// Non-maximum suppression IOU threshold.
const NMS_THRESHOLD: f32 = 0.3;

/// `(in, out, stride)` for the 16x16 backbone.
const BACKBONE_16: &[(usize, usize, usize)] = &[
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2),
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2),
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];

/// `(in, out, stride)` for the 8x8 backbone.
const BACKBONE_8: &[(usize, usize, usize)] = &[
    (88, 96, 2),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// A detected face with bounding box and keypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    /// Face bounding box `[x_min, y_min, x_max, y_max]`, normalized to the input frame.
    pub bbox: [f32; 4],
    /// Detection confidence score.
    pub score: f32,
    /// Right eye, left eye, nose, mouth, right ear, left ear as normalized `[x, y]`.
    pub keypoints: [[f32; 2]; 6],
}

impl FaceDetection {
    /// Box center `[x, y]`.
    #[must_use]
    pub fn center(&self) -> [f32; 2] {
        [
            (self.bbox[0] + self.bbox[2]) / 2.0,
            (self.bbox[1] + self.bbox[3]) / 2.0,
        ]
    }
}

/// `BlazeFace` face detection model.
pub struct BlazeFace {
    conv0: Conv2d,
    backbone_16: Vec<ResidualBlock>,
    backbone_8: Vec<ResidualBlock>,
    classifier_16: Conv2d,
    regressor_16: Conv2d,
    classifier_8: Conv2d,
    regressor_8: Conv2d,
    /// Anchor centers `(cx, cy)`, in the same order as the network outputs.
    anchors: Vec<[f32; 2]>,
    device: Device,
}

impl BlazeFace {
    /// Creates a new `BlazeFace` model from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights cannot be loaded or are invalid.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();

        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        let backbone_16 = ResidualBlock::stack(BACKBONE_16, Activation::Relu, &vb.pp("backbone1"))
            .context("Failed to load BlazeFace backbone1")?;
        let backbone_8 = ResidualBlock::stack(BACKBONE_8, Activation::Relu, &vb.pp("backbone2"))
            .context("Failed to load BlazeFace backbone2")?;

        let head = |in_c: usize, out_c: usize, name: &str| {
            conv2d(in_c, out_c, 1, Conv2dConfig::default(), vb.pp(name))
        };

        Ok(Self {
            conv0,
            backbone_16,
            backbone_8,
            classifier_16: head(88, 2, "classifier_16")?,
            regressor_16: head(88, 2 * REGRESSION_LEN, "regressor_16")?,
            classifier_8: head(96, 6, "classifier_8")?,
            regressor_8: head(96, 6 * REGRESSION_LEN, "regressor_8")?,
            anchors: generate_anchors(),
            device,
        })
    }

    /// Detects faces, strongest first.
    ///
    /// Detections scoring below `min_score` are dropped and overlapping boxes
    /// are suppressed.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(&self, image: &RgbImage, min_score: f32) -> Result<Vec<FaceDetection>> {
        let side = INPUT_SIZE as u32;
        let resized = imageops::resize(image, side, side, FilterType::Triangle);
        let input = rgb_to_tensor(&resized, 1.0 / 127.5, -1.0, &self.device)?;

        let (scores, regressions) = self.forward(&input).context("BlazeFace forward failed")?;
        let scores = scores.to_vec1::<f32>()?;
        let regressions = regressions.to_vec2::<f32>()?;

        let detections = scores
            .iter()
            .zip(&regressions)
            .zip(&self.anchors)
            .filter_map(|((&logit, reg), anchor)| {
                let score = sigmoid(logit);
                (score >= min_score).then(|| decode(anchor, reg, score))
            })
            .collect();

        Ok(non_max_suppression(detections))
    }

    /// Returns `(scores, regressions)` with shapes `(896,)` and `(896, 16)`.
    fn forward(&self, x: &Tensor) -> candle_core::Result<(Tensor, Tensor)> {
        // Asymmetric "same" padding for the stride-2 5x5 stem.
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let x = self.conv0.forward(&x)?.relu()?;

        let feature_16 = forward_all(&self.backbone_16, x)?;
        let feature_8 = forward_all(&self.backbone_8, feature_16.clone())?;

        let flatten = |t: Tensor, n: usize, len: usize| t.permute((0, 2, 3, 1))?.reshape((n, len));

        let scores = Tensor::cat(
            &[
                flatten(self.classifier_16.forward(&feature_16)?, ANCHORS_16, 1)?,
                flatten(self.classifier_8.forward(&feature_8)?, ANCHORS_8, 1)?,
            ],
            0,
        )?
        .squeeze(1)?;

        let regressions = Tensor::cat(
            &[
                flatten(self.regressor_16.forward(&feature_16)?, ANCHORS_16, REGRESSION_LEN)?,
                flatten(self.regressor_8.forward(&feature_8)?, ANCHORS_8, REGRESSION_LEN)?,
            ],
            0,
        )?;

        Ok((scores, regressions))
    }
}

/// Anchor centers for the 16x16 (2 per cell) and 8x8 (6 per cell) grids.
fn generate_anchors() -> Vec<[f32; 2]> {
    let grid = |cells: u8, per_cell: usize| {
        let n = f32::from(cells);
        (0..cells).flat_map(move |y| {
            (0..cells).flat_map(move |x| {
                std::iter::repeat([(f32::from(x) + 0.5) / n, (f32::from(y) + 0.5) / n])
                    .take(per_cell)
            })
        })
    };

    grid(16, 2).chain(grid(8, 6)).collect()
}

/// Decodes one anchor's regression into a normalized detection.
fn decode(anchor: &[f32; 2], reg: &[f32], score: f32) -> FaceDetection {
    let scale = INPUT_SIZE as f32;
    let point = |i: usize| {
        [
            (anchor[0] + reg[i] / scale).clamp(0.0, 1.0),
            (anchor[1] + reg[i + 1] / scale).clamp(0.0, 1.0),
        ]
    };

    let [cx, cy] = [anchor[0] + reg[0] / scale, anchor[1] + reg[1] / scale];
    let (w, h) = (reg[2] / scale, reg[3] / scale);

    let mut keypoints = [[0.0f32; 2]; 6];
    for (k, kp) in keypoints.iter_mut().enumerate() {
        *kp = point(4 + k * 2);
    }

    FaceDetection {
        bbox: [
            (cx - w / 2.0).clamp(0.0, 1.0),
            (cy - h / 2.0).clamp(0.0, 1.0),
            (cx + w / 2.0).clamp(0.0, 1.0),
            (cy + h / 2.0).clamp(0.0, 1.0),
        ],
        score,
        keypoints,
    }
}

/// Keeps the strongest detection of every overlapping cluster, sorted by score.
fn non_max_suppression(mut detections: Vec<FaceDetection>) -> Vec<FaceDetection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<FaceDetection> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(&k.bbox, &det.bbox) < NMS_THRESHOLD) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection over Union for two normalized boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = inter_w * inter_h;

    let union = (a[2] - a[0]) * (a[3] - a[1]) + (b[2] - b[0]) * (b[3] - b[1]) - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f32; 4], score: f32) -> FaceDetection {
        FaceDetection {
            bbox,
            score,
            keypoints: [[0.0; 2]; 6],
        }
    }

    #[test]
    fn test_anchor_count_and_order() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), ANCHORS_16 + ANCHORS_8);
        assert_eq!(anchors[0], [0.5 / 16.0, 0.5 / 16.0]);
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[2], [1.5 / 16.0, 0.5 / 16.0]);
        assert_eq!(anchors[ANCHORS_16], [0.5 / 8.0, 0.5 / 8.0]);
    }

    #[test]
    fn test_decode_centered_box() {
        let mut reg = [0.0f32; REGRESSION_LEN];
        reg[2] = 64.0;
        reg[3] = 32.0;
        let d = decode(&[0.5, 0.5], &reg, 0.9);

        assert!((d.bbox[0] - 0.25).abs() < 1e-6);
        assert!((d.bbox[1] - 0.375).abs() < 1e-6);
        assert!((d.bbox[2] - 0.75).abs() < 1e-6);
        assert!((d.bbox[3] - 0.625).abs() < 1e-6);
        assert_eq!(d.keypoints[0], [0.5, 0.5]);
        assert_eq!(d.center(), [0.5, 0.5]);
    }

    #[test]
    fn test_iou() {
        assert!(iou(&[0.0, 0.0, 0.5, 0.5], &[0.6, 0.6, 1.0, 1.0]).abs() < 1e-6);
        assert!((iou(&[0.0, 0.0, 1.0, 1.0], &[0.0, 0.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);

        let expected = 0.0625 / 0.4375;
        assert!((iou(&[0.0, 0.0, 0.5, 0.5], &[0.25, 0.25, 0.75, 0.75]) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_strongest_and_disjoint() {
        let kept = non_max_suppression(vec![
            det([0.1, 0.1, 0.4, 0.4], 0.8),
            det([0.12, 0.1, 0.42, 0.4], 0.95),
            det([0.6, 0.6, 0.9, 0.9], 0.7),
        ]);

        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.95).abs() < 1e-6);
        assert!((kept[1].score - 0.7).abs() < 1e-6);
    }
}

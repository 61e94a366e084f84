//! Face mesh landmark regressor.
//!
//! Takes a 192x192 face crop and regresses 468 surface landmarks, or 478 when
//! the weights include the iris refinement, plus a face presence score.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use anyhow::{bail, Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, prelu, Conv2d, Conv2dConfig, PReLU, VarBuilder};
use image::RgbImage;

use super::blocks::{forward_all, Activation, ResidualBlock};
use super::utils::{rgb_to_tensor, sigmoid};

/// Input image size for the face mesh.
pub const INPUT_SIZE: usize = 192;

const BACKBONE: &[(usize, usize, usize)] = &[
    (16, 16, 1),
    (16, 16, 1),
    (16, 32, 2),
    (32, 32, 1),
    (32, 32, 1),
    (32, 64, 2),
    (64, 64, 1),
    (64, 64, 1),
    (64, 128, 2),
    (128, 128, 1),
    (128, 128, 1),
    (128, 128, 2),
    (128, 128, 1),
    (128, 128, 1),
];

/// Raw mesh output for one crop.
#[derive(Debug, Clone)]
pub struct MeshOutput {
    /// Landmark `[x, y, z]` in crop pixel space (`0..INPUT_SIZE`).
    pub coords: Vec<[f32; 3]>,
    /// Probability that the crop contains a face.
    pub presence: f32,
}

/// Conv, PReLU, residual block, conv.
struct Head {
    blocks: Vec<ResidualBlock>,
    reduce: Conv2d,
    reduce_act: PReLU,
    refine: ResidualBlock,
    out: Conv2d,
}

impl Head {
    fn new(
        layout: &[(usize, usize, usize)],
        out_channels: usize,
        vb: &VarBuilder,
    ) -> candle_core::Result<Self> {
        Ok(Self {
            blocks: ResidualBlock::stack(layout, Activation::Prelu, &vb.pp("blocks"))?,
            reduce: conv2d(128, 32, 1, Conv2dConfig::default(), vb.pp("reduce"))?,
            reduce_act: prelu(Some(32), vb.pp("reduce_act"))?,
            refine: ResidualBlock::new(32, 32, 3, 1, Activation::Prelu, &vb.pp("refine"))?,
            out: conv2d(32, out_channels, 3, Conv2dConfig::default(), vb.pp("out"))?,
        })
    }
}

impl Module for Head {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = forward_all(&self.blocks, x.clone())?;
        let x = self.reduce_act.forward(&self.reduce.forward(&x)?)?;
        let x = self.refine.forward(&x)?;
        self.out.forward(&x)?.flatten_all()
    }
}

/// Face mesh landmark model.
pub struct FaceMesh {
    stem: Conv2d,
    stem_act: PReLU,
    backbone: Vec<ResidualBlock>,
    coord_head: Head,
    presence_head: Head,
    num_landmarks: usize,
    device: Device,
}

impl FaceMesh {
    /// Creates a face mesh regressing `num_landmarks` points.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights cannot be loaded or are invalid.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder, num_landmarks: usize) -> Result<Self> {
        let device = vb.device().clone();

        let stem = conv2d(
            3,
            16,
            3,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("stem"),
        )?;
        let stem_act = prelu(Some(16), vb.pp("stem_act"))?;
        let backbone = ResidualBlock::stack(BACKBONE, Activation::Prelu, &vb.pp("backbone"))
            .context("Failed to load face mesh backbone")?;

        let coord_head = Head::new(
            &[(128, 128, 2), (128, 128, 1)],
            num_landmarks * 3,
            &vb.pp("coord_head"),
        )
        .context("Failed to load face mesh coordinate head")?;
        let presence_head = Head::new(&[(128, 128, 2)], 1, &vb.pp("presence_head"))
            .context("Failed to load face mesh presence head")?;

        Ok(Self {
            stem,
            stem_act,
            backbone,
            coord_head,
            presence_head,
            num_landmarks,
            device,
        })
    }

    /// Number of landmarks this mesh regresses.
    #[must_use]
    pub const fn num_landmarks(&self) -> usize {
        self.num_landmarks
    }

    /// Runs the mesh on a square face crop.
    ///
    /// # Errors
    ///
    /// Returns an error if the crop is not `INPUT_SIZE` square or inference fails.
    pub fn run(&self, crop: &RgbImage) -> Result<MeshOutput> {
        let side = INPUT_SIZE as u32;
        if crop.dimensions() != (side, side) {
            bail!(
                "Face mesh expects a {side}x{side} crop, got {}x{}",
                crop.width(),
                crop.height()
            );
        }

        let input = rgb_to_tensor(crop, 1.0 / 127.5, -1.0, &self.device)?;
        let (coords, presence) = self.forward(&input).context("Face mesh forward failed")?;

        let flat = coords.to_vec1::<f32>()?;
        if flat.len() != self.num_landmarks * 3 {
            bail!(
                "Face mesh produced {} values, expected {}",
                flat.len(),
                self.num_landmarks * 3
            );
        }

        let coords = flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        let logit = presence.to_vec1::<f32>()?.first().copied().unwrap_or(f32::NEG_INFINITY);

        Ok(MeshOutput {
            coords,
            presence: sigmoid(logit),
        })
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 0, 1)?.pad_with_zeros(3, 0, 1)?;
        let x = self.stem_act.forward(&self.stem.forward(&x)?)?;
        let features = forward_all(&self.backbone, x)?;

        Ok((
            self.coord_head.forward(&features)?,
            self.presence_head.forward(&features)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_run_shapes_with_initialized_weights() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mesh = FaceMesh::new(vb, 468).unwrap_or_else(|e| panic!("{e}"));

        let crop = RgbImage::from_pixel(192, 192, image::Rgb([128, 100, 90]));
        let out = mesh.run(&crop).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(out.coords.len(), 468);
        assert!((0.0..=1.0).contains(&out.presence));
    }

    #[test]
    fn test_rejects_wrong_crop_size() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mesh = FaceMesh::new(vb, 478).unwrap_or_else(|e| panic!("{e}"));

        let crop = RgbImage::new(100, 100);
        assert!(mesh.run(&crop).is_err());
    }
}

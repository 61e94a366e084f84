//! Binary CNN classifier over fixed-size RGB crops.
//!
//! Used for both the eye-state model (open vs closed) and the yawn model
//! (yawning vs not). Each conv stage is a 3x3 conv, ReLU, then a 2x2 max pool;
//! two fully connected layers produce a single logit.

#![allow(clippy::cast_possible_truncation)]

use anyhow::{bail, Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

use super::utils::{hwc_to_nchw, sigmoid};
use crate::domain::NormalizedCrop;
use crate::ports::ConfidencePredictor;

/// Layer layout of a [`CropClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierSpec {
    /// Square input side in pixels.
    pub input_size: u32,
    /// Output channels of each conv stage.
    pub conv_channels: Vec<usize>,
    /// Width of the hidden fully connected layer.
    pub hidden: usize,
}

impl ClassifierSpec {
    /// Eye-state model: 224x224 input, positive class is "open".
    #[must_use]
    pub fn eye() -> Self {
        Self {
            input_size: 224,
            conv_channels: vec![32, 64, 128, 128],
            hidden: 128,
        }
    }

    /// Yawn model: 64x64 input, positive class is "yawning".
    #[must_use]
    pub fn yawn() -> Self {
        Self {
            input_size: 64,
            conv_channels: vec![32, 64, 128],
            hidden: 128,
        }
    }

    /// Length of the flattened feature vector after the last pool.
    #[must_use]
    pub fn flatten_size(&self) -> usize {
        let side = (self.input_size as usize) >> self.conv_channels.len();
        self.conv_channels.last().copied().unwrap_or(3) * side * side
    }
}

/// CNN binary classifier.
///
/// Weights: `conv{i}` for each stage (1-based), `fc1`, `fc2`.
pub struct CropClassifier {
    convs: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    input_size: u32,
    device: Device,
}

impl CropClassifier {
    /// Creates a classifier with the given layout from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights cannot be loaded or are invalid.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder, spec: &ClassifierSpec) -> Result<Self> {
        if spec.conv_channels.is_empty() {
            bail!("Classifier needs at least one conv stage");
        }
        if spec.flatten_size() == 0 {
            bail!(
                "Input size {} is too small for {} pooling stages",
                spec.input_size,
                spec.conv_channels.len()
            );
        }

        let device = vb.device().clone();
        let conv_cfg = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };

        let mut convs = Vec::with_capacity(spec.conv_channels.len());
        let mut in_c = 3;
        for (i, &out_c) in spec.conv_channels.iter().enumerate() {
            let conv = conv2d(in_c, out_c, 3, conv_cfg, vb.pp(format!("conv{}", i + 1)))
                .with_context(|| format!("Failed to load conv{}", i + 1))?;
            convs.push(conv);
            in_c = out_c;
        }

        let fc1 = linear(spec.flatten_size(), spec.hidden, vb.pp("fc1"))?;
        let fc2 = linear(spec.hidden, 1, vb.pp("fc2"))?;

        Ok(Self {
            convs,
            fc1,
            fc2,
            input_size: spec.input_size,
            device,
        })
    }

    /// Square input side this classifier expects.
    #[must_use]
    pub const fn input_size(&self) -> u32 {
        self.input_size
    }
}

impl Module for CropClassifier {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self
            .convs
            .iter()
            .try_fold(x.clone(), |h, conv| conv.forward(&h)?.relu()?.max_pool2d(2))?;

        let x = self.fc1.forward(&x.flatten_from(1)?)?.relu()?;
        self.fc2.forward(&x)
    }
}

impl ConfidencePredictor for CropClassifier {
    fn predict(&self, input: &NormalizedCrop) -> Result<f32> {
        if input.width != self.input_size || input.height != self.input_size {
            bail!(
                "Classifier expects {0}x{0} input, got {1}x{2}",
                self.input_size,
                input.width,
                input.height
            );
        }

        let (h, w) = (input.height as usize, input.width as usize);
        if input.data.len() != h * w * input.channels() {
            bail!("Crop data length {} does not match {w}x{h}", input.data.len());
        }

        let x = hwc_to_nchw(input.data.clone(), h, w, &self.device)?;
        let logit = self
            .forward(&x)
            .context("Classifier forward failed")?
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .context("Classifier produced no output")?;

        Ok(sigmoid(logit))
    }
}

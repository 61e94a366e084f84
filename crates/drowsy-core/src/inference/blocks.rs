//! Depthwise-separable residual blocks shared by the face detector and the face mesh.

use candle_core::{Module, Tensor};
use candle_nn::{conv2d, prelu, Conv2d, Conv2dConfig, PReLU, VarBuilder};

/// Output activation of a residual block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Plain ReLU (`BlazeFace`).
    Relu,
    /// Per-channel PReLU with learned slopes (face mesh).
    Prelu,
}

#[derive(Debug, Clone)]
enum Act {
    Relu,
    Prelu(PReLU),
}

/// Depthwise `k x k` conv followed by a pointwise conv, added to a shortcut.
///
/// Stride-2 blocks pad the input bottom/right by 2 and max-pool the shortcut.
/// The shortcut is zero-padded along channels when the block widens.
///
/// Weights: `{prefix}.depthwise`, `{prefix}.pointwise`, and `{prefix}.act` for PReLU.
#[derive(Debug, Clone)]
pub struct ResidualBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    act: Act,
    channel_pad: usize,
    stride: usize,
}

impl ResidualBlock {
    /// Builds a block from weights under `vb`.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is missing or has the wrong shape.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        activation: Activation,
        vb: &VarBuilder,
    ) -> candle_core::Result<Self> {
        let padding = if stride == 2 {
            0
        } else {
            (kernel_size - 1) / 2
        };

        let depthwise = conv2d(
            in_channels,
            in_channels,
            kernel_size,
            Conv2dConfig {
                stride,
                padding,
                groups: in_channels,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;

        let act = match activation {
            Activation::Relu => Act::Relu,
            Activation::Prelu => Act::Prelu(prelu(Some(out_channels), vb.pp("act"))?),
        };

        Ok(Self {
            depthwise,
            pointwise,
            act,
            channel_pad: out_channels.saturating_sub(in_channels),
            stride,
        })
    }

    /// Builds a sequence of blocks from `(in, out, stride)` triples with 3x3 kernels,
    /// named `{prefix}.{index}`.
    ///
    /// # Errors
    ///
    /// Returns an error if any block fails to load.
    pub fn stack(
        layout: &[(usize, usize, usize)],
        activation: Activation,
        vb: &VarBuilder,
    ) -> candle_core::Result<Vec<Self>> {
        layout
            .iter()
            .enumerate()
            .map(|(i, &(in_c, out_c, stride))| {
                Self::new(in_c, out_c, 3, stride, activation, &vb.pp(i.to_string()))
            })
            .collect()
    }
}

impl Module for ResidualBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (h, shortcut) = if self.stride == 2 {
            (
                x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?,
                x.max_pool2d(2)?,
            )
        } else {
            (x.clone(), x.clone())
        };

        let h = self.pointwise.forward(&self.depthwise.forward(&h)?)?;

        let shortcut = if self.channel_pad > 0 {
            shortcut.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            shortcut
        };

        let sum = (h + shortcut)?;
        match &self.act {
            Act::Relu => sum.relu(),
            Act::Prelu(p) => p.forward(&sum),
        }
    }
}

/// Runs `x` through each block in turn.
pub fn forward_all(blocks: &[ResidualBlock], x: Tensor) -> candle_core::Result<Tensor> {
    blocks.iter().try_fold(x, |h, block| block.forward(&h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_stride_two_halves_spatial_dims() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let block = ResidualBlock::new(4, 8, 3, 2, Activation::Prelu, &vb)
            .unwrap_or_else(|e| panic!("{e}"));

        let x = Tensor::zeros((1, 4, 16, 16), DType::F32, &Device::Cpu)
            .unwrap_or_else(|e| panic!("{e}"));
        let y = block.forward(&x).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(y.dims(), &[1, 8, 8, 8]);
    }

    #[test]
    fn test_stride_one_keeps_spatial_dims() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let blocks = ResidualBlock::stack(&[(4, 4, 1), (4, 6, 1)], Activation::Relu, &vb)
            .unwrap_or_else(|e| panic!("{e}"));

        let x = Tensor::ones((1, 4, 10, 10), DType::F32, &Device::Cpu)
            .unwrap_or_else(|e| panic!("{e}"));
        let y = forward_all(&blocks, x).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(y.dims(), &[1, 6, 10, 10]);
    }
}

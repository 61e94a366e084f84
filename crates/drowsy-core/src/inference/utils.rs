//! Shared inference utilities.

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use image::RgbImage;

/// Sigmoid activation function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Converts an RGB image to a `(1, 3, H, W)` tensor, mapping each channel
/// value `v` to `v * scale + offset`.
///
/// # Errors
///
/// Returns an error if tensor creation fails.
pub fn rgb_to_tensor(image: &RgbImage, scale: f32, offset: f32, device: &Device) -> Result<Tensor> {
    let (w, h) = image.dimensions();
    let data: Vec<f32> = image
        .as_raw()
        .iter()
        .map(|&v| f32::from(v).mul_add(scale, offset))
        .collect();

    hwc_to_nchw(data, h as usize, w as usize, device)
}

/// Reshapes interleaved HWC channel data into a `(1, 3, H, W)` tensor.
pub(crate) fn hwc_to_nchw(
    data: Vec<f32>,
    height: usize,
    width: usize,
    device: &Device,
) -> Result<Tensor> {
    Tensor::from_vec(data, (1, height, width, 3), device)?
        .permute((0, 3, 1, 2))?
        .contiguous()
        .context("Failed to build NCHW tensor")
}

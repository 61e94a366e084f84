//! Pixel-space regions cropped out of a frame.

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates.
///
/// Half-open: covers columns `x_min..x_max` and rows `y_min..y_max`.
/// Serialized as `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u32; 4]", try_from = "[u32; 4]")]
pub struct BoundingBox {
    /// Left edge (inclusive).
    pub x_min: u32,
    /// Top edge (inclusive).
    pub y_min: u32,
    /// Right edge (exclusive).
    pub x_max: u32,
    /// Bottom edge (exclusive).
    pub y_max: u32,
}

impl BoundingBox {
    /// Creates a box, returning `None` unless it has positive area.
    #[must_use]
    pub const fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Option<Self> {
        if x_min < x_max && y_min < y_max {
            Some(Self {
                x_min,
                y_min,
                x_max,
                y_max,
            })
        } else {
            None
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns true if `other` lies entirely inside this box.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.x_min <= other.x_min
            && self.y_min <= other.y_min
            && self.x_max >= other.x_max
            && self.y_max >= other.y_max
    }
}

impl From<BoundingBox> for [u32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

impl TryFrom<[u32; 4]> for BoundingBox {
    type Error = String;

    fn try_from([x_min, y_min, x_max, y_max]: [u32; 4]) -> Result<Self, Self::Error> {
        Self::new(x_min, y_min, x_max, y_max)
            .ok_or_else(|| format!("degenerate box [{x_min}, {y_min}, {x_max}, {y_max}]"))
    }
}

/// A feature region cut out of the source frame.
#[derive(Debug, Clone)]
pub struct FeatureCrop {
    /// Cropped pixels.
    pub image: RgbImage,
    /// Location of the crop in the source frame.
    pub bbox: BoundingBox,
}

/// Classifier input: an RGB crop resized to a fixed size with values in `[0, 1]`.
///
/// Data is stored row-major, channels interleaved (HWC).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCrop {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `height * width * 3` channel values.
    pub data: Vec<f32>,
}

impl NormalizedCrop {
    /// Resizes `image` to exactly `width x height` (bilinear) and scales channels to `[0, 1]`.
    #[must_use]
    pub fn from_image(image: &RgbImage, width: u32, height: u32) -> Self {
        let resized = imageops::resize(image, width, height, FilterType::Triangle);
        let data = resized
            .as_raw()
            .iter()
            .map(|&v| f32::from(v) / 255.0)
            .collect();

        Self {
            width,
            height,
            data,
        }
    }

    /// Number of channels per pixel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_box_rejected() {
        assert!(BoundingBox::new(5, 5, 5, 10).is_none());
        assert!(BoundingBox::new(5, 10, 6, 10).is_none());
        assert!(BoundingBox::new(6, 0, 5, 1).is_none());
    }

    #[test]
    fn test_box_dimensions() {
        let b = BoundingBox::new(10, 20, 40, 30).unwrap_or_else(|| panic!("valid box"));
        assert_eq!(b.width(), 30);
        assert_eq!(b.height(), 10);
        assert_eq!(b.area(), 300);
    }

    #[test]
    fn test_box_serializes_as_array() {
        let b = BoundingBox::new(1, 2, 3, 4).unwrap_or_else(|| panic!("valid box"));
        let json = serde_json::to_string(&b).unwrap_or_default();
        assert_eq!(json, "[1,2,3,4]");

        let parsed: Result<BoundingBox, _> = serde_json::from_str("[3,2,1,4]");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_normalized_crop_range() {
        let img = RgbImage::from_fn(10, 6, |x, _| image::Rgb([255, 0, (x * 20) as u8]));
        let crop = NormalizedCrop::from_image(&img, 4, 4);

        assert_eq!(crop.width, 4);
        assert_eq!(crop.height, 4);
        assert_eq!(crop.data.len(), 4 * 4 * 3);
        assert!(crop.data.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((crop.data[0] - 1.0).abs() < 1e-6);
        assert!(crop.data[1].abs() < 1e-6);
    }
}

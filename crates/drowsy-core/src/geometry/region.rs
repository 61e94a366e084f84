//! Landmark-to-region extraction.

// Pixel projection truncates toward zero.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use image::{imageops, RgbImage};

use crate::domain::{BoundingBox, FeatureCrop, Landmarks};

/// Computes the padded, clamped pixel box around a subset of landmarks.
///
/// Indices beyond the end of `landmarks` are skipped. Each remaining point is
/// projected by truncating `x * width` and `y * height`. The box is grown by
/// `padding` on every side and clamped to `[0, width] x [0, height]`.
///
/// Returns `None` when no index is in range or the clamped box is degenerate.
#[must_use]
pub fn feature_bbox(
    landmarks: &Landmarks,
    indices: &[usize],
    width: u32,
    height: u32,
    padding: u32,
) -> Option<BoundingBox> {
    let (w, h) = (f64::from(width), f64::from(height));

    let mut points = indices.iter().filter_map(|&idx| landmarks.get(idx)).map(|p| {
        (
            (f64::from(p.x) * w) as i64,
            (f64::from(p.y) * h) as i64,
        )
    });

    let first = points.next()?;
    let (min_x, min_y, max_x, max_y) = points.fold(
        (first.0, first.1, first.0, first.1),
        |(min_x, min_y, max_x, max_y), (x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    );

    let pad = i64::from(padding);
    let x_min = min_x.saturating_sub(pad).max(0);
    let y_min = min_y.saturating_sub(pad).max(0);
    let x_max = max_x.saturating_add(pad).min(i64::from(width));
    let y_max = max_y.saturating_add(pad).min(i64::from(height));

    if x_min >= x_max || y_min >= y_max {
        return None;
    }

    BoundingBox::new(
        u32::try_from(x_min).ok()?,
        u32::try_from(y_min).ok()?,
        u32::try_from(x_max).ok()?,
        u32::try_from(y_max).ok()?,
    )
}

/// Crops the region of `frame` enclosing the given landmarks.
///
/// Landmarks are projected against the frame's own dimensions. See
/// [`feature_bbox`] for the box rules. Returns `None` if the feature cannot be
/// located or the resulting crop is empty.
#[must_use]
pub fn extract_feature_region(
    frame: &RgbImage,
    landmarks: &Landmarks,
    indices: &[usize],
    padding: u32,
) -> Option<FeatureCrop> {
    let (width, height) = frame.dimensions();
    let bbox = feature_bbox(landmarks, indices, width, height, padding)?;

    let image =
        imageops::crop_imm(frame, bbox.x_min, bbox.y_min, bbox.width(), bbox.height()).to_image();

    if image.width() == 0 || image.height() == 0 {
        return None;
    }

    Some(FeatureCrop { image, bbox })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    fn landmarks_at(points: &[(f32, f32)]) -> Landmarks {
        Landmarks::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_bbox_basic_projection() {
        let lm = landmarks_at(&[(0.25, 0.25), (0.5, 0.75)]);
        let bbox = feature_bbox(&lm, &[0, 1], 100, 100, 0);
        assert_eq!(bbox, BoundingBox::new(25, 25, 50, 75));
    }

    #[test]
    fn test_bbox_truncates_coordinates() {
        let lm = landmarks_at(&[(0.109, 0.209), (0.309, 0.409)]);
        let bbox = feature_bbox(&lm, &[0, 1], 100, 100, 0);
        assert_eq!(bbox, BoundingBox::new(10, 20, 30, 40));
    }

    #[test]
    fn test_bbox_padding_applied() {
        let lm = landmarks_at(&[(0.5, 0.5), (0.6, 0.6)]);
        let bbox = feature_bbox(&lm, &[0, 1], 100, 100, 5);
        assert_eq!(bbox, BoundingBox::new(45, 45, 65, 65));
    }

    #[test]
    fn test_bbox_clamped_to_frame() {
        let lm = landmarks_at(&[(0.01, 0.01), (0.99, 0.99)]);
        let bbox = feature_bbox(&lm, &[0, 1], 640, 480, 50);
        assert_eq!(bbox, BoundingBox::new(0, 0, 640, 480));
    }

    #[test]
    fn test_bbox_skips_out_of_range_indices() {
        let lm = landmarks_at(&[(0.2, 0.2), (0.4, 0.4)]);
        let bbox = feature_bbox(&lm, &[0, 1, 300, 477], 100, 100, 0);
        assert_eq!(bbox, BoundingBox::new(20, 20, 40, 40));
    }

    #[test]
    fn test_bbox_non_finite_coordinates_saturate() {
        let lm = landmarks_at(&[(f32::NEG_INFINITY, 0.5), (0.5, 0.6)]);
        let bbox = feature_bbox(&lm, &[0, 1], 100, 100, 5);
        assert_eq!(bbox, BoundingBox::new(0, 45, 55, 65));

        let lm = landmarks_at(&[(0.5, 0.5), (f32::INFINITY, f32::INFINITY)]);
        let bbox = feature_bbox(&lm, &[0, 1], 100, 100, 5);
        assert_eq!(bbox, BoundingBox::new(45, 45, 100, 100));
    }

    #[test]
    fn test_bbox_no_in_range_index() {
        let lm = landmarks_at(&[(0.2, 0.2)]);
        assert!(feature_bbox(&lm, &[5, 6, 7], 100, 100, 5).is_none());
        assert!(feature_bbox(&Landmarks::default(), &[0], 100, 100, 5).is_none());
        assert!(feature_bbox(&lm, &[], 100, 100, 5).is_none());
    }

    #[test]
    fn test_bbox_single_point_without_padding_is_degenerate() {
        let lm = landmarks_at(&[(0.5, 0.5)]);
        assert!(feature_bbox(&lm, &[0], 100, 100, 0).is_none());
        assert_eq!(
            feature_bbox(&lm, &[0], 100, 100, 1),
            BoundingBox::new(49, 49, 51, 51)
        );
    }

    #[test]
    fn test_bbox_feature_outside_frame_is_degenerate() {
        // Entire feature to the right of the frame: clamping collapses the box.
        let lm = landmarks_at(&[(1.5, 0.5), (1.6, 0.6)]);
        assert!(feature_bbox(&lm, &[0, 1], 100, 100, 5).is_none());

        let lm = landmarks_at(&[(-0.5, 0.5), (-0.4, 0.6)]);
        assert!(feature_bbox(&lm, &[0, 1], 100, 100, 5).is_none());
    }

    #[test]
    fn test_padding_never_shrinks_box() {
        let lm = landmarks_at(&[(0.3, 0.4), (0.35, 0.42), (0.33, 0.47)]);
        let mut previous: Option<BoundingBox> = None;

        for padding in 0..60 {
            let Some(bbox) = feature_bbox(&lm, &[0, 1, 2], 640, 480, padding) else {
                continue;
            };
            if let Some(prev) = previous {
                assert!(bbox.contains(&prev), "padding {padding}: {bbox:?} < {prev:?}");
            }
            previous = Some(bbox);
        }

        assert!(previous.is_some());
    }

    #[test]
    fn test_extract_region_within_frame() {
        let frame = RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8, y as u8, 0]));

        let grid: Vec<(f32, f32)> = (0..25)
            .map(|i| ((i % 5) as f32 * 0.24, (i / 5) as f32 * 0.24))
            .collect();
        let lm = landmarks_at(&grid);

        for start in 0..20 {
            let indices: Vec<usize> = (start..start + 4).collect();
            let Some(crop) = extract_feature_region(&frame, &lm, &indices, 3) else {
                panic!("indices {indices:?} should be extractable");
            };
            assert!(crop.bbox.x_max <= 64 && crop.bbox.y_max <= 48);
            assert!(crop.bbox.area() > 0);
            assert_eq!(crop.image.width(), crop.bbox.width());
            assert_eq!(crop.image.height(), crop.bbox.height());
        }
    }

    #[test]
    fn test_extract_region_copies_pixels() {
        let frame = RgbImage::from_fn(100, 100, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let lm = landmarks_at(&[(0.2, 0.3), (0.4, 0.5)]);

        let crop = extract_feature_region(&frame, &lm, &[0, 1], 0)
            .unwrap_or_else(|| panic!("region should be extractable"));

        assert_eq!(crop.bbox, BoundingBox::new(20, 30, 40, 50).unwrap_or_else(|| panic!()));
        assert_eq!(crop.image.get_pixel(0, 0).0, [20, 30, 7]);
        assert_eq!(crop.image.get_pixel(19, 19).0, [39, 49, 7]);
    }

    #[test]
    fn test_extract_region_none_when_not_locatable() {
        let frame = RgbImage::new(100, 100);
        assert!(extract_feature_region(&frame, &Landmarks::default(), &[0, 1], 5).is_none());
    }
}

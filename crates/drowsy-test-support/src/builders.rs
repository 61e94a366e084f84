//! Synthetic landmark and frame builders for testing.

use std::f32::consts::TAU;
use std::io::Cursor;

use drowsy_core::domain::{Landmarks, Point};
use drowsy_core::geometry::indices::{
    BOTTOM_LIP, LEFT_EYE, LEFT_MOUTH_CORNER, MOUTH_OUTLINE, REFINED_LANDMARK_COUNT, RIGHT_EYE,
    RIGHT_MOUTH_CORNER, TOP_LIP,
};
use image::{ImageFormat, Rgb, RgbImage};

/// Far outside `[0, 1]`, so every point projects off frame.
const OFF_FRAME: Point = Point::new(-0.5, -0.5);

/// Builder for a synthetic face-mesh landmark set.
///
/// Eyes are drawn as small circles and the mouth as an ellipse whose height
/// is the lip opening, so the mouth aspect ratio is `opening / width`.
#[derive(Debug, Clone)]
pub struct LandmarkBuilder {
    count: usize,
    left_eye: Option<Point>,
    right_eye: Option<Point>,
    eye_radius: f32,
    mouth: Option<(Point, f32, f32)>,
}

impl Default for LandmarkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkBuilder {
    /// A frontal face: eyes at 40% height, closed mouth at 70% height.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: REFINED_LANDMARK_COUNT,
            left_eye: Some(Point::new(0.6, 0.4)),
            right_eye: Some(Point::new(0.4, 0.4)),
            eye_radius: 0.03,
            mouth: Some((Point::new(0.5, 0.7), 0.15, 0.02)),
        }
    }

    /// Places the subject's left eye.
    #[must_use]
    pub const fn left_eye_at(mut self, x: f32, y: f32) -> Self {
        self.left_eye = Some(Point::new(x, y));
        self
    }

    /// Places the subject's right eye.
    #[must_use]
    pub const fn right_eye_at(mut self, x: f32, y: f32) -> Self {
        self.right_eye = Some(Point::new(x, y));
        self
    }

    /// Moves the left eye off frame.
    #[must_use]
    pub const fn without_left_eye(mut self) -> Self {
        self.left_eye = None;
        self
    }

    /// Moves the right eye off frame.
    #[must_use]
    pub const fn without_right_eye(mut self) -> Self {
        self.right_eye = None;
        self
    }

    /// Moves both eyes off frame.
    #[must_use]
    pub const fn without_eyes(self) -> Self {
        self.without_left_eye().without_right_eye()
    }

    /// Places the mouth center with the given corner-to-corner width and lip opening.
    #[must_use]
    pub const fn mouth_at(mut self, x: f32, y: f32, width: f32, opening: f32) -> Self {
        self.mouth = Some((Point::new(x, y), width, opening));
        self
    }

    /// Wide-open mouth with an aspect ratio of 0.8.
    #[must_use]
    pub const fn yawning(self) -> Self {
        self.mouth_at(0.5, 0.7, 0.15, 0.12)
    }

    /// Moves the mouth off frame.
    #[must_use]
    pub const fn without_mouth(mut self) -> Self {
        self.mouth = None;
        self
    }

    /// Truncates the landmark list to `count` points.
    #[must_use]
    pub const fn with_len(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Builds the landmark set.
    #[must_use]
    pub fn build(&self) -> Landmarks {
        let mut points = vec![Point::new(0.5, 0.5); REFINED_LANDMARK_COUNT.max(self.count)];

        for (contour, center) in [(LEFT_EYE, self.left_eye), (RIGHT_EYE, self.right_eye)] {
            place_on_ellipse(&mut points, contour, center, self.eye_radius, self.eye_radius);
        }

        match self.mouth {
            Some((center, width, opening)) => {
                let (rx, ry) = (width / 2.0, opening / 2.0);
                place_on_ellipse(&mut points, MOUTH_OUTLINE, Some(center), rx, ry);
                points[LEFT_MOUTH_CORNER] = Point::new(center.x - rx, center.y);
                points[RIGHT_MOUTH_CORNER] = Point::new(center.x + rx, center.y);
                points[TOP_LIP] = Point::new(center.x, center.y - ry);
                points[BOTTOM_LIP] = Point::new(center.x, center.y + ry);
            }
            None => place_on_ellipse(&mut points, MOUTH_OUTLINE, None, 0.0, 0.0),
        }

        points.truncate(self.count);
        Landmarks::new(points)
    }
}

#[allow(clippy::cast_precision_loss)]
fn place_on_ellipse(points: &mut [Point], contour: &[usize], center: Option<Point>, rx: f32, ry: f32) {
    let n = contour.len() as f32;
    for (i, &idx) in contour.iter().enumerate() {
        points[idx] = center.map_or(OFF_FRAME, |c| {
            let angle = TAU * i as f32 / n;
            Point::new(rx.mul_add(angle.cos(), c.x), ry.mul_add(angle.sin(), c.y))
        });
    }
}

/// Builder for encoded test frames.
pub struct SyntheticFrameBuilder;

impl SyntheticFrameBuilder {
    /// A skin-toned frame of the given size.
    #[must_use]
    pub fn rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([200, 160, 140]))
    }

    /// A horizontal gradient, useful for checking crops copy real pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Rgb([v, (y % 256) as u8, 128])
        })
    }

    /// PNG bytes of [`Self::rgb`].
    #[must_use]
    pub fn png(width: u32, height: u32) -> Vec<u8> {
        Self::encode(&Self::rgb(width, height), ImageFormat::Png)
    }

    /// JPEG bytes of [`Self::gradient`].
    #[must_use]
    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        Self::encode(&Self::gradient(width, height), ImageFormat::Jpeg)
    }

    /// Encodes `image` in `format`. Returns empty bytes if encoding fails.
    #[must_use]
    pub fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        if image.write_to(&mut Cursor::new(&mut bytes), format).is_err() {
            bytes.clear();
        }
        bytes
    }

    /// Bytes that no decoder accepts.
    #[must_use]
    pub fn garbage() -> Vec<u8> {
        b"this is not an image, just some text".to_vec()
    }

    /// A PNG cut off after its header.
    #[must_use]
    pub fn truncated_png() -> Vec<u8> {
        let mut bytes = Self::png(64, 48);
        bytes.truncate(40);
        bytes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use drowsy_core::geometry::{feature_bbox, mouth_aspect_ratio};

    #[test]
    fn test_default_face_has_all_features() {
        let landmarks = LandmarkBuilder::new().build();
        assert_eq!(landmarks.len(), 478);

        for contour in [LEFT_EYE, RIGHT_EYE, MOUTH_OUTLINE] {
            let bbox = feature_bbox(&landmarks, contour, 640, 480, 0).unwrap();
            assert!(bbox.width() > 0 && bbox.height() > 0);
        }
    }

    #[test]
    fn test_eye_placement() {
        let landmarks = LandmarkBuilder::new().left_eye_at(0.25, 0.5).build();
        let bbox = feature_bbox(&landmarks, LEFT_EYE, 640, 480, 0).unwrap();
        assert!(bbox.x_min < 160 && bbox.x_max > 160);
        assert!(bbox.y_min < 240 && bbox.y_max > 240);
    }

    #[test]
    fn test_right_eye_placement_leaves_left_eye() {
        let landmarks = LandmarkBuilder::new().right_eye_at(0.75, 0.5).build();
        let right = feature_bbox(&landmarks, RIGHT_EYE, 640, 480, 0).unwrap();
        assert!(right.x_min < 480 && right.x_max > 480);
        assert!(right.y_min < 240 && right.y_max > 240);

        let left = feature_bbox(&landmarks, LEFT_EYE, 640, 480, 0).unwrap();
        assert!(left.x_max < 480);
    }

    #[test]
    fn test_removed_features_are_off_frame() {
        let landmarks = LandmarkBuilder::new().without_eyes().without_mouth().build();
        assert!(feature_bbox(&landmarks, LEFT_EYE, 640, 480, 5).is_none());
        assert!(feature_bbox(&landmarks, RIGHT_EYE, 640, 480, 5).is_none());
        assert!(feature_bbox(&landmarks, MOUTH_OUTLINE, 640, 480, 10).is_none());
    }

    #[test]
    fn test_mouth_aspect_ratio_follows_opening() {
        let closed = mouth_aspect_ratio(&LandmarkBuilder::new().build(), 640, 480);
        let open = mouth_aspect_ratio(&LandmarkBuilder::new().yawning().build(), 640, 480);
        assert!(closed < 0.5);
        assert!((open - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_with_len_truncates() {
        assert_eq!(LandmarkBuilder::new().with_len(100).build().len(), 100);
    }

    #[test]
    fn test_encoded_frames_decode() {
        let png = image::load_from_memory(&SyntheticFrameBuilder::png(32, 24)).unwrap();
        assert_eq!((png.width(), png.height()), (32, 24));

        let jpeg = image::load_from_memory(&SyntheticFrameBuilder::jpeg(32, 24)).unwrap();
        assert_eq!((jpeg.width(), jpeg.height()), (32, 24));
    }

    #[test]
    fn test_broken_frames_fail_to_decode() {
        assert!(image::load_from_memory(&SyntheticFrameBuilder::garbage()).is_err());
        assert!(image::load_from_memory(&SyntheticFrameBuilder::truncated_png()).is_err());
    }
}

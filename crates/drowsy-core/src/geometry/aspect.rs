//! Mouth aspect ratio, a geometric proxy for mouth openness.

use tracing::debug;

use super::indices::{BOTTOM_LIP, LEFT_MOUTH_CORNER, RIGHT_MOUTH_CORNER, TOP_LIP};
use crate::domain::Landmarks;

/// Ratio of vertical lip separation to horizontal mouth-corner separation.
///
/// Distances are measured in normalized coordinates; `width` and `height` are
/// accepted for symmetry with the other geometry helpers and do not affect the
/// result. Returns `0.0` when a required landmark is missing or the mouth
/// corners coincide.
#[must_use]
pub fn mouth_aspect_ratio(landmarks: &Landmarks, _width: u32, _height: u32) -> f32 {
    let Some((vertical, horizontal)) = lip_distances(landmarks) else {
        debug!(
            "Could not compute mouth aspect ratio: only {} landmarks",
            landmarks.len()
        );
        return 0.0;
    };

    if horizontal == 0.0 {
        return 0.0;
    }

    vertical / horizontal
}

fn lip_distances(landmarks: &Landmarks) -> Option<(f32, f32)> {
    let top = landmarks.get(TOP_LIP)?;
    let bottom = landmarks.get(BOTTOM_LIP)?;
    let left = landmarks.get(LEFT_MOUTH_CORNER)?;
    let right = landmarks.get(RIGHT_MOUTH_CORNER)?;

    Some((top.distance(&bottom), left.distance(&right)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    fn mouth(top: Point, bottom: Point, left: Point, right: Point) -> Landmarks {
        let mut points = vec![Point::default(); 300];
        points[TOP_LIP] = top;
        points[BOTTOM_LIP] = bottom;
        points[LEFT_MOUTH_CORNER] = left;
        points[RIGHT_MOUTH_CORNER] = right;
        Landmarks::new(points)
    }

    #[test]
    fn test_open_mouth_ratio() {
        let lm = mouth(
            Point::new(0.5, 0.60),
            Point::new(0.5, 0.66),
            Point::new(0.45, 0.63),
            Point::new(0.55, 0.63),
        );
        assert!((mouth_aspect_ratio(&lm, 640, 480) - 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_ratio_ignores_frame_size() {
        let lm = mouth(
            Point::new(0.5, 0.60),
            Point::new(0.5, 0.62),
            Point::new(0.40, 0.61),
            Point::new(0.60, 0.61),
        );
        let a = mouth_aspect_ratio(&lm, 640, 480);
        let b = mouth_aspect_ratio(&lm, 10, 3000);
        assert!((a - b).abs() < f32::EPSILON);
        assert!((a - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_coincident_corners_returns_zero() {
        for gap in [0.0, 0.05, 0.5] {
            let lm = mouth(
                Point::new(0.5, 0.5),
                Point::new(0.5, 0.5 + gap),
                Point::new(0.5, 0.55),
                Point::new(0.5, 0.55),
            );
            assert!(mouth_aspect_ratio(&lm, 640, 480).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_missing_landmarks_returns_zero() {
        let lm = Landmarks::new(vec![Point::new(0.5, 0.5); 100]);
        assert!(mouth_aspect_ratio(&lm, 640, 480).abs() < f32::EPSILON);
        assert!(mouth_aspect_ratio(&Landmarks::default(), 640, 480).abs() < f32::EPSILON);
    }
}

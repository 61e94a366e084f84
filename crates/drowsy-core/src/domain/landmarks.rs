//! Facial landmark types.

use serde::{Deserialize, Serialize};

/// A normalized 2-D landmark coordinate.
///
/// Both components are fractions of the frame size, nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position as a fraction of frame width.
    pub x: f32,
    /// Vertical position as a fraction of frame height.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point in normalized space.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Landmarks of a single detected face, indexed by the face-mesh numbering scheme.
///
/// Produced once per frame by a [`LandmarkProvider`](crate::ports::LandmarkProvider)
/// and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Landmarks {
    points: Vec<Point>,
}

impl Landmarks {
    /// Wraps an ordered list of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Returns the landmark at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Number of landmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no landmarks are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All landmarks in index order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl From<Vec<Point>> for Landmarks {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

//! Face-mesh landmark indices for the features the pipeline inspects.
//!
//! Indices follow the 478-point refined face-mesh topology. All of them are
//! also valid for the 468-point mesh without iris refinement.

/// Contour of the subject's left eye.
pub const LEFT_EYE: &[usize] = &[
    362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
];

/// Contour of the subject's right eye.
pub const RIGHT_EYE: &[usize] = &[
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];

/// Outer and inner lip outline.
pub const MOUTH_OUTLINE: &[usize] = &[
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 308, 324, 318, 402, 317, 14, 87, 178, 88,
    95, 78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308,
];

/// Upper lip, inner edge.
pub const TOP_LIP: usize = 13;
/// Lower lip, inner edge.
pub const BOTTOM_LIP: usize = 14;
/// Left mouth corner.
pub const LEFT_MOUTH_CORNER: usize = 61;
/// Right mouth corner.
pub const RIGHT_MOUTH_CORNER: usize = 291;

/// Number of landmarks in the refined (iris) mesh.
pub const REFINED_LANDMARK_COUNT: usize = 478;
/// Number of landmarks in the base mesh.
pub const BASE_LANDMARK_COUNT: usize = 468;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_fit_base_mesh() {
        let max = LEFT_EYE
            .iter()
            .chain(RIGHT_EYE)
            .chain(MOUTH_OUTLINE)
            .chain(&[TOP_LIP, BOTTOM_LIP, LEFT_MOUTH_CORNER, RIGHT_MOUTH_CORNER])
            .copied()
            .max()
            .unwrap_or_default();
        assert!(max < BASE_LANDMARK_COUNT);
    }

    #[test]
    fn test_aspect_points_are_on_mouth_outline() {
        for idx in [TOP_LIP, BOTTOM_LIP, LEFT_MOUTH_CORNER, RIGHT_MOUTH_CORNER] {
            assert!(MOUTH_OUTLINE.contains(&idx));
        }
    }
}

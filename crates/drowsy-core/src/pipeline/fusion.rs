//! Threshold and fusion rules turning classifier outputs into statuses.

use crate::domain::{EyeStatus, YawnStatus};

/// Labels a single eye from its open-eye confidence.
#[must_use]
pub fn eye_status_for(confidence: f32, open_threshold: f32) -> EyeStatus {
    if confidence > open_threshold {
        EyeStatus::Open
    } else {
        EyeStatus::Closed
    }
}

/// Combines per-eye labels into one status.
///
/// A single closed eye wins over any open eye. With no classified eye at all
/// the result is [`EyeStatus::NotDetected`]. Order does not matter.
#[must_use]
pub fn fuse_eye_statuses<I>(statuses: I) -> EyeStatus
where
    I: IntoIterator<Item = EyeStatus>,
{
    let mut any_open = false;
    for status in statuses {
        match status {
            EyeStatus::Closed => return EyeStatus::Closed,
            EyeStatus::Open => any_open = true,
            EyeStatus::NotDetected | EyeStatus::NoFace => {}
        }
    }

    if any_open {
        EyeStatus::Open
    } else {
        EyeStatus::NotDetected
    }
}

/// Yawning if either the classifier confidence or the mouth aspect ratio
/// exceeds its threshold.
#[must_use]
pub fn yawn_status(
    confidence: f32,
    aspect_ratio: f32,
    confidence_threshold: f32,
    aspect_ratio_threshold: f32,
) -> YawnStatus {
    if confidence > confidence_threshold || aspect_ratio > aspect_ratio_threshold {
        YawnStatus::Yawning
    } else {
        YawnStatus::NotYawning
    }
}

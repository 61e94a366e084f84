//! Per-frame verdict types returned to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// Combined or per-eye state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyeStatus {
    /// Eye classifier reported open.
    #[serde(rename = "Open Eyes")]
    Open,
    /// Eye classifier reported closed.
    #[serde(rename = "Closed Eyes")]
    Closed,
    /// A face was found but neither eye region could be extracted.
    #[serde(rename = "No Eyes Detected")]
    NotDetected,
    /// No face in the frame.
    #[serde(rename = "No Face")]
    NoFace,
}

impl EyeStatus {
    /// Wire label for this status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open Eyes",
            Self::Closed => "Closed Eyes",
            Self::NotDetected => "No Eyes Detected",
            Self::NoFace => "No Face",
        }
    }
}

impl fmt::Display for EyeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mouth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YawnStatus {
    /// Yawn classifier or mouth aspect ratio crossed its threshold.
    #[serde(rename = "Yawning")]
    Yawning,
    /// Neither yawn signal fired.
    #[serde(rename = "Not Yawning")]
    NotYawning,
    /// A face was found but the mouth region could not be extracted.
    #[serde(rename = "No Mouth Detected")]
    NotDetected,
    /// No face in the frame.
    #[serde(rename = "No Face")]
    NoFace,
}

impl YawnStatus {
    /// Wire label for this status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yawning => "Yawning",
            Self::NotYawning => "Not Yawning",
            Self::NotDetected => "No Mouth Detected",
            Self::NoFace => "No Face",
        }
    }
}

impl fmt::Display for YawnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result for a single classified eye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeResult {
    /// Eye region in the canonical frame.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Open or closed.
    pub status: EyeStatus,
}

/// Result for the classified mouth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouthResult {
    /// Mouth region in the canonical frame.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Yawning or not.
    pub status: YawnStatus,
    /// Raw yawn classifier confidence (0.0 to 1.0).
    pub confidence: f32,
}

/// Aggregate verdict for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameVerdict {
    /// Combined status over both eyes.
    pub eye_status: EyeStatus,
    /// Per-eye results, left eye first when present.
    pub eyes: Vec<EyeResult>,
    /// Mouth status.
    pub yawn_status: YawnStatus,
    /// Mouth details, `null` when no mouth was classified.
    pub mouth: Option<MouthResult>,
}

impl FrameVerdict {
    /// Verdict for a frame without a detectable face.
    #[must_use]
    pub const fn no_face() -> Self {
        Self {
            eye_status: EyeStatus::NoFace,
            eyes: Vec::new(),
            yawn_status: YawnStatus::NoFace,
            mouth: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_json_shape() {
        let json = serde_json::to_value(FrameVerdict::no_face()).unwrap_or_default();
        assert_eq!(json["eye_status"], "No Face");
        assert_eq!(json["yawn_status"], "No Face");
        assert_eq!(json["eyes"].as_array().map(Vec::len), Some(0));
        assert!(json["mouth"].is_null());
    }

    #[test]
    fn test_labels_match_serde() {
        for status in [
            EyeStatus::Open,
            EyeStatus::Closed,
            EyeStatus::NotDetected,
            EyeStatus::NoFace,
        ] {
            let json = serde_json::to_value(status).unwrap_or_default();
            assert_eq!(json, status.label());
        }
        for status in [
            YawnStatus::Yawning,
            YawnStatus::NotYawning,
            YawnStatus::NotDetected,
            YawnStatus::NoFace,
        ] {
            let json = serde_json::to_value(status).unwrap_or_default();
            assert_eq!(json, status.label());
        }
    }

    #[test]
    fn test_mouth_result_fields() {
        let mouth = MouthResult {
            bbox: BoundingBox::new(1, 2, 30, 40).unwrap_or_else(|| panic!("valid box")),
            status: YawnStatus::Yawning,
            confidence: 0.75,
        };
        let json = serde_json::to_value(&mouth).unwrap_or_default();
        assert_eq!(json["box"], serde_json::json!([1, 2, 30, 40]));
        assert_eq!(json["status"], "Yawning");
        assert!((json["confidence"].as_f64().unwrap_or_default() - 0.75).abs() < 1e-6);
    }
}

//! Decision thresholds and geometry settings for the frame pipeline.

/// Default tuning values.
///
/// The yawn thresholds were chosen empirically and may need retuning per deployment.
pub mod defaults {
    /// Canonical frame width every input is resized to.
    pub const FRAME_WIDTH: u32 = 640;
    /// Canonical frame height every input is resized to.
    pub const FRAME_HEIGHT: u32 = 480;

    /// Pixels added around the eye contour.
    pub const EYE_PADDING: u32 = 5;
    /// Eye classifier input edge length.
    pub const EYE_INPUT_SIZE: u32 = 224;
    /// Eye confidence above which an eye counts as open.
    pub const EYE_OPEN_THRESHOLD: f32 = 0.5;

    /// Pixels added around the mouth outline.
    pub const MOUTH_PADDING: u32 = 10;
    /// Yawn classifier input edge length.
    pub const YAWN_INPUT_SIZE: u32 = 64;
    /// Yawn confidence above which the mouth counts as yawning.
    pub const YAWN_THRESHOLD: f32 = 0.6;
    /// Mouth aspect ratio above which the mouth counts as yawning.
    pub const MAR_THRESHOLD: f32 = 0.5;
}

/// Configuration for [`FramePipeline`](super::FramePipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Canonical `(width, height)` frames are resized to before detection.
    pub frame_size: (u32, u32),
    /// Padding around eye regions, in pixels.
    pub eye_padding: u32,
    /// Eye classifier input `(width, height)`.
    pub eye_input_size: (u32, u32),
    /// Eye confidence threshold (open if strictly above).
    pub eye_open_threshold: f32,
    /// Padding around the mouth region, in pixels.
    pub mouth_padding: u32,
    /// Yawn classifier input `(width, height)`.
    pub yawn_input_size: (u32, u32),
    /// Yawn confidence threshold (yawning if strictly above).
    pub yawn_threshold: f32,
    /// Mouth aspect ratio threshold (yawning if strictly above).
    pub mar_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_size: (defaults::FRAME_WIDTH, defaults::FRAME_HEIGHT),
            eye_padding: defaults::EYE_PADDING,
            eye_input_size: (defaults::EYE_INPUT_SIZE, defaults::EYE_INPUT_SIZE),
            eye_open_threshold: defaults::EYE_OPEN_THRESHOLD,
            mouth_padding: defaults::MOUTH_PADDING,
            yawn_input_size: (defaults::YAWN_INPUT_SIZE, defaults::YAWN_INPUT_SIZE),
            yawn_threshold: defaults::YAWN_THRESHOLD,
            mar_threshold: defaults::MAR_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Sets the eye open threshold.
    #[must_use]
    pub const fn with_eye_threshold(mut self, threshold: f32) -> Self {
        self.eye_open_threshold = threshold;
        self
    }

    /// Sets the yawn confidence threshold.
    #[must_use]
    pub const fn with_yawn_threshold(mut self, threshold: f32) -> Self {
        self.yawn_threshold = threshold;
        self
    }

    /// Sets the mouth aspect ratio threshold.
    #[must_use]
    pub const fn with_mar_threshold(mut self, threshold: f32) -> Self {
        self.mar_threshold = threshold;
        self
    }

    /// Sets eye and mouth paddings.
    #[must_use]
    pub const fn with_paddings(mut self, eye: u32, mouth: u32) -> Self {
        self.eye_padding = eye;
        self.mouth_padding = mouth;
        self
    }
}

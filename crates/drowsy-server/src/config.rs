//! Configuration file support for drowsy-watch.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/drowsy-watch/config.toml` (lowest priority)
//! - Project-local: `.drowsy.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use drowsy_core::inference::LandmarkSettings;
use drowsy_core::PipelineConfig;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".drowsy.toml";

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Eye classification settings.
    pub eyes: EyesConfig,
    /// Yawn classification settings.
    pub yawn: YawnConfig,
    /// Landmark model settings.
    pub landmarks: LandmarksConfig,
    /// Model settings.
    pub models: ModelsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:8080`.
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    pub body_limit_bytes: Option<usize>,
}

/// Eye classification configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct EyesConfig {
    /// Open-eye confidence threshold (0.0-1.0).
    pub threshold: Option<f32>,
    /// Padding around the eye contour in pixels.
    pub padding: Option<u32>,
    /// Classifier input edge length.
    pub input_size: Option<u32>,
}

/// Yawn classification configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct YawnConfig {
    /// Yawn confidence threshold (0.0-1.0).
    pub threshold: Option<f32>,
    /// Mouth aspect ratio threshold.
    pub mar_threshold: Option<f32>,
    /// Padding around the mouth outline in pixels.
    pub padding: Option<u32>,
    /// Classifier input edge length.
    pub input_size: Option<u32>,
}

/// Landmark model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LandmarksConfig {
    /// Maximum number of faces taken from the detector.
    pub max_num_faces: Option<usize>,
    /// Use the 478-point iris-refined mesh.
    pub refine_landmarks: Option<bool>,
    /// Minimum face detector score (0.0-1.0).
    pub min_detection_confidence: Option<f32>,
    /// Minimum face mesh presence score (0.0-1.0).
    pub min_tracking_confidence: Option<f32>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/drowsy-watch/config.toml`
    /// 2. Project-local: `.drowsy.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Unreadable or invalid files are
    /// logged as warnings and skipped.
    #[must_use]
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(xdg_config_path().as_deref(), cwd.as_deref())
    }

    /// Layers the XDG file at `xdg` under the first project file found upward from `start`.
    #[must_use]
    pub fn load_from(xdg: Option<&Path>, start: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = start.and_then(find_config_in_parents) {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending key.
    pub fn validate(&self) -> Result<(), String> {
        let unit_ranged = [
            ("eyes.threshold", self.eyes.threshold),
            ("yawn.threshold", self.yawn.threshold),
            (
                "landmarks.min_detection_confidence",
                self.landmarks.min_detection_confidence,
            ),
            (
                "landmarks.min_tracking_confidence",
                self.landmarks.min_tracking_confidence,
            ),
        ];
        for (key, value) in unit_ranged {
            if let Some(t) = value {
                if !(0.0..=1.0).contains(&t) {
                    return Err(format!("{key} must be 0.0-1.0, got {t}"));
                }
            }
        }

        if let Some(t) = self.yawn.mar_threshold {
            if !t.is_finite() || t < 0.0 {
                return Err(format!("yawn.mar_threshold must be non-negative, got {t}"));
            }
        }

        for (key, value) in [
            ("eyes.input_size", self.eyes.input_size),
            ("yawn.input_size", self.yawn.input_size),
        ] {
            if value == Some(0) {
                return Err(format!("{key} must be positive"));
            }
        }

        if self.landmarks.max_num_faces == Some(0) {
            return Err("landmarks.max_num_faces must be at least 1".to_string());
        }
        if self.server.body_limit_bytes == Some(0) {
            return Err("server.body_limit_bytes must be positive".to_string());
        }

        if let Some(ref bind) = self.server.bind {
            if bind.parse::<SocketAddr>().is_err() {
                return Err(format!(
                    "server.bind must be a socket address like '{DEFAULT_BIND}', got '{bind}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Server
        self.server.bind = other.server.bind.or_else(|| self.server.bind.take());
        self.server.body_limit_bytes = other
            .server
            .body_limit_bytes
            .or(self.server.body_limit_bytes);

        // Eyes
        self.eyes.threshold = other.eyes.threshold.or(self.eyes.threshold);
        self.eyes.padding = other.eyes.padding.or(self.eyes.padding);
        self.eyes.input_size = other.eyes.input_size.or(self.eyes.input_size);

        // Yawn
        self.yawn.threshold = other.yawn.threshold.or(self.yawn.threshold);
        self.yawn.mar_threshold = other.yawn.mar_threshold.or(self.yawn.mar_threshold);
        self.yawn.padding = other.yawn.padding.or(self.yawn.padding);
        self.yawn.input_size = other.yawn.input_size.or(self.yawn.input_size);

        // Landmarks
        self.landmarks.max_num_faces = other
            .landmarks
            .max_num_faces
            .or(self.landmarks.max_num_faces);
        self.landmarks.refine_landmarks = other
            .landmarks
            .refine_landmarks
            .or(self.landmarks.refine_landmarks);
        self.landmarks.min_detection_confidence = other
            .landmarks
            .min_detection_confidence
            .or(self.landmarks.min_detection_confidence);
        self.landmarks.min_tracking_confidence = other
            .landmarks
            .min_tracking_confidence
            .or(self.landmarks.min_tracking_confidence);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
    }

    /// Pipeline settings from this config over the hardcoded defaults.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(t) = self.eyes.threshold {
            config.eye_open_threshold = t;
        }
        if let Some(p) = self.eyes.padding {
            config.eye_padding = p;
        }
        if let Some(s) = self.eyes.input_size {
            config.eye_input_size = (s, s);
        }

        if let Some(t) = self.yawn.threshold {
            config.yawn_threshold = t;
        }
        if let Some(t) = self.yawn.mar_threshold {
            config.mar_threshold = t;
        }
        if let Some(p) = self.yawn.padding {
            config.mouth_padding = p;
        }
        if let Some(s) = self.yawn.input_size {
            config.yawn_input_size = (s, s);
        }

        config
    }

    /// Landmark settings from this config over the hardcoded defaults.
    #[must_use]
    pub fn landmark_settings(&self) -> LandmarkSettings {
        let defaults = LandmarkSettings::default();
        LandmarkSettings {
            max_num_faces: self.landmarks.max_num_faces.unwrap_or(defaults.max_num_faces),
            refine_landmarks: self
                .landmarks
                .refine_landmarks
                .unwrap_or(defaults.refine_landmarks),
            min_detection_confidence: self
                .landmarks
                .min_detection_confidence
                .unwrap_or(defaults.min_detection_confidence),
            min_tracking_confidence: self
                .landmarks
                .min_tracking_confidence
                .unwrap_or(defaults.min_tracking_confidence),
        }
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("drowsy-watch").join("config.toml"))
}

/// Search for `.drowsy.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load, parse and validate a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    let config: AppConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            return None;
        }
    };

    if let Err(e) = config.validate() {
        warn!("Ignoring config file {}: {e}", path.display());
        return None;
    }

    Some(config)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.server.bind.is_none());
        assert!(config.eyes.threshold.is_none());
        assert!(config.yawn.mar_threshold.is_none());
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
        assert_eq!(config.landmark_settings(), LandmarkSettings::default());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.models.dir.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[server]
bind = '127.0.0.1:8080'
body_limit_bytes = 1048576

[eyes]
threshold = 0.45
padding = 4
input_size = 128

[yawn]
threshold = 0.7
mar_threshold = 0.55
padding = 12
input_size = 64

[landmarks]
max_num_faces = 1
refine_landmarks = false
min_detection_confidence = 0.6
min_tracking_confidence = 0.4

[models]
dir = '/opt/models'
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.server.bind.as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(config.server.body_limit_bytes, Some(1_048_576));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert!(config.validate().is_ok());

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.eye_open_threshold, 0.45);
        assert_eq!(pipeline.eye_padding, 4);
        assert_eq!(pipeline.eye_input_size, (128, 128));
        assert_eq!(pipeline.yawn_threshold, 0.7);
        assert_eq!(pipeline.mar_threshold, 0.55);
        assert_eq!(pipeline.mouth_padding, 12);

        let settings = config.landmark_settings();
        assert!(!settings.refine_landmarks);
        assert_eq!(settings.min_detection_confidence, 0.6);
        assert_eq!(settings.min_tracking_confidence, 0.4);
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[eyes]
threshold = 0.5

[yawn]
mar_threshold = 0.4
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[eyes]
threshold = 0.7

[landmarks]
refine_landmarks = false
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.eyes.threshold, Some(0.7));
        assert_eq!(base.yawn.mar_threshold, Some(0.4));
        assert_eq!(base.landmarks.refine_landmarks, Some(false));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[server]
bind = '127.0.0.1:9000'

[models]
dir = '/base/models'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.server.bind.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(base.models.dir, Some(PathBuf::from("/base/models")));
    }

    #[test]
    fn test_invalid_field_type_rejected() {
        let toml = r#"
[eyes]
threshold = "not a number"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    // === Validation Tests ===

    #[test]
    fn test_validate_thresholds_out_of_range() {
        let mut config = AppConfig::default();
        config.eyes.threshold = Some(1.5);
        assert!(config.validate().unwrap_err().contains("eyes.threshold"));

        let mut config = AppConfig::default();
        config.yawn.threshold = Some(-0.1);
        assert!(config.validate().unwrap_err().contains("yawn.threshold"));

        let mut config = AppConfig::default();
        config.landmarks.min_tracking_confidence = Some(2.0);
        assert!(config
            .validate()
            .unwrap_err()
            .contains("landmarks.min_tracking_confidence"));
    }

    #[test]
    fn test_validate_mar_threshold_above_one() {
        let mut config = AppConfig::default();
        config.yawn.mar_threshold = Some(1.4);
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline_config().mar_threshold, 1.4);

        config.yawn.mar_threshold = Some(-0.2);
        assert!(config
            .validate()
            .unwrap_err()
            .contains("yawn.mar_threshold must be non-negative"));

        config.yawn.mar_threshold = Some(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bind_address() {
        let mut config = AppConfig::default();
        config.server.bind = Some("localhost".to_string());
        assert!(config.validate().unwrap_err().contains("server.bind"));

        config.server.bind = Some(DEFAULT_BIND.to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sizes() {
        let mut config = AppConfig::default();
        config.eyes.input_size = Some(0);
        assert!(config.validate().unwrap_err().contains("eyes.input_size"));

        let mut config = AppConfig::default();
        config.landmarks.max_num_faces = Some(0);
        assert!(config.validate().is_err());
    }

    // === File Layering ===

    #[test]
    fn test_load_from_layers_project_over_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let xdg = xdg_dir.path().join("config.toml");
        std::fs::write(&xdg, "[eyes]\nthreshold = 0.3\n[yawn]\nthreshold = 0.8\n").unwrap();

        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join(PROJECT_CONFIG_FILE), "[eyes]\nthreshold = 0.4\n")
            .unwrap();
        let nested = project.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = AppConfig::load_from(Some(&xdg), Some(&nested));
        assert_eq!(config.eyes.threshold, Some(0.4));
        assert_eq!(config.yawn.threshold, Some(0.8));
    }

    #[test]
    fn test_load_from_skips_invalid_file() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let xdg = xdg_dir.path().join("config.toml");
        std::fs::write(&xdg, "[eyes]\nthreshold = 0.3\n").unwrap();

        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join(PROJECT_CONFIG_FILE), "[eyes]\nthreshold = 3.0\n")
            .unwrap();

        let config = AppConfig::load_from(Some(&xdg), Some(project.path()));
        assert_eq!(config.eyes.threshold, Some(0.3));
    }

    #[test]
    fn test_load_from_missing_files() {
        let config = AppConfig::load_from(Some(Path::new("/nonexistent/config.toml")), None);
        assert!(config.eyes.threshold.is_none());
    }
}

//! CLI command definitions and handlers.

pub mod analyze;
pub mod models;
pub mod serve;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use drowsy_adapters::{ModelBundle, ModelPaths};
use drowsy_core::inference::get_device;
use drowsy_core::FramePipeline;
use drowsy_server::config::AppConfig;
use tracing::info;

/// Drowsy Watch - eye-closure and yawn detection for single video frames
#[derive(Parser)]
#[command(name = "drowsy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the frame analysis HTTP endpoint
    Serve(serve::ServeArgs),
    /// Analyze image files and print one verdict per line
    Analyze(analyze::AnalyzeArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything succeeded.
    Success,
    /// At least one input failed, or a command error.
    Error,
    /// Startup failed (models could not be loaded, address unavailable).
    Fatal,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::Error => Self::from(1),
            ExitCode::Fatal => Self::from(2),
        }
    }
}

/// Parse and validate a threshold value (0.0-1.0).
fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse a non-negative ratio such as the mouth aspect ratio threshold.
fn parse_ratio(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a non-negative number"))
    }
}

/// Pipeline tuning flags shared by `serve` and `analyze`.
#[derive(Args, Clone, Default)]
pub struct PipelineArgs {
    /// Open-eye confidence threshold (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub eye_threshold: Option<f32>,

    /// Yawn confidence threshold (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub yawn_threshold: Option<f32>,

    /// Mouth aspect ratio threshold (non-negative)
    #[arg(long, value_parser = parse_ratio)]
    pub mar_threshold: Option<f32>,

    /// Padding around eye regions in pixels
    #[arg(long, value_name = "PX")]
    pub eye_padding: Option<u32>,

    /// Padding around the mouth region in pixels
    #[arg(long, value_name = "PX")]
    pub mouth_padding: Option<u32>,

    /// Minimum face detector score (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_detection_confidence: Option<f32>,

    /// Minimum face mesh presence score (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_tracking_confidence: Option<f32>,

    /// Use the 468-point mesh without iris refinement
    #[arg(long)]
    pub no_refine: bool,
}

impl PipelineArgs {
    /// Returns `config` with these CLI values layered on top.
    #[must_use]
    pub fn layered(&self, config: &AppConfig) -> AppConfig {
        let mut config = config.clone();

        config.eyes.threshold = self.eye_threshold.or(config.eyes.threshold);
        config.eyes.padding = self.eye_padding.or(config.eyes.padding);
        config.yawn.threshold = self.yawn_threshold.or(config.yawn.threshold);
        config.yawn.mar_threshold = self.mar_threshold.or(config.yawn.mar_threshold);
        config.yawn.padding = self.mouth_padding.or(config.yawn.padding);
        config.landmarks.min_detection_confidence = self
            .min_detection_confidence
            .or(config.landmarks.min_detection_confidence);
        config.landmarks.min_tracking_confidence = self
            .min_tracking_confidence
            .or(config.landmarks.min_tracking_confidence);
        if self.no_refine {
            config.landmarks.refine_landmarks = Some(false);
        }

        config
    }
}

/// Loads every model from the active models directory and builds the pipeline.
///
/// # Errors
///
/// Returns an error if any model is missing or fails to load.
pub fn load_pipeline(config: &AppConfig) -> Result<FramePipeline> {
    let paths = ModelPaths::installed();
    let pipeline_config = config.pipeline_config();
    let settings = config.landmark_settings();

    info!("Loading models from {}", drowsy_adapters::models_dir().display());
    let bundle = ModelBundle::load(&paths, &get_device(), settings, &pipeline_config)?;

    Ok(bundle.into_pipeline(pipeline_config))
}

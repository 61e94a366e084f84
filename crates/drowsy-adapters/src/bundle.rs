//! Startup loading of every model the frame pipeline needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use candle_core::Device;
use drowsy_core::inference::{
    load_safetensors, BlazeFace, ClassifierSpec, CropClassifier, FaceMesh, LandmarkSettings,
    MeshLandmarkProvider,
};
use drowsy_core::{FramePipeline, PipelineConfig};
use tracing::info;

use crate::models::{self, BLAZEFACE, EYE_STATE, FACE_MESH, YAWN};

/// Weight file locations for the four pipeline models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Face detector weights.
    pub blazeface: PathBuf,
    /// Face mesh weights.
    pub face_mesh: PathBuf,
    /// Eye-state classifier weights.
    pub eye_state: PathBuf,
    /// Yawn classifier weights.
    pub yawn: PathBuf,
}

impl ModelPaths {
    /// Registry filenames inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        let file = |name: &str| {
            dir.join(models::model_info(name).map_or("", |m| m.filename))
        };
        Self {
            blazeface: file(BLAZEFACE),
            face_mesh: file(FACE_MESH),
            eye_state: file(EYE_STATE),
            yawn: file(YAWN),
        }
    }

    /// Registry filenames inside the active models directory.
    #[must_use]
    pub fn installed() -> Self {
        Self::in_dir(&models::models_dir())
    }

    /// Paths that do not exist on disk.
    #[must_use]
    pub fn missing(&self) -> Vec<&Path> {
        [&self.blazeface, &self.face_mesh, &self.eye_state, &self.yawn]
            .into_iter()
            .filter(|p| !p.exists())
            .map(PathBuf::as_path)
            .collect()
    }
}

/// The loaded models, shared read-only by every request.
pub struct ModelBundle {
    /// Detector + mesh landmark provider.
    pub landmarks: Arc<MeshLandmarkProvider>,
    /// Eye-state classifier.
    pub eye_model: Arc<CropClassifier>,
    /// Yawn classifier.
    pub yawn_model: Arc<CropClassifier>,
}

impl ModelBundle {
    /// Loads all four models.
    ///
    /// Classifier input sizes are taken from `config`, so they must match the weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight file is missing, unreadable, or does not
    /// fit the expected architecture.
    pub fn load(
        paths: &ModelPaths,
        device: &Device,
        settings: LandmarkSettings,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let missing = paths.missing();
        if !missing.is_empty() {
            let list: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            bail!(
                "Missing model files: {}. Run `drowsy models fetch` to download them.",
                list.join(", ")
            );
        }

        let detector = BlazeFace::new(load_safetensors(&paths.blazeface, device)?)
            .context("Failed to load face detector")?;
        let mesh = FaceMesh::new(
            load_safetensors(&paths.face_mesh, device)?,
            settings.num_landmarks(),
        )
        .context("Failed to load face mesh")?;
        let landmarks = MeshLandmarkProvider::new(detector, mesh, settings)?;
        info!(
            landmarks = settings.num_landmarks(),
            "Loaded landmark models"
        );

        let eye_spec = ClassifierSpec {
            input_size: square_side(config.eye_input_size, "eye")?,
            ..ClassifierSpec::eye()
        };
        let eye_model = CropClassifier::new(load_safetensors(&paths.eye_state, device)?, &eye_spec)
            .context("Failed to load eye-state classifier")?;

        let yawn_spec = ClassifierSpec {
            input_size: square_side(config.yawn_input_size, "yawn")?,
            ..ClassifierSpec::yawn()
        };
        let yawn_model = CropClassifier::new(load_safetensors(&paths.yawn, device)?, &yawn_spec)
            .context("Failed to load yawn classifier")?;
        info!("Loaded eye and yawn classifiers");

        Ok(Self {
            landmarks: Arc::new(landmarks),
            eye_model: Arc::new(eye_model),
            yawn_model: Arc::new(yawn_model),
        })
    }

    /// Wires the models into a frame pipeline.
    #[must_use]
    pub fn into_pipeline(self, config: PipelineConfig) -> FramePipeline {
        FramePipeline::new(self.landmarks, self.eye_model, self.yawn_model, config)
    }
}

fn square_side((width, height): (u32, u32), model: &str) -> Result<u32> {
    if width != height {
        bail!("The {model} classifier needs a square input, got {width}x{height}");
    }
    Ok(width)
}

//! Model downloading and caching adapter.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Placeholder checksum indicating verification should be skipped.
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Download chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Pipeline stage the model serves.
    pub role: &'static str,
    /// Download URL (GitHub releases).
    pub url: &'static str,
    /// Expected SHA256 hash. Set to all zeros to skip verification during development.
    pub sha256: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
}

/// Face detector name.
pub const BLAZEFACE: &str = "blazeface";
/// Face mesh name.
pub const FACE_MESH: &str = "face_mesh";
/// Eye-state classifier name.
pub const EYE_STATE: &str = "eye_state";
/// Yawn classifier name.
pub const YAWN: &str = "yawn";

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: BLAZEFACE,
        role: "face detector",
        url: "https://github.com/drowsy-watch/drowsy-watch/releases/download/models-v1/blazeface.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "blazeface.safetensors",
    },
    ModelInfo {
        name: FACE_MESH,
        role: "face landmarks",
        url: "https://github.com/drowsy-watch/drowsy-watch/releases/download/models-v1/face_mesh.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "face_mesh.safetensors",
    },
    ModelInfo {
        name: EYE_STATE,
        role: "eye open/closed classifier",
        url: "https://github.com/drowsy-watch/drowsy-watch/releases/download/models-v1/eye_state.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "eye_state.safetensors",
    },
    ModelInfo {
        name: YAWN,
        role: "yawn classifier",
        url: "https://github.com/drowsy-watch/drowsy-watch/releases/download/models-v1/yawn.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "yawn.safetensors",
    },
];

/// Download progress: `(model name, bytes downloaded, total bytes if known)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

static MODELS_DIR_OVERRIDE: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// Overrides the models directory for the rest of the process. `None` restores the default.
pub fn set_models_dir(dir: Option<PathBuf>) {
    if let Some(ref d) = dir {
        debug!("Using models directory {}", d.display());
    }
    *MODELS_DIR_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = dir;
}

/// Default models directory: `XDG_DATA_HOME/drowsy-watch/models` or
/// `~/.local/share/drowsy-watch/models`.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("drowsy-watch")
        .join("models")
}

/// Returns the models directory path, honoring [`set_models_dir`].
#[must_use]
pub fn models_dir() -> PathBuf {
    MODELS_DIR_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(default_models_dir)
}

/// Looks up a known model by name.
#[must_use]
pub fn model_info(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Downloads every missing model, reporting progress to `progress`.
///
/// Models already present on disk are left untouched.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn ensure_models_with_progress(progress: Option<&ProgressCallback>) -> Result<()> {
    let dir = models_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create models directory {}", dir.display()))?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(model, &path, progress)?;
        }
    }

    Ok(())
}

/// Downloads a model from its URL.
///
/// Streams into a `.part` file that is renamed into place once the checksum passes.
fn download_model(model: &ModelInfo, path: &Path, progress: Option<&ProgressCallback>) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let mut response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        bail!("Download failed with status: {}", response.status());
    }

    let total = response.content_length();
    let partial = path.with_extension("part");
    let mut writer = BufWriter::new(
        File::create(&partial).with_context(|| format!("Failed to create {}", partial.display()))?,
    );

    let mut hasher = Sha256::new();
    let mut downloaded = 0u64;
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = response
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", model.name))?;

        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(model.name, downloaded, total);
        }
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", model.name))?;
    drop(writer);

    let hash = format!("{:x}", hasher.finalize());
    if let Err(e) = verify_checksum(model, &hash, path) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, path).with_context(|| format!("Failed to install {}", path.display()))?;

    info!("Downloaded {} ({downloaded} bytes)", model.name);
    Ok(())
}

/// Compares a hex digest against the model's expected checksum (skip if placeholder).
fn verify_checksum(model: &ModelInfo, hash: &str, path: &Path) -> Result<()> {
    if model.sha256 == PLACEHOLDER_CHECKSUM {
        debug!(
            "Skipping checksum verification for {} (placeholder checksum)",
            model.name
        );
        return Ok(());
    }

    if hash != model.sha256 {
        bail!(
            "Checksum mismatch for {}: expected {}, got {}. \
             Try deleting {} and re-running to download a fresh copy.",
            model.name,
            model.sha256,
            hash,
            path.display()
        );
    }
    Ok(())
}

/// Returns the path to a specific model file.
#[must_use]
pub fn model_path(name: &str) -> Option<PathBuf> {
    model_info(name).map(|m| models_dir().join(m.filename))
}

/// Checks if all models are installed.
#[must_use]
pub fn all_models_installed() -> bool {
    list_models_in(&models_dir()).iter().all(|(_, installed)| *installed)
}

/// Lists installed models with their status.
#[must_use]
pub fn list_models() -> Vec<(String, bool)> {
    list_models_in(&models_dir())
}

/// Lists known models with whether each is present in `dir`.
#[must_use]
pub fn list_models_in(dir: &Path) -> Vec<(String, bool)> {
    MODELS
        .iter()
        .map(|m| (m.name.to_string(), dir.join(m.filename).exists()))
        .collect()
}

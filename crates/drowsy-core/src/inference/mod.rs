//! ML inference engine using Candle.
//!
//! Provides model loading and inference for:
//! - `BlazeFace` (face detection)
//! - Face mesh (468/478-point facial landmarks)
//! - Crop classifiers (eye state, yawn)

mod blazeface;
mod blocks;
mod classifier;
mod device;
mod face_mesh;
mod loader;
mod provider;
mod utils;

pub use blazeface::{BlazeFace, FaceDetection, INPUT_SIZE as BLAZEFACE_INPUT_SIZE};
pub use classifier::{ClassifierSpec, CropClassifier};
pub use device::get_device;
pub use face_mesh::{FaceMesh, MeshOutput, INPUT_SIZE as FACE_MESH_INPUT_SIZE};
pub use loader::load_safetensors;
pub use provider::{LandmarkSettings, MeshLandmarkProvider};
pub use utils::{rgb_to_tensor, sigmoid};

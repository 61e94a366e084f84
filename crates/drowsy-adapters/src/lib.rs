//! Drowsy Adapters - Model management for drowsy-watch.
//!
//! This crate provides adapters for:
//! - Model downloading and caching
//! - Loading the pipeline models at startup

pub mod bundle;
pub mod models;

pub use bundle::{ModelBundle, ModelPaths};
pub use models::{model_path, models_dir, set_models_dir};

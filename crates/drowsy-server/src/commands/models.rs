//! `drowsy models`: fetch, list and locate the inference weights.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use clap::{Args, Subcommand};
use drowsy_adapters::models::{
    ensure_models_with_progress, list_models_in, model_info, models_dir, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download the detector, face mesh and classifiers
    Fetch,
    /// Show which models are installed and what each one does
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
///
/// # Errors
///
/// Returns an error if a download fails.
pub fn run(args: &ModelsArgs) -> Result<()> {
    let dir = models_dir();
    match args.command {
        ModelsCommand::Fetch => fetch(&dir),
        ModelsCommand::List => {
            print!("{}", listing(&dir));
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", dir.display());
            Ok(())
        }
    }
}

fn fetch(dir: &Path) -> Result<()> {
    let missing = missing_models(dir);
    if missing.is_empty() {
        println!("All models already installed in {}", dir.display());
        return Ok(());
    }

    let pb = Arc::new(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );

    let current: Mutex<String> = Mutex::new(String::new());
    let bar = Arc::clone(&pb);
    let progress: ProgressCallback = Box::new(move |name: &str, downloaded: u64, total: Option<u64>| {
        let mut current = current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != name {
            *current = name.to_string();
            bar.set_length(total.unwrap_or(0));
            bar.set_position(0);
            bar.set_message(describe(name));
        }
        bar.set_position(downloaded);
    });

    ensure_models_with_progress(Some(&progress))?;

    pb.finish_with_message(format!("Downloaded {}", missing.join(", ")));
    Ok(())
}

fn missing_models(dir: &Path) -> Vec<String> {
    list_models_in(dir)
        .into_iter()
        .filter_map(|(name, installed)| (!installed).then_some(name))
        .collect()
}

fn describe(name: &str) -> String {
    model_info(name).map_or_else(|| name.to_string(), |m| format!("{name} ({})", m.role))
}

/// Renders the `models list` report for `dir`.
fn listing(dir: &Path) -> String {
    use std::fmt::Write as _;

    let models = list_models_in(dir);
    let mut out = format!("Models directory: {}\n\n", dir.display());

    for (name, installed) in &models {
        let mark = if *installed { "✓" } else { "✗" };
        let (role, filename) = model_info(name).map_or(("unknown", "unknown"), |m| (m.role, m.filename));
        let _ = writeln!(out, "  {mark} {name:<10} {role:<28} {filename}");
    }

    let installed = models.iter().filter(|(_, installed)| *installed).count();
    let _ = write!(out, "\n{installed}/{} models installed\n", models.len());
    if installed < models.len() {
        out.push_str("Run `drowsy models fetch` to download the rest\n");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_shows_roles_and_hint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yawn.safetensors"), b"w").unwrap();

        let report = listing(dir.path());
        assert!(report.contains("face detector"));
        assert!(report.contains("face landmarks"));
        assert!(report.contains("eye open/closed classifier"));
        assert!(report.contains("✓ yawn"));
        assert!(report.contains("✗ blazeface"));
        assert!(report.contains("1/4 models installed"));
        assert!(report.contains("drowsy models fetch"));
    }

    #[test]
    fn test_missing_models() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["blazeface", "face_mesh", "eye_state"] {
            std::fs::write(dir.path().join(format!("{name}.safetensors")), b"w").unwrap();
        }
        assert_eq!(missing_models(dir.path()), vec!["yawn".to_string()]);

        std::fs::write(dir.path().join("yawn.safetensors"), b"w").unwrap();
        assert!(missing_models(dir.path()).is_empty());
        assert!(!listing(dir.path()).contains("drowsy models fetch"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe("yawn"), "yawn (yawn classifier)");
        assert_eq!(describe("other"), "other");
    }
}

//! Analyze command - run the pipeline over image files.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use drowsy_core::FramePipeline;
use drowsy_server::config::AppConfig;
use tracing::{debug, info};

use super::{load_pipeline, ExitCode, PipelineArgs};

/// Arguments for the analyze command
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image files to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Run the analyze command.
pub fn run(args: &AnalyzeArgs, config: &AppConfig) -> ExitCode {
    let config = args.pipeline.layered(config);

    let pipeline = match load_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::Fatal;
        }
    };

    info!("Analyzing {} files", args.files.len());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut failed = 0usize;
    for path in &args.files {
        if let Err(e) = analyze_file(&pipeline, path, args.pretty, &mut out) {
            eprintln!("error: {}: {e:#}", path.display());
            failed += 1;
        }
    }

    if failed > 0 {
        debug!("{failed} of {} files failed", args.files.len());
        ExitCode::Error
    } else {
        ExitCode::Success
    }
}

fn analyze_file(
    pipeline: &FramePipeline,
    path: &Path,
    pretty: bool,
    out: &mut impl Write,
) -> Result<()> {
    let bytes = std::fs::read(path).context("Failed to read file")?;
    let verdict = pipeline.process_frame(&bytes)?;

    let json = if pretty {
        serde_json::to_string_pretty(&verdict)?
    } else {
        serde_json::to_string(&verdict)?
    };
    writeln!(out, "{json}").context("Failed to write output")?;
    Ok(())
}

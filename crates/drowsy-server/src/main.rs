//! Drowsy Watch CLI - serve or run single-frame drowsiness detection.

use clap::Parser;
use drowsy_server::config::AppConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, ExitCode};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = AppConfig::load();
    if cli.models_dir.is_some() {
        config.models.dir.clone_from(&cli.models_dir);
    }
    drowsy_adapters::set_models_dir(config.models.dir.clone());

    let exit_code = match cli.command {
        Commands::Serve(ref args) => commands::serve::run(args, &config),
        Commands::Analyze(ref args) => commands::analyze::run(args, &config),
        Commands::Models(ref args) => match commands::models::run(args) {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
    };

    exit_code.into()
}

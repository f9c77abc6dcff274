use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod core;
mod error;
mod render;

use cli::Cli;
use config::Config;
use error::PydocsError;

/// Exit status when the target could not be resolved
const EXIT_RESOLUTION: u8 = 1;
/// Exit status for every other failure
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging on stderr so stdout stays clean for --json
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting pydocs v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            match e.downcast_ref::<PydocsError>() {
                Some(PydocsError::Resolution(_)) => ExitCode::from(EXIT_RESOLUTION),
                _ => ExitCode::from(EXIT_FAILURE),
            }
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.apply(&mut config);

    if !config.display.color {
        colored::control::set_override(false);
    }

    #[cfg(feature = "python")]
    {
        let cwd = std::env::current_dir()?;
        let runtime = core::runtime::PythonRuntime::new()
            .with_search_path(&cwd)
            .map_err(|e| PydocsError::Backend(e.to_string()))?;
        let inspector = core::Inspector::from_config(runtime, &config);
        Ok(cli.execute(&inspector, &config)?)
    }

    #[cfg(not(feature = "python"))]
    {
        Err(PydocsError::Backend(
            "pydocs was built without the `python` feature".to_string(),
        )
        .into())
    }
}

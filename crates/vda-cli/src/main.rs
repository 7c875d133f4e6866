use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vda_cli::commands::{correlate, report, validate};
use vda_cli::{Cli, Commands, Config};

/// Load configuration, optionally from an explicit file.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Report { selection, json }) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(&config, selection, *json)?;
        }
        Some(Commands::Correlate {
            selection,
            force,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            correlate::run(&config, selection, *force, *json)?;
        }
        Some(Commands::Validate { sources, json }) => {
            let config = load_config(cli.config.as_deref())?;
            validate::run(&config, sources, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

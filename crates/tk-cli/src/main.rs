use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tk_cli::commands::{day, projects, util};
use tk_cli::{Cli, Commands, Config};

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
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Day { date, json }) => {
            let target = match date {
                Some(date) => util::parse_day(date)?,
                None => Local::now().date_naive(),
            };
            let config = load_config(cli.config.as_deref())?;
            day::run(&mut io::stdout().lock(), &config, target, *json)?;
        }
        Some(Commands::Projects) => {
            let config = load_config(cli.config.as_deref())?;
            let projects = config.load_projects()?;
            projects::run(&mut io::stdout().lock(), &projects)?;
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

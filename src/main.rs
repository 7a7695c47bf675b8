//! clientgen CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use clientgen::cli::{commands, handle_error, Cli, Commands};
use clientgen::infrastructure::config::SettingsLoader;
use clientgen::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => SettingsLoader::load_from_file(path)?,
        None => SettingsLoader::load()?,
    };
    cli.apply_overrides(&mut settings);
    SettingsLoader::validate(&settings).context("Invalid command-line overrides")?;

    let _logger = LoggerImpl::init(&settings.logging)?;
    let config = settings.connection_config();

    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, config, cli.json).await,
        Commands::Probe(args) => commands::probe::execute(args, config, cli.json).await,
    }
}

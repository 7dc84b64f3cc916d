mod cli;
mod config;
mod lookup;
mod utils;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let verbose = config::Config::load()
        .map(|c| c.general.verbose)
        .unwrap_or(false);
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup(args) => lookup::run_lookup(args)?,
        Commands::Stats(args) => lookup::run_stats(args)?,
        Commands::Recent(args) => lookup::run_recent(args)?,
        Commands::Words(args) => lookup::run_words(args)?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}

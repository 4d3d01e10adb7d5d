//! conan-makevars CLI - generate `src/Makevars` from Conan dependencies

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Overrides the log filter, e.g. `CONAN_MAKEVARS_LOG=conan_makevars=trace`.
const LOG_ENV: &str = "CONAN_MAKEVARS_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let default_filter = if cli.verbose {
        "conan_makevars=debug"
    } else {
        "conan_makevars=info"
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        None => commands::generate::execute(cli.generate),
        Some(Commands::Toolchain(args)) => commands::toolchain::execute(args),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
    }
}

//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Resolve the host C/C++ toolchain, build dependencies with Conan and
/// write an R package's `src/Makevars`
#[derive(Parser)]
#[command(name = "conan-makevars")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub generate: GenerateArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the toolchain that would be used
    Toolchain(ToolchainArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Regenerate Makevars even if a valid one exists
    #[arg(long)]
    pub force: bool,

    /// Package directory
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Use conan and cmake from PATH instead of an ephemeral venv
    #[arg(long)]
    pub no_venv: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    /// Package directory (for its configuration file)
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

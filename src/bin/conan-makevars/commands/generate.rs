//! Default command: generate `Makevars`.

use anyhow::Result;

use conan_makevars::ops::{generate, GenerateOptions, GenerateOutcome};

use crate::cli::GenerateArgs;

pub fn execute(args: GenerateArgs) -> Result<()> {
    let opts = GenerateOptions {
        workdir: args.workdir,
        force: args.force,
        no_venv: args.no_venv,
    };

    let outcome = generate(&opts)?;
    if let GenerateOutcome::UpToDate(ref path) = outcome {
        tracing::info!("use --force to regenerate {}", path.display());
    }
    println!("{}", outcome.path().display());

    Ok(())
}

//! Conan 2 integration.
//!
//! Only a handful of subcommands are used:
//!
//! ```text
//! conan profile detect --name <profile> --force
//! conan inspect <recipe> --format=json
//! conan create <recipe> <args...>
//! conan install <args...>
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::{PackageManager, RecipeInfo};
use crate::core::error::PipelineError;
use crate::util::context::Environment;
use crate::util::process::{find_executable, CommandRunner, ProcessBuilder};

const PROGRAM: &str = "conan";

/// Subset of `conan inspect --format=json` output.
#[derive(Debug, Deserialize)]
struct InspectOutput {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<serde_json::Value>,
}

/// Extract name and version from `conan inspect --format=json` output.
pub fn parse_inspect_output(json: &str, recipe: &Path) -> Result<RecipeInfo> {
    let output: InspectOutput = serde_json::from_str(json)
        .with_context(|| format!("invalid `conan inspect` output for {}", recipe.display()))?;

    let name = output
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("unable to extract the package name from {}", recipe.display()))?;

    let version = match output.version {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => {
            return Err(anyhow!(
                "unable to extract the version of {} from {}",
                name,
                recipe.display()
            ))
        }
    };

    Ok(RecipeInfo { name, version })
}

/// The `conan` executable.
pub struct Conan<'a> {
    runner: &'a dyn CommandRunner,
    program: PathBuf,
}

impl<'a> Conan<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: impl Into<PathBuf>) -> Self {
        Conan {
            runner,
            program: program.into(),
        }
    }

    /// Find `conan` on the search path of `env` and log its version.
    pub fn locate(runner: &'a dyn CommandRunner, env: &Environment) -> Result<Self> {
        let program = find_executable(PROGRAM, env).ok_or_else(|| {
            PipelineError::PackageManagerNotFound {
                program: PROGRAM.to_string(),
            }
        })?;

        let conan = Conan::new(runner, program);
        let version = conan.run("--version", &["--version".to_string()], env)?;
        tracing::info!("found {} at {}", version.trim(), conan.program.display());

        Ok(conan)
    }

    fn run(&self, phase: &'static str, args: &[String], env: &Environment) -> Result<String> {
        let cmd = ProcessBuilder::new(&self.program)
            .args(args)
            .environment(env);
        tracing::info!("running `{}`", cmd.display_command());

        let output = self.runner.run(&cmd)?;
        if !output.is_success() {
            return Err(PipelineError::PackageManagerFailed {
                phase,
                diagnostics: output.diagnostics(),
            }
            .into());
        }

        let stderr = output.stderr_lossy();
        if !stderr.trim().is_empty() {
            tracing::debug!("{}", stderr.trim_end());
        }
        Ok(output.stdout_lossy())
    }
}

impl PackageManager for Conan<'_> {
    fn detect_profile(&self, name: &str, env: &Environment) -> Result<()> {
        let args = ["profile", "detect", "--name", name, "--force"].map(String::from);
        self.run("profile detect", &args, env)?;
        Ok(())
    }

    fn inspect(&self, recipe: &Path, env: &Environment) -> Result<RecipeInfo> {
        let args = vec![
            "inspect".to_string(),
            recipe.display().to_string(),
            "--format=json".to_string(),
        ];
        let stdout = self.run("inspect", &args, env)?;
        parse_inspect_output(&stdout, recipe)
    }

    fn create(&self, recipe: &Path, args: &[String], env: &Environment) -> Result<()> {
        let mut full = vec!["create".to_string(), recipe.display().to_string()];
        full.extend_from_slice(args);
        self.run("create", &full, env)?;
        Ok(())
    }

    fn install(&self, args: &[String], env: &Environment) -> Result<()> {
        let mut full = vec!["install".to_string()];
        full.extend_from_slice(args);
        self.run("install", &full, env)?;
        Ok(())
    }
}

//! Ephemeral Python virtual environment holding `conan` and `cmake`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::platform::Platform;
use crate::util::context::Environment;
use crate::util::process::{find_executable, CommandRunner, ProcessBuilder};

/// Packages installed into the environment.
pub const VENV_REQUIREMENTS: &[&str] = &["conan>=2", "cmake>=3.25"];

/// Directory holding the environment's executables.
pub fn venv_bin_dir(venv: &Path, platform: Platform) -> PathBuf {
    match platform {
        Platform::Windows => venv.join("Scripts"),
        _ => venv.join("bin"),
    }
}

fn find_python(env: &Environment) -> PathBuf {
    ["python3", "python"]
        .iter()
        .find_map(|name| find_executable(name, env))
        .unwrap_or_else(|| PathBuf::from("python"))
}

/// Create `<scratch>/venv`, install the requirements into it and put its
/// bin directory first on the search path of `env`.
pub fn bootstrap_venv(
    runner: &dyn CommandRunner,
    scratch: &Path,
    platform: Platform,
    env: &mut Environment,
) -> Result<PathBuf> {
    let venv = scratch.join("venv");
    tracing::info!("creating venv under {}", venv.display());

    let create = ProcessBuilder::new(find_python(env))
        .args(["-m", "venv", "--upgrade-deps"])
        .arg(&venv)
        .environment(env);
    runner
        .run_checked(&create)
        .context("failed to create Python virtual environment")?;

    let bin = venv_bin_dir(&venv, platform);
    env.prepend_path(&bin.display().to_string(), platform.path_separator());
    env.set("VIRTUAL_ENV", venv.display().to_string());

    let pip = find_executable("pip", env).unwrap_or_else(|| bin.join("pip"));
    let install = ProcessBuilder::new(pip)
        .arg("install")
        .args(VENV_REQUIREMENTS)
        .environment(env);
    runner
        .run_checked(&install)
        .context("failed to install conan into the virtual environment")?;

    Ok(venv)
}

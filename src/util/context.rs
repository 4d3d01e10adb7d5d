//! Per-run context: the environment handed to child processes, the Conan
//! home directory, and the scratch directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Overrides the C compiler candidate list's first entry.
pub const CC_VAR: &str = "CC";
/// Overrides the C++ compiler candidate list's first entry.
pub const CXX_VAR: &str = "CXX";
/// Conan home used only by this tool, checked before `CONAN_HOME`.
pub const TOOL_CONAN_HOME_VAR: &str = "CONAN_MAKEVARS_CONAN_HOME";
pub const CONAN_HOME_VAR: &str = "CONAN_HOME";
/// Parent directory for the per-run scratch directory.
pub const SCRATCH_DIR_VAR: &str = "CONAN_MAKEVARS_TMPDIR";
pub const PATH_VAR: &str = "PATH";

/// An owned snapshot of environment variables.
///
/// The pipeline never mutates the process environment. Every stage that
/// needs to change a variable clones the snapshot and passes it to its
/// child processes explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        let mut env = Environment::default();
        for (key, value) in std::env::vars_os() {
            let key = key.to_string_lossy().into_owned();
            let value = value.to_string_lossy().into_owned();
            // Windows spells it `Path`; children see a single canonical key.
            if cfg!(windows) && key.eq_ignore_ascii_case(PATH_VAR) {
                env.vars.insert(PATH_VAR.to_string(), value);
            } else {
                env.vars.insert(key, value);
            }
        }
        env
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Environment {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get), but treats an empty value as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The search path, empty if unset.
    pub fn path(&self) -> &str {
        self.get(PATH_VAR).unwrap_or("")
    }

    /// Put `entries` in front of the current search path.
    pub fn prepend_path(&mut self, entries: &str, separator: char) {
        let current = self.path();
        let joined = if current.is_empty() {
            entries.to_string()
        } else if entries.is_empty() {
            current.to_string()
        } else {
            format!("{}{}{}", entries, separator, current)
        };
        self.set(PATH_VAR, joined);
    }
}

/// Resolve the Conan home directory.
///
/// Priority: `CONAN_MAKEVARS_CONAN_HOME`, then `CONAN_HOME`, then `~/.conan2`.
pub fn conan_home(env: &Environment) -> PathBuf {
    let home = env
        .get_non_empty(TOOL_CONAN_HOME_VAR)
        .or_else(|| env.get_non_empty(CONAN_HOME_VAR))
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            directories::BaseDirs::new()
                .map(|b| b.home_dir().join(".conan2"))
                .unwrap_or_else(|| PathBuf::from(".conan2"))
        });

    std::path::absolute(&home).unwrap_or(home)
}

/// Resolve the Conan home and make sure it exists.
pub fn init_conan_home(env: &Environment) -> Result<PathBuf> {
    let home = conan_home(env);
    std::fs::create_dir_all(&home)
        .with_context(|| format!("failed to create Conan home: {}", home.display()))?;
    Ok(home)
}

/// Create the scratch directory for one run.
///
/// It lives under `CONAN_MAKEVARS_TMPDIR` when set, the system temp dir
/// otherwise, and is removed when the returned guard is dropped.
pub fn scratch_dir(env: &Environment) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("conan-makevars-");

    match env.get_non_empty(SCRATCH_DIR_VAR) {
        Some(parent) => {
            let parent = Path::new(parent);
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create scratch parent: {}", parent.display())
            })?;
            builder
                .tempdir_in(parent)
                .with_context(|| format!("failed to create scratch dir in {}", parent.display()))
        }
        None => builder.tempdir().context("failed to create scratch dir"),
    }
}

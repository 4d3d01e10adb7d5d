//! Rtools, the compiler distribution shipped alongside R on Windows.
//!
//! An installation lives in `<root>\rtools{major}{minor}` and provides
//! `usr\bin` (make, sh, coreutils) and `mingw64\bin` (gcc, g++ and the
//! bundled libraries).

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::error::PipelineError;

/// A located bundled toolchain installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledToolchain {
    home: PathBuf,
}

impl BundledToolchain {
    /// Find the installation matching an interpreter `major.minor` version.
    ///
    /// The exact `rtools{major}{minor}` directory wins. Otherwise the
    /// lexicographically greatest `rtools{major}*` directory is used.
    pub fn locate(root: &Path, major: &str, minor: &str) -> Result<Self> {
        let exact = root.join(format!("rtools{}{}", major, minor));
        if exact.is_dir() {
            tracing::info!("found Rtools at {}", exact.display());
            return Ok(BundledToolchain { home: exact });
        }

        tracing::warn!(
            "unable to find Rtools at {} (major={}, minor={})",
            exact.display(),
            major,
            minor
        );

        let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
        let pattern = Path::new(&escaped_root).join(format!("rtools{}*", major));

        let best = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| anyhow::anyhow!("invalid toolchain search pattern: {}", e))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_dir())
            .max();

        match best {
            Some(home) => {
                tracing::info!("found Rtools at {}", home.display());
                Ok(BundledToolchain { home })
            }
            None => Err(PipelineError::ToolchainHomeNotFound {
                searched: vec![exact, pattern],
            }
            .into()),
        }
    }

    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        BundledToolchain { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Directories to put in front of the search path, in order.
    pub fn bin_dirs(&self) -> [PathBuf; 2] {
        [
            self.home.join("usr").join("bin"),
            self.home.join("mingw64").join("bin"),
        ]
    }

    /// `base` with the toolchain's bin directories prepended.
    ///
    /// Directories missing on disk are left out.
    pub fn extend_search_path(&self, base: &str, separator: char) -> String {
        let mut entries: Vec<String> = Vec::new();

        for dir in self.bin_dirs() {
            if dir.is_dir() {
                entries.push(dir.display().to_string());
            } else {
                tracing::warn!("{} does not exist, continuing anyway", dir.display());
            }
        }

        entries.extend(
            base.split(separator)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        );

        entries.join(&separator.to_string())
    }
}

//! Dependency manifest fragment produced by Conan's `MakeDeps` generator.
//!
//! The fragment is a Makefile snippet defining `CONAN_INCLUDE_DIRS`,
//! `CONAN_LIB_DIRS`, `CONAN_LIBS`, `CONAN_SYSTEM_LIBS`, `CONAN_DEFINES`
//! and their per-package variants. Its content is never interpreted, only
//! embedded verbatim in the generated Makevars.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::error::PipelineError;
use crate::util::fs::normalize_newlines;

/// Opaque `conandeps.mk` content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManifest {
    path: PathBuf,
    text: String,
}

impl DependencyManifest {
    /// File name written by the `MakeDeps` generator.
    pub const FILE_NAME: &'static str = "conandeps.mk";

    /// Where the generator writes the fragment inside `output_dir`.
    pub fn expected_path(output_dir: &Path) -> PathBuf {
        output_dir.join(Self::FILE_NAME)
    }

    /// Read the fragment from `output_dir`.
    ///
    /// A missing file is the usual symptom of a package manager run that
    /// exited cleanly without doing its job, so it is reported as
    /// [`PipelineError::DependencyInstallFailed`].
    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = Self::expected_path(output_dir);
        if !path.is_file() {
            return Err(PipelineError::DependencyInstallFailed { expected: path }.into());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Ok(DependencyManifest { path, text })
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        DependencyManifest {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The fragment with `\n` line endings and no trailing blank lines.
    pub fn normalized(&self) -> String {
        normalize_newlines(&self.text).trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_manifest_is_install_failure() {
        let tmp = TempDir::new().unwrap();
        let err = DependencyManifest::load(tmp.path()).unwrap_err();

        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::DependencyInstallFailed { expected }) => {
                assert_eq!(expected, &tmp.path().join("conandeps.mk"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_load_and_normalize() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("conandeps.mk"),
            "CONAN_LIBS = $(CONAN_LIBS_FMT)\r\nCONAN_DEFINES =\r\n\r\n",
        )
        .unwrap();

        let manifest = DependencyManifest::load(tmp.path()).unwrap();
        assert_eq!(
            manifest.normalized(),
            "CONAN_LIBS = $(CONAN_LIBS_FMT)\nCONAN_DEFINES ="
        );
    }
}

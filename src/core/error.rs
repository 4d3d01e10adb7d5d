//! Stage failures.
//!
//! Library functions return `anyhow::Result`; the failures a caller may want
//! to tell apart are raised as [`PipelineError`] and can be recovered with
//! `err.downcast_ref::<PipelineError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no {kind} found (searched: {})", .candidates.join(", "))]
    ToolchainNotFound {
        kind: &'static str,
        candidates: Vec<String>,
    },

    #[error("bundled toolchain not found (searched: {})", display_paths(.searched))]
    ToolchainHomeNotFound { searched: Vec<PathBuf> },

    #[error("unable to infer {what} version from output {output:?}")]
    VersionDetectionFailed { what: String, output: String },

    #[error("probe failed to compile with {}: {diagnostics}", .compiler.display())]
    ProbeCompilationFailed {
        compiler: PathBuf,
        diagnostics: String,
    },

    #[error("probe binary {} failed: {diagnostics}", .program.display())]
    ProbeExecutionFailed {
        program: PathBuf,
        diagnostics: String,
    },

    #[error(
        "{} cannot compile a simple program using std::filesystem (tried link flags: {})",
        .compiler.display(),
        .tried.join(", ")
    )]
    FilesystemLinkFlagNotFound { compiler: PathBuf, tried: Vec<String> },

    #[error("unable to find `{program}` in PATH; install conan: https://conan.io/downloads")]
    PackageManagerNotFound { program: String },

    #[error("`conan {phase}` failed: {diagnostics}")]
    PackageManagerFailed {
        phase: &'static str,
        diagnostics: String,
    },

    #[error("failed to create {} file", .expected.display())]
    DependencyInstallFailed { expected: PathBuf },

    #[error("failed to write {}", .path.display())]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the [`PipelineError`] in an error chain, if any.
pub fn pipeline_error(err: &anyhow::Error) -> Option<&PipelineError> {
    err.chain().find_map(|e| e.downcast_ref::<PipelineError>())
}

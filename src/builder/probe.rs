//! Capability probes: compile a tiny C++ program, run it, read its output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;

use crate::builder::toolchain::version::parse_version_triplet;
use crate::core::error::PipelineError;
use crate::util::context::Environment;
use crate::util::fs::remove_file_if_exists;
use crate::util::hash::short_digest;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Flags every probe is compiled with.
pub const PROBE_FLAGS: &[&str] = &["-std=c++17", "-O0"];

/// Link flags tried, in order, when `std::filesystem` does not link on its own.
pub const FILESYSTEM_LINK_FLAGS: &[&str] = &["-lc++fs", "-lstdc++fs"];

const FILESYSTEM_SOURCE: &str = r#"#include <filesystem>

int main() {
  return std::filesystem::path{}.empty() == false;
}
"#;

/// A library whose version is exposed through three integer macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionHeader {
    pub library: &'static str,
    pub header: &'static str,
    pub major: &'static str,
    pub minor: &'static str,
    pub patch: &'static str,
}

pub const HDF5: VersionHeader = VersionHeader {
    library: "hdf5",
    header: "H5public.h",
    major: "H5_VERS_MAJOR",
    minor: "H5_VERS_MINOR",
    patch: "H5_VERS_RELEASE",
};

pub const ZLIB: VersionHeader = VersionHeader {
    library: "zlib",
    header: "zlib.h",
    major: "ZLIB_VER_MAJOR",
    minor: "ZLIB_VER_MINOR",
    patch: "ZLIB_VER_REVISION",
};

/// Version header for a library name, if one is known.
pub fn known_version_header(library: &str) -> Option<VersionHeader> {
    [HDF5, ZLIB].into_iter().find(|h| h.library == library)
}

impl VersionHeader {
    /// Program printing `MAJOR.MINOR.PATCH`.
    pub fn source(&self) -> String {
        format!(
            r#"#include <{header}>
#include <cstdio>
#include <cstdlib>

int main() {{
  printf("%d.%d.%d\n", int{{{major}}}, int{{{minor}}}, int{{{patch}}});
  return EXIT_SUCCESS;
}}
"#,
            header = self.header,
            major = self.major,
            minor = self.minor,
            patch = self.patch,
        )
    }
}

/// Removes the listed files when dropped.
struct ScratchFiles(Vec<PathBuf>);

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            if let Err(e) = remove_file_if_exists(path) {
                tracing::warn!("{:#}", e);
            }
        }
    }
}

enum Outcome {
    CompileFailed(String),
    RunFailed(PathBuf, String),
    Ran(String),
}

/// Compiles and runs probe programs with one C++ compiler.
pub struct CapabilityProbe<'a> {
    runner: &'a dyn CommandRunner,
    cxx: PathBuf,
    scratch: PathBuf,
    env: Environment,
}

impl<'a> CapabilityProbe<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        cxx: &Path,
        scratch: &Path,
        env: &Environment,
    ) -> Self {
        CapabilityProbe {
            runner,
            cxx: cxx.to_path_buf(),
            scratch: scratch.to_path_buf(),
            env: env.clone(),
        }
    }

    fn try_probe(&self, source: &str, extra_flags: &[&str], env: &Environment) -> Result<Outcome> {
        let stem = format!("probe-{}", short_digest(source));
        let src = self.scratch.join(format!("{}.cpp", stem));
        let bin = self.scratch.join(format!("{}.bin", stem));
        let _cleanup = ScratchFiles(vec![src.clone(), bin.clone()]);

        std::fs::write(&src, source)
            .with_context(|| format!("failed to write probe source {}", src.display()))?;

        let compile = ProcessBuilder::new(&self.cxx)
            .arg(&src)
            .arg("-o")
            .arg(&bin)
            .args(PROBE_FLAGS)
            .args(extra_flags)
            .environment(env);

        let output = match self.runner.run(&compile) {
            Ok(output) => output,
            Err(e) => return Ok(Outcome::CompileFailed(format!("{:#}", e))),
        };
        if !output.is_success() {
            return Ok(Outcome::CompileFailed(output.diagnostics()));
        }

        let output = self.runner.run(&ProcessBuilder::new(&bin).environment(env))?;
        if !output.is_success() {
            return Ok(Outcome::RunFailed(bin, output.diagnostics()));
        }

        Ok(Outcome::Ran(output.stdout_lossy()))
    }

    /// Compile `source`, run it and return what it printed.
    pub fn compile_and_run(&self, source: &str) -> Result<String> {
        match self.try_probe(source, &[], &self.env)? {
            Outcome::Ran(stdout) => Ok(stdout),
            Outcome::CompileFailed(diagnostics) => Err(PipelineError::ProbeCompilationFailed {
                compiler: self.cxx.clone(),
                diagnostics,
            }
            .into()),
            Outcome::RunFailed(program, diagnostics) => {
                Err(PipelineError::ProbeExecutionFailed {
                    program,
                    diagnostics,
                }
                .into())
            }
        }
    }

    /// Version of a library as seen by the compiler.
    pub fn library_version(&self, header: &VersionHeader) -> Result<Version> {
        let output = self
            .compile_and_run(&header.source())
            .with_context(|| format!("failed to detect {} version", header.library))?;
        let version = parse_version_triplet(header.library, &output)?;
        tracing::info!("detected {} {}", header.library, version);
        Ok(version)
    }

    /// Extra link flag `std::filesystem` needs, `None` if it links as is.
    pub fn filesystem_link_flag(&self) -> Result<Option<String>> {
        let env = self.env.clone().with("CCACHE_DISABLE", "1");

        if self.links_filesystem(&[], &env)? {
            tracing::debug!("std::filesystem needs no extra link flag");
            return Ok(None);
        }

        for &flag in FILESYSTEM_LINK_FLAGS {
            if self.links_filesystem(&[flag], &env)? {
                tracing::info!("std::filesystem requires {}", flag);
                return Ok(Some(flag.to_string()));
            }
        }

        Err(PipelineError::FilesystemLinkFlagNotFound {
            compiler: self.cxx.clone(),
            tried: FILESYSTEM_LINK_FLAGS.iter().map(|s| s.to_string()).collect(),
        }
        .into())
    }

    fn links_filesystem(&self, flags: &[&str], env: &Environment) -> Result<bool> {
        match self.try_probe(FILESYSTEM_SOURCE, flags, env)? {
            Outcome::Ran(_) => Ok(true),
            Outcome::CompileFailed(diagnostics) | Outcome::RunFailed(_, diagnostics) => {
                tracing::debug!("filesystem probe with {:?} failed: {}", flags, diagnostics);
                Ok(false)
            }
        }
    }
}

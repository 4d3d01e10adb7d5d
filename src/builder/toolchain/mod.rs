//! Host toolchain discovery.
//!
//! Compilers are found by walking a [`CandidateList`] through a
//! [`ToolchainProvider`]. Which provider is used depends on the platform:
//!
//! 1. Linux and macOS: [`NativeProvider`], a `which` over the pipeline's `PATH`
//! 2. Windows: [`RscriptProvider`], which asks R and searches the bundled
//!    Rtools toolchain first

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::context::Environment;
use crate::util::process::{CommandRunner, ProcessBuilder};

pub mod bundled;
mod locate;
mod native;
pub mod rscript;
pub mod version;

pub use bundled::BundledToolchain;
pub use locate::{CandidateList, ToolchainLocator};
pub use native::NativeProvider;
pub use rscript::RscriptProvider;

/// The resolved compilers for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    /// C compiler
    pub cc: PathBuf,
    /// C++ compiler
    pub cxx: PathBuf,
    /// Leading component of `cc -dumpversion`
    pub cc_major_version: u32,
}

/// Platform-specific answers about the host toolchain.
pub trait ToolchainProvider {
    /// Resolve `program` to a path, `None` if it cannot be found.
    fn which(&self, program: &str) -> Result<Option<PathBuf>>;

    /// Raw `-dumpversion` output of a compiler.
    fn compiler_version(&self, cc: &Path) -> Result<String>;

    /// The search path child processes should use.
    fn search_path(&self) -> Result<String>;

    /// Extra compile flags for the `Rcpp` headers.
    fn cxx_flags(&self) -> Result<String>;
}

/// Run `<cc> -dumpversion` in `env`.
pub fn dump_version(runner: &dyn CommandRunner, env: &Environment, cc: &Path) -> Result<String> {
    let cmd = ProcessBuilder::new(cc).arg("-dumpversion").environment(env);
    Ok(runner.run_checked(&cmd)?.stdout_lossy())
}

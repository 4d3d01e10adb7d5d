//! Toolchain lookup on hosts whose compilers come from the system.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::rscript::{run_rscript, CXX_FLAGS_EXPR};
use super::{dump_version, ToolchainProvider};
use crate::util::context::Environment;
use crate::util::process::{find_executable, CommandRunner};

/// Resolves programs against the pipeline's own `PATH`.
pub struct NativeProvider<'a> {
    runner: &'a dyn CommandRunner,
    env: Environment,
}

impl<'a> NativeProvider<'a> {
    pub fn new(runner: &'a dyn CommandRunner, env: &Environment) -> Self {
        NativeProvider {
            runner,
            env: env.clone(),
        }
    }
}

impl ToolchainProvider for NativeProvider<'_> {
    fn which(&self, program: &str) -> Result<Option<PathBuf>> {
        Ok(find_executable(program, &self.env))
    }

    fn compiler_version(&self, cc: &Path) -> Result<String> {
        dump_version(self.runner, &self.env, cc)
    }

    fn search_path(&self) -> Result<String> {
        Ok(self.env.path().to_string())
    }

    fn cxx_flags(&self) -> Result<String> {
        Ok(run_rscript(self.runner, &self.env, CXX_FLAGS_EXPR)?
            .trim()
            .to_string())
    }
}

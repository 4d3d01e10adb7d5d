//! Toolchain lookup through the R interpreter.
//!
//! On Windows the compiler that R packages must be built with is the one
//! from the bundled toolchain matching the installed R version, and the
//! authoritative `PATH` is the one R itself sees. Every question is
//! therefore answered by asking `Rscript`.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;

use super::bundled::BundledToolchain;
use super::{dump_version, ToolchainProvider};
use crate::core::platform::Platform;
use crate::util::context::{Environment, PATH_VAR};
use crate::util::process::{CommandRunner, ProcessBuilder};

pub const RSCRIPT: &str = "Rscript";

/// Expression printing the compile flags of the `Rcpp` headers.
pub const CXX_FLAGS_EXPR: &str = "suppressWarnings(Rcpp:::CxxFlags())";

/// Run `Rscript -e <expr>` and return its stdout with warning lines removed.
pub fn run_rscript(runner: &dyn CommandRunner, env: &Environment, expr: &str) -> Result<String> {
    let cmd = ProcessBuilder::new(RSCRIPT)
        .arg("-e")
        .arg(expr)
        .environment(env);

    let output = runner
        .run_checked(&cmd)
        .with_context(|| format!("failed to evaluate `{}` with Rscript", expr))?;

    strip_warnings(&output.stdout_lossy())
}

/// Drop lines starting with `WARNING` (any case), which R prints to stdout
/// on some setups.
pub fn strip_warnings(text: &str) -> Result<String> {
    let re = Regex::new(r"(?i)^\s*WARNING").context("invalid warning pattern")?;
    Ok(text
        .split_inclusive('\n')
        .filter(|line| !re.is_match(line))
        .collect())
}

/// Quote `value` as an R string literal.
pub fn r_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// [`ToolchainProvider`] backed by `Rscript` and the bundled toolchain.
pub struct RscriptProvider<'a> {
    runner: &'a dyn CommandRunner,
    env: Environment,
    root: PathBuf,
    toolchain: OnceCell<BundledToolchain>,
    search_path: OnceCell<String>,
}

impl<'a> RscriptProvider<'a> {
    /// `root` is the directory holding the `rtoolsXY` installations.
    pub fn new(runner: &'a dyn CommandRunner, env: &Environment, root: impl Into<PathBuf>) -> Self {
        RscriptProvider {
            runner,
            env: env.clone(),
            root: root.into(),
            toolchain: OnceCell::new(),
            search_path: OnceCell::new(),
        }
    }

    fn eval(&self, expr: &str) -> Result<String> {
        run_rscript(self.runner, &self.env, expr)
    }

    /// `(major, minor)` of the running R interpreter, e.g. `("4", "4")`.
    pub fn interpreter_version(&self) -> Result<(String, String)> {
        let major = self.eval("suppressWarnings(cat(getRversion()$major))")?;
        let minor = self.eval("suppressWarnings(cat(getRversion()$minor))")?;

        let (major, minor) = (major.trim().to_string(), minor.trim().to_string());
        if major.is_empty() || minor.is_empty() {
            bail!("Rscript did not report its version");
        }
        Ok((major, minor))
    }

    /// The bundled toolchain matching the interpreter version.
    pub fn toolchain(&self) -> Result<&BundledToolchain> {
        if let Some(toolchain) = self.toolchain.get() {
            return Ok(toolchain);
        }

        let (major, minor) = self.interpreter_version()?;
        let toolchain = BundledToolchain::locate(&self.root, &major, &minor)?;
        Ok(self.toolchain.get_or_init(|| toolchain))
    }

    /// Environment in which lookups and compiler queries run.
    fn lookup_env(&self) -> Result<Environment> {
        Ok(self.env.clone().with(PATH_VAR, self.search_path()?))
    }
}

impl ToolchainProvider for RscriptProvider<'_> {
    fn which(&self, program: &str) -> Result<Option<PathBuf>> {
        let env = self.lookup_env()?;
        let expr = format!("suppressWarnings(cat(Sys.which({})))", r_string(program));
        let found = run_rscript(self.runner, &env, &expr)?;
        let found = found.trim();

        if found.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(found)))
        }
    }

    fn compiler_version(&self, cc: &Path) -> Result<String> {
        dump_version(self.runner, &self.lookup_env()?, cc)
    }

    fn search_path(&self) -> Result<String> {
        if let Some(path) = self.search_path.get() {
            return Ok(path.clone());
        }

        let base = self.eval("suppressWarnings(cat(Sys.getenv('PATH')))")?;
        let base = base.trim();
        if base.is_empty() {
            bail!("failed to read the PATH environment variable from Rscript");
        }

        let extended = self
            .toolchain()?
            .extend_search_path(base, Platform::Windows.path_separator());
        Ok(self.search_path.get_or_init(|| extended).clone())
    }

    fn cxx_flags(&self) -> Result<String> {
        Ok(self.eval(CXX_FLAGS_EXPR)?.trim().to_string())
    }
}

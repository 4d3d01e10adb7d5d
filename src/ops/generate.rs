//! One end-to-end `Makevars` generation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::probe::CapabilityProbe;
use crate::builder::toolchain::{
    NativeProvider, RscriptProvider, ToolchainInfo, ToolchainLocator, ToolchainProvider,
};
use crate::core::platform::Platform;
use crate::ops::install::{ensure_recipe, resolve_dependencies, ResolveOptions};
use crate::ops::makevars::{is_valid_artifact, render_makevars, write_makevars, MakevarsInputs};
use crate::ops::profile::ProfileBuilder;
use crate::ops::venv::bootstrap_venv;
use crate::sources::{Conan, PackageManager};
use crate::util::config::{load_for_workdir, Config};
use crate::util::context::{
    init_conan_home, scratch_dir, Environment, CC_VAR, CONAN_HOME_VAR, CXX_VAR,
};
use crate::util::fs::remove_file_if_exists;
use crate::util::process::{CommandRunner, SystemRunner};

/// Options for [`generate`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Package root containing the recipe and `src/`
    pub workdir: PathBuf,
    /// Regenerate even if a valid `Makevars` exists
    pub force: bool,
    /// Use the tools already on `PATH` instead of a fresh virtual environment
    pub no_venv: bool,
}

/// What a generation run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A new file was written.
    Generated(PathBuf),
    /// An existing valid file was kept.
    UpToDate(PathBuf),
}

impl GenerateOutcome {
    pub fn path(&self) -> &Path {
        match self {
            GenerateOutcome::Generated(p) | GenerateOutcome::UpToDate(p) => p,
        }
    }
}

/// Decide what to do with an existing artifact at `dest`.
///
/// Returns `Some(UpToDate)` when a valid file may be kept. A forced run or
/// an incomplete leftover deletes the file and returns `None`.
pub fn check_existing(dest: &Path, force: bool) -> Result<Option<GenerateOutcome>> {
    if !dest.exists() {
        return Ok(None);
    }

    if !force && is_valid_artifact(dest) {
        tracing::info!("{} is up to date, nothing to do", dest.display());
        return Ok(Some(GenerateOutcome::UpToDate(dest.to_path_buf())));
    }

    if force {
        tracing::info!("removing {}", dest.display());
    } else {
        tracing::warn!("{} is incomplete, regenerating", dest.display());
    }
    remove_file_if_exists(dest)?;
    Ok(None)
}

/// The provider matching `platform`.
pub fn host_provider<'a>(
    platform: Platform,
    runner: &'a dyn CommandRunner,
    env: &Environment,
    config: &Config,
) -> Box<dyn ToolchainProvider + 'a> {
    if platform.uses_bundled_toolchain() {
        Box::new(RscriptProvider::new(runner, env, config.toolchain_root()))
    } else {
        Box::new(NativeProvider::new(runner, env))
    }
}

/// Wiring for one run of the stages.
pub struct Pipeline<'a> {
    pub platform: Platform,
    pub config: &'a Config,
    pub runner: &'a dyn CommandRunner,
    pub provider: &'a dyn ToolchainProvider,
    pub package_manager: &'a dyn PackageManager,
    pub workdir: &'a Path,
    pub scratch: &'a Path,
    pub conan_home: &'a Path,
}

impl Pipeline<'_> {
    /// Locate the toolchain, build the profile, resolve dependencies and
    /// write the `Makevars`. Returns its path.
    pub fn run(&self, mut env: Environment) -> Result<PathBuf> {
        let toolchain = self.locate(&mut env)?;

        let profiles = ProfileBuilder::new(
            self.platform,
            self.config,
            self.runner,
            self.package_manager,
            self.conan_home,
            self.scratch,
        );
        let profile = profiles.build(&toolchain, &env)?;
        profiles.write(&profile)?;

        let opts = ResolveOptions {
            platform: self.platform,
            profile: self.config.profile_name().to_string(),
            recipe: self.config.recipe_path(self.workdir),
            output_dir: self.scratch.to_path_buf(),
            build_type: self.config.build_type().to_string(),
            cppstd: self.config.cppstd().to_string(),
        };
        let manifest = resolve_dependencies(self.package_manager, &opts, &toolchain, &env)?;

        let probe = CapabilityProbe::new(self.runner, &toolchain.cxx, self.scratch, &env);
        let filesystem_flag = probe.filesystem_link_flag()?;
        let cxx_flags = self.provider.cxx_flags()?;

        let link_libs = self.config.bundled_link_libs();
        let include_vars = self.config.unix_include_vars();
        let text = render_makevars(&MakevarsInputs {
            platform: self.platform,
            toolchain: &toolchain,
            manifest: &manifest,
            cxx_flags: &cxx_flags,
            filesystem_flag: filesystem_flag.as_deref(),
            bundled_link_libs: &link_libs,
            include_vars: &include_vars,
        });
        tracing::debug!("\n{}", text);

        let dest = self.config.output_path(self.workdir);
        write_makevars(&dest, &text)?;
        Ok(dest)
    }

    /// Resolve compilers and pin them (and, with the bundled toolchain, its
    /// search path) in `env`.
    fn locate(&self, env: &mut Environment) -> Result<ToolchainInfo> {
        let mut locator = ToolchainLocator::new(self.provider);
        let toolchain = locator.resolve(env)?;

        env.set(CC_VAR, toolchain.cc.display().to_string());
        env.set(CXX_VAR, toolchain.cxx.display().to_string());

        if self.platform.uses_bundled_toolchain() {
            env.prepend_path(&self.provider.search_path()?, self.platform.path_separator());
        }
        Ok(toolchain)
    }
}

/// Generate `Makevars` for the package in `opts.workdir`.
pub fn generate(opts: &GenerateOptions) -> Result<GenerateOutcome> {
    if !opts.workdir.is_dir() {
        bail!("working directory not found: {}", opts.workdir.display());
    }
    let workdir = std::path::absolute(&opts.workdir)
        .with_context(|| format!("failed to resolve {}", opts.workdir.display()))?;

    let config = load_for_workdir(&workdir);
    let dest = config.output_path(&workdir);
    if let Some(outcome) = check_existing(&dest, opts.force)? {
        return Ok(outcome);
    }
    ensure_recipe(&config.recipe_path(&workdir))?;

    let platform = Platform::host();
    let runner = SystemRunner;
    let mut env = Environment::capture();

    let scratch = scratch_dir(&env)?;
    tracing::info!("using {} as scratch directory", scratch.path().display());

    if opts.no_venv {
        tracing::info!("skipping venv creation");
    } else {
        bootstrap_venv(&runner, scratch.path(), platform, &mut env)?;
    }

    let conan_home = init_conan_home(&env)?;
    tracing::info!("CONAN_HOME={}", conan_home.display());
    env.set(CONAN_HOME_VAR, conan_home.display().to_string());
    env.set("TMPDIR", scratch.path().display().to_string());

    let provider = host_provider(platform, &runner, &env, &config);
    let conan = Conan::locate(&runner, &env)?;

    let pipeline = Pipeline {
        platform,
        config: &config,
        runner: &runner,
        provider: provider.as_ref(),
        package_manager: &conan,
        workdir: &workdir,
        scratch: scratch.path(),
        conan_home: &conan_home,
    };
    let path = pipeline.run(env)?;

    Ok(GenerateOutcome::Generated(path))
}

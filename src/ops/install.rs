//! Dependency resolution through the package manager.
//!
//! Two phases run against the same profile:
//!
//! 1. `create`: build the recipe's package and anything missing from the cache
//! 2. `install`: install that exact package into the scratch directory with
//!    the `MakeDeps` generator, which writes `conandeps.mk`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::toolchain::ToolchainInfo;
use crate::core::manifest::DependencyManifest;
use crate::core::platform::Platform;
use crate::sources::{PackageManager, RecipeInfo};
use crate::util::context::{Environment, CC_VAR, CXX_VAR};

/// Lets CMake 4 configure recipes that still declare pre-3.5 policies.
pub const CMAKE_POLICY_VERSION_MINIMUM: &str = "3.5";

/// Inputs of one resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub platform: Platform,
    pub profile: String,
    pub recipe: PathBuf,
    pub output_dir: PathBuf,
    pub build_type: String,
    pub cppstd: String,
}

/// Arguments shared by `create` and `install`.
pub fn common_args(opts: &ResolveOptions) -> Vec<String> {
    let mut args = vec![
        format!("--profile:all={}", opts.profile),
        format!("--settings=build_type={}", opts.build_type),
        format!("--settings=compiler.cppstd={}", opts.cppstd),
        "--conf=tools.cmake.cmaketoolchain:generator=Ninja".to_string(),
    ];

    if opts.platform != Platform::MacOs {
        args.push("--settings=compiler.libcxx=libstdc++11".to_string());
    }
    args
}

pub fn create_args(opts: &ResolveOptions, recipe: &RecipeInfo) -> Vec<String> {
    let mut args = common_args(opts);
    args.push("--build=missing".to_string());
    args.push(format!("--build={}/*", recipe.name));
    args.push("--update".to_string());

    // Rtools' own b2 is declared as a platform tool on Windows
    if !opts.platform.uses_bundled_toolchain() {
        args.push("--build=b2/*".to_string());
    }
    args
}

pub fn install_args(opts: &ResolveOptions, recipe: &RecipeInfo) -> Vec<String> {
    let mut args = common_args(opts);
    args.push(format!("--requires={}", recipe.reference()));
    args.push(format!("--output-folder={}", opts.output_dir.display()));
    args.push("--build=never".to_string());
    args.push("--generator=MakeDeps".to_string());
    args
}

/// Environment the package manager runs in.
pub fn resolver_env(env: &Environment, toolchain: &ToolchainInfo) -> Environment {
    env.clone()
        .with(CC_VAR, toolchain.cc.display().to_string())
        .with(CXX_VAR, toolchain.cxx.display().to_string())
        .with("CMAKE_POLICY_VERSION_MINIMUM", CMAKE_POLICY_VERSION_MINIMUM)
}

/// Run both phases and load the generated manifest.
pub fn resolve_dependencies(
    package_manager: &dyn PackageManager,
    opts: &ResolveOptions,
    toolchain: &ToolchainInfo,
    env: &Environment,
) -> Result<DependencyManifest> {
    let env = resolver_env(env, toolchain);
    let recipe = package_manager.inspect(&opts.recipe, &env)?;
    tracing::info!("resolving dependencies of {}", recipe.reference());

    package_manager
        .create(&opts.recipe, &create_args(opts, &recipe), &env)
        .with_context(|| format!("failed to build {}", recipe.reference()))?;

    package_manager
        .install(&install_args(opts, &recipe), &env)
        .with_context(|| format!("failed to install {}", recipe.reference()))?;

    DependencyManifest::load(&opts.output_dir)
}

/// Check that the recipe exists before anything expensive runs.
pub fn ensure_recipe(recipe: &Path) -> Result<()> {
    if !recipe.is_file() {
        anyhow::bail!("dependency recipe not found: {}", recipe.display());
    }
    Ok(())
}

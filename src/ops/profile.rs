//! Conan profile construction.
//!
//! With the bundled Windows toolchain the profile is assembled from probes:
//! the libraries Rtools ships (HDF5 by default) are pinned to the versions
//! actually installed, so Conan never builds its own copies, and the build
//! tools found on the extended `PATH` are declared as platform tools.
//! Elsewhere Conan's own detection is trusted and only `build_type` and
//! `compiler.cppstd` are forced.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use semver::Version;

use crate::builder::probe::{known_version_header, CapabilityProbe};
use crate::builder::toolchain::version::parse_tool_version;
use crate::builder::toolchain::ToolchainInfo;
use crate::core::platform::{host_arch, Platform};
use crate::core::profile::{Profile, Section};
use crate::sources::PackageManager;
use crate::util::config::Config;
use crate::util::context::Environment;
use crate::util::fs::read_to_string;
use crate::util::process::{find_executable, CommandRunner, ProcessBuilder};

/// Version reported by `<tool> --version`, looked up on the search path of `env`.
pub fn tool_version(runner: &dyn CommandRunner, tool: &str, env: &Environment) -> Result<Version> {
    let program = find_executable(tool, env).unwrap_or_else(|| PathBuf::from(tool));
    let cmd = ProcessBuilder::new(program).arg("--version").environment(env);

    let output = runner
        .run_checked(&cmd)
        .with_context(|| format!("failed to query {} version", tool))?;
    parse_tool_version(tool, &output.stdout_lossy())
}

/// Builds and writes the named Conan profile.
pub struct ProfileBuilder<'a> {
    platform: Platform,
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    package_manager: &'a dyn PackageManager,
    conan_home: PathBuf,
    scratch: PathBuf,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(
        platform: Platform,
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        package_manager: &'a dyn PackageManager,
        conan_home: &Path,
        scratch: &Path,
    ) -> Self {
        ProfileBuilder {
            platform,
            config,
            runner,
            package_manager,
            conan_home: conan_home.to_path_buf(),
            scratch: scratch.to_path_buf(),
        }
    }

    /// `<CONAN_HOME>/profiles/<name>`
    pub fn profile_path(&self) -> PathBuf {
        self.conan_home
            .join("profiles")
            .join(self.config.profile_name())
    }

    /// Build the profile for `toolchain`. `env` must already carry the
    /// pinned `CC`/`CXX` and the final search path.
    pub fn build(&self, toolchain: &ToolchainInfo, env: &Environment) -> Result<Profile> {
        if self.platform.uses_bundled_toolchain() {
            self.build_bundled(toolchain, env)
        } else {
            self.build_detected(env)
        }
    }

    fn build_bundled(&self, toolchain: &ToolchainInfo, env: &Environment) -> Result<Profile> {
        let mut profile = Profile::new();
        profile
            .set(Section::Settings, "arch", host_arch())
            .set(Section::Settings, "build_type", self.config.build_type())
            .set(Section::Settings, "compiler", "gcc")
            .set(Section::Settings, "compiler.cppstd", self.config.cppstd())
            .set(
                Section::Settings,
                "compiler.version",
                toolchain.cc_major_version.to_string(),
            )
            .set(Section::Settings, "os", self.platform.conan_os());

        profile.set(Section::Buildenv, "PATH", format!("'{}'", env.path()));

        let probe = CapabilityProbe::new(self.runner, &toolchain.cxx, &self.scratch, env);
        let mut pinned = Vec::new();
        for library in self.config.bundled_libraries() {
            let header = known_version_header(&library)
                .ok_or_else(|| anyhow!("no version probe is known for bundled library `{}`", library))?;
            let version = probe.library_version(&header)?;
            pinned.push((library, version));
        }

        for (library, version) in &pinned {
            profile.set(Section::PlatformRequires, library, version.to_string());
        }

        for tool in self.config.tool_requires() {
            let version = tool_version(self.runner, &tool, env)?;
            profile.set(Section::PlatformToolRequires, tool, version.to_string());
        }

        for (library, version) in &pinned {
            profile.set(
                Section::ReplaceRequires,
                format!("{}/*", library),
                format!("{}/{}", library, version),
            );
        }

        Ok(profile)
    }

    fn build_detected(&self, env: &Environment) -> Result<Profile> {
        let name = self.config.profile_name();
        self.package_manager.detect_profile(name, env)?;

        let path = self.profile_path();
        let text = read_to_string(&path)?;
        let mut profile = Profile::parse(&text)
            .with_context(|| format!("failed to parse detected profile {}", path.display()))?;

        profile
            .set(Section::Settings, "build_type", self.config.build_type())
            .set(Section::Settings, "compiler.cppstd", self.config.cppstd());

        Ok(profile)
    }

    /// Serialize `profile` to [`profile_path`](Self::profile_path).
    pub fn write(&self, profile: &Profile) -> Result<PathBuf> {
        let path = self.profile_path();
        profile.write_to(&path)?;
        tracing::info!("wrote Conan profile {}", path.display());
        tracing::debug!("\n{}", profile);
        Ok(path)
    }
}

//! Configuration file support.
//!
//! Two optional locations are read:
//! - Global: `~/.conan-makevars/config.toml` - User-wide defaults
//! - Project: `<workdir>/.conan-makevars/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Every key is
//! optional; the accessors on [`Config`] supply the defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE: &str = "conan-makevars";
pub const DEFAULT_RECIPE: &str = "tools/conanfile.py";
pub const DEFAULT_OUTPUT: &str = "src/Makevars";
pub const DEFAULT_CPPSTD: &str = "17";
pub const DEFAULT_BUILD_TYPE: &str = "Release";
pub const DEFAULT_TOOLCHAIN_ROOT: &str = "C:\\";

const DEFAULT_BUNDLED_LIBRARIES: &[&str] = &["hdf5"];
const DEFAULT_TOOL_REQUIRES: &[&str] = &["b2", "cmake"];
// ole32 provides __imp_CoTaskMemFree, which HDF5 needs under mingw
const DEFAULT_LINK_LIBS: &[&str] = &["hdf5", "z", "sz", "ole32"];
const DEFAULT_INCLUDE_VARS: &[&str] = &["CONAN_INCLUDE_DIRS_HDF5_HDF5_C"];

/// Tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline settings
    pub pipeline: PipelineConfig,

    /// Settings only used with the bundled Windows toolchain
    pub windows: WindowsConfig,

    /// Settings only used on Linux and macOS
    pub unix: UnixConfig,
}

/// Where things live and which settings the profile pins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Conan profile name written under `<CONAN_HOME>/profiles/`
    pub profile: Option<String>,

    /// Dependency recipe, relative to the workdir
    pub recipe: Option<PathBuf>,

    /// Generated Makevars, relative to the workdir
    pub output: Option<PathBuf>,

    /// `compiler.cppstd` setting
    pub cppstd: Option<String>,

    /// `build_type` setting
    pub build_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    /// Directory containing the `rtoolsXY` installations
    pub toolchain_root: Option<PathBuf>,

    /// Libraries shipped with the bundled toolchain whose versions are
    /// probed and pinned in the profile
    pub bundled_libraries: Option<Vec<String>>,

    /// Build tools declared as `platform_tool_requires`
    pub tool_requires: Option<Vec<String>>,

    /// Libraries linked directly (`-l<name>`) instead of through Conan
    pub link_libs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnixConfig {
    /// Extra MakeDeps include-dir variables added with `-isystem`
    pub include_vars: Option<Vec<String>>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let p = other.pipeline;
        if p.profile.is_some() {
            self.pipeline.profile = p.profile;
        }
        if p.recipe.is_some() {
            self.pipeline.recipe = p.recipe;
        }
        if p.output.is_some() {
            self.pipeline.output = p.output;
        }
        if p.cppstd.is_some() {
            self.pipeline.cppstd = p.cppstd;
        }
        if p.build_type.is_some() {
            self.pipeline.build_type = p.build_type;
        }

        let w = other.windows;
        if w.toolchain_root.is_some() {
            self.windows.toolchain_root = w.toolchain_root;
        }
        if w.bundled_libraries.is_some() {
            self.windows.bundled_libraries = w.bundled_libraries;
        }
        if w.tool_requires.is_some() {
            self.windows.tool_requires = w.tool_requires;
        }
        if w.link_libs.is_some() {
            self.windows.link_libs = w.link_libs;
        }

        if other.unix.include_vars.is_some() {
            self.unix.include_vars = other.unix.include_vars;
        }
    }

    pub fn profile_name(&self) -> &str {
        self.pipeline.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    pub fn recipe_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(
            self.pipeline
                .recipe
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_RECIPE)),
        )
    }

    pub fn output_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(
            self.pipeline
                .output
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_OUTPUT)),
        )
    }

    pub fn cppstd(&self) -> &str {
        self.pipeline.cppstd.as_deref().unwrap_or(DEFAULT_CPPSTD)
    }

    pub fn build_type(&self) -> &str {
        self.pipeline
            .build_type
            .as_deref()
            .unwrap_or(DEFAULT_BUILD_TYPE)
    }

    pub fn toolchain_root(&self) -> PathBuf {
        self.windows
            .toolchain_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOLCHAIN_ROOT))
    }

    pub fn bundled_libraries(&self) -> Vec<String> {
        self.windows
            .bundled_libraries
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_BUNDLED_LIBRARIES))
    }

    pub fn tool_requires(&self) -> Vec<String> {
        self.windows
            .tool_requires
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_TOOL_REQUIRES))
    }

    pub fn bundled_link_libs(&self) -> Vec<String> {
        self.windows
            .link_libs
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_LINK_LIBS))
    }

    pub fn unix_include_vars(&self) -> Vec<String> {
        self.unix
            .include_vars
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_INCLUDE_VARS))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`<workdir>/.conan-makevars/config.toml`)
/// 2. Global config (`~/.conan-makevars/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global config directory (`~/.conan-makevars`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".conan-makevars"))
}

/// Get the global config path.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path.
pub fn project_config_path(workdir: &Path) -> PathBuf {
    workdir.join(".conan-makevars").join("config.toml")
}

/// Load the merged configuration for a workdir.
pub fn load_for_workdir(workdir: &Path) -> Config {
    let global = global_config_path().unwrap_or_default();
    load_config(&global, &project_config_path(workdir))
}

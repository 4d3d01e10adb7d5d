//! Package manager integration.
//!
//! Dependencies are built and installed by an external package manager.
//! The pipeline talks to it through [`PackageManager`] so tests can
//! substitute a fake.

use std::path::Path;

use anyhow::Result;

use crate::util::context::Environment;

pub mod conan;

pub use conan::Conan;

/// Name and version of a dependency recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeInfo {
    pub name: String,
    pub version: String,
}

impl RecipeInfo {
    /// `name/version` reference.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

/// Operations the pipeline needs from a package manager.
pub trait PackageManager {
    /// Write an auto-detected profile called `name` into the package
    /// manager's home.
    fn detect_profile(&self, name: &str, env: &Environment) -> Result<()>;

    /// Read name and version from a recipe.
    fn inspect(&self, recipe: &Path, env: &Environment) -> Result<RecipeInfo>;

    /// Build the recipe's package and its missing dependencies.
    fn create(&self, recipe: &Path, args: &[String], env: &Environment) -> Result<()>;

    /// Install a package and run its generators.
    fn install(&self, args: &[String], env: &Environment) -> Result<()>;
}

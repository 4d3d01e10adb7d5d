//! conan-makevars - Build R package `Makevars` from Conan dependencies
//!
//! This crate locates a working C/C++ toolchain, describes it to Conan as a
//! profile, has Conan build and install the package's dependencies, and
//! merges the resulting `conandeps.mk` into `src/Makevars`.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test doubles for the runner, toolchain provider and package manager.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use builder::toolchain::ToolchainInfo;
pub use crate::core::{DependencyManifest, PipelineError, Platform, Profile};
pub use ops::{generate, GenerateOptions, GenerateOutcome};
pub use util::Environment;

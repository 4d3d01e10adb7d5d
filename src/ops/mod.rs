//! High-level operations.
//!
//! Each stage of a `Makevars` generation lives in its own module;
//! [`generate`] strings them together.

pub mod generate;
pub mod install;
pub mod makevars;
pub mod profile;
pub mod venv;

pub use generate::{generate, GenerateOptions, GenerateOutcome, Pipeline};
pub use install::{resolve_dependencies, ResolveOptions};
pub use makevars::{render_makevars, write_makevars, MakevarsInputs};
pub use profile::ProfileBuilder;
pub use venv::bootstrap_venv;

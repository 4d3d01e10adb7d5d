//! Core data types shared by the pipeline stages.

pub mod error;
pub mod manifest;
pub mod platform;
pub mod profile;

pub use error::PipelineError;
pub use manifest::DependencyManifest;
pub use platform::Platform;
pub use profile::{Profile, Section};

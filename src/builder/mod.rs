//! Host compiler discovery and capability probing.

pub mod probe;
pub mod toolchain;

pub use probe::CapabilityProbe;
pub use toolchain::{ToolchainInfo, ToolchainLocator, ToolchainProvider};

//! Host platform identity.
//!
//! Each pipeline stage takes a [`Platform`] instead of checking `cfg!`
//! itself, so Windows behaviour can be exercised from any host in tests.

use std::fmt;

/// The platform family the pipeline targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    /// Windows with the compiler supplied by the bundled Rtools toolchain.
    Windows,
}

impl Platform {
    /// Detect the host platform. Unix flavours other than macOS are
    /// treated as Linux.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Whether compilers and some libraries come from the bundled toolchain.
    pub fn uses_bundled_toolchain(self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Value of Conan's `os` setting.
    pub fn conan_os(self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOs => "Macos",
            Platform::Windows => "Windows",
        }
    }

    /// Separator between `PATH` entries.
    pub fn path_separator(self) -> char {
        match self {
            Platform::Windows => ';',
            _ => ':',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an architecture name to Conan's `arch` setting.
pub fn conan_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "amd64" | "x86_64" | "x64" => "x86_64".to_string(),
        "aarch64" | "arm64" => "armv8".to_string(),
        "i386" | "i686" | "x86" => "x86".to_string(),
        other => other.to_string(),
    }
}

/// Conan `arch` of the host.
pub fn host_arch() -> String {
    conan_arch(std::env::consts::ARCH)
}

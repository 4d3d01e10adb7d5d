//! `Makevars` synthesis.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::builder::toolchain::ToolchainInfo;
use crate::core::error::PipelineError;
use crate::core::manifest::DependencyManifest;
use crate::core::platform::Platform;
use crate::util::fs::write_atomic;

pub const BEGIN_MARKER: &str = "### BEGINNING OF conandeps.mk";
/// Present only in a completely written `Makevars`.
pub const END_MARKER: &str = "### END OF conandeps.mk";

/// Everything that ends up in the generated file.
#[derive(Debug, Clone)]
pub struct MakevarsInputs<'a> {
    pub platform: Platform,
    pub toolchain: &'a ToolchainInfo,
    pub manifest: &'a DependencyManifest,
    /// Output of `Rcpp:::CxxFlags()`
    pub cxx_flags: &'a str,
    pub filesystem_flag: Option<&'a str>,
    /// Libraries linked directly with the bundled toolchain
    pub bundled_link_libs: &'a [String],
    /// MakeDeps include-dir variables added on other platforms
    pub include_vars: &'a [String],
}

/// Render the `Makevars` text. Lines always end with `\n`.
pub fn render_makevars(inputs: &MakevarsInputs<'_>) -> String {
    let cc = inputs.toolchain.cc.display();
    let cxx = inputs.toolchain.cxx.display();

    let mut out = String::new();
    let _ = writeln!(out, "export CC := {}", cc);
    let _ = writeln!(out, "export CXX := {}", cxx);
    let _ = writeln!(out, "export CXX17 := {}", cxx);
    out.push('\n');
    out.push_str(BEGIN_MARKER);
    out.push('\n');
    out.push_str(&inputs.manifest.normalized());
    out.push('\n');
    out.push_str(END_MARKER);
    out.push('\n');
    out.push('\n');
    out.push_str("CXX_STD = CXX17\n");
    out.push('\n');
    out.push_str("PKG_CPPFLAGS += $(addprefix -isystem ,$(CONAN_INCLUDE_DIRS))\n");
    out.push_str("PKG_CPPFLAGS += $(addprefix -D,$(CONAN_DEFINES))\n");
    let _ = writeln!(out, "PKG_CPPFLAGS += {}", inputs.cxx_flags.trim());
    out.push('\n');
    out.push_str("PKG_LIBS += $(addprefix -L ,$(CONAN_LIB_DIRS))\n");
    out.push_str("PKG_LIBS += $(addprefix -l,$(CONAN_LIBS))\n");
    out.push_str("PKG_LIBS += $(addprefix -l,$(CONAN_SYSTEM_LIBS))\n");

    if let Some(flag) = inputs.filesystem_flag.filter(|f| !f.trim().is_empty()) {
        let _ = writeln!(out, "PKG_LIBS += {}", flag.trim());
    }

    if inputs.platform.uses_bundled_toolchain() {
        if !inputs.bundled_link_libs.is_empty() {
            let libs: Vec<String> = inputs
                .bundled_link_libs
                .iter()
                .map(|l| format!("-l{}", l))
                .collect();
            let _ = writeln!(out, "PKG_LIBS += {}", libs.join(" "));
        }
    } else {
        for var in inputs.include_vars {
            let _ = writeln!(out, "PKG_CPPFLAGS += $(addprefix -isystem ,$({}))", var);
        }
    }

    match inputs.platform {
        Platform::MacOs => out.push_str("PKG_LIBS += -Wl,-x\n"),
        _ => out.push_str("PKG_LIBS += -Wl,--strip-debug\n"),
    }

    out
}

/// Atomically replace `dest` with `text`.
pub fn write_makevars(dest: &Path, text: &str) -> Result<()> {
    write_atomic(dest, text.as_bytes()).map_err(|source| PipelineError::ConfigWriteFailed {
        path: dest.to_path_buf(),
        source,
    })?;
    tracing::info!("Makevars file has been written to {}", dest.display());
    Ok(())
}

/// Whether `path` holds a completely generated `Makevars`.
pub fn is_valid_artifact(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|text| text.contains(BEGIN_MARKER) && text.contains(END_MARKER))
        .unwrap_or(false)
}

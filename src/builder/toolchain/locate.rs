//! Compiler discovery.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::version::parse_major_version;
use super::{ToolchainInfo, ToolchainProvider};
use crate::core::error::PipelineError;
use crate::util::context::{Environment, CC_VAR, CXX_VAR};

/// Ordered executable names to try for one kind of tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    kind: &'static str,
    names: Vec<String>,
}

impl CandidateList {
    /// Duplicate names are dropped, keeping the first occurrence.
    pub fn new<I, S>(kind: &'static str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !name.is_empty() && !unique.contains(&name) {
                unique.push(name);
            }
        }
        CandidateList {
            kind,
            names: unique,
        }
    }

    /// `$CC` (or `clang`), then `clang`, `gcc`, `cc`.
    pub fn c_compilers(env: &Environment) -> Self {
        let first = env.get_non_empty(CC_VAR).unwrap_or("clang");
        CandidateList::new("C compiler", [first, "clang", "gcc", "cc"])
    }

    /// `$CXX` (or `clang++`), then `clang++`, `g++`, `c++`.
    pub fn cxx_compilers(env: &Environment) -> Self {
        let first = env.get_non_empty(CXX_VAR).unwrap_or("clang++");
        CandidateList::new("C++ compiler", [first, "clang++", "g++", "c++"])
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Finds compilers through a [`ToolchainProvider`], remembering every answer
/// for the lifetime of the locator.
pub struct ToolchainLocator<'a> {
    provider: &'a dyn ToolchainProvider,
    found: HashMap<Vec<String>, PathBuf>,
    major_versions: HashMap<PathBuf, u32>,
}

impl<'a> ToolchainLocator<'a> {
    pub fn new(provider: &'a dyn ToolchainProvider) -> Self {
        ToolchainLocator {
            provider,
            found: HashMap::new(),
            major_versions: HashMap::new(),
        }
    }

    /// First candidate the provider can resolve.
    pub fn find(&mut self, candidates: &CandidateList) -> Result<PathBuf> {
        if let Some(path) = self.found.get(candidates.names()) {
            return Ok(path.clone());
        }

        for name in candidates.names() {
            if let Some(path) = self.provider.which(name)? {
                tracing::debug!("{} `{}` resolved to {}", candidates.kind(), name, path.display());
                self.found.insert(candidates.names().to_vec(), path.clone());
                return Ok(path);
            }
            tracing::debug!("{} `{}` not found", candidates.kind(), name);
        }

        Err(PipelineError::ToolchainNotFound {
            kind: candidates.kind(),
            candidates: candidates.names().to_vec(),
        }
        .into())
    }

    /// Resolve the C and C++ compilers and the C compiler's major version.
    pub fn resolve(&mut self, env: &Environment) -> Result<ToolchainInfo> {
        let cc = self.find(&CandidateList::c_compilers(env))?;
        let cxx = self.find(&CandidateList::cxx_compilers(env))?;

        let cc_major_version = match self.major_versions.get(&cc) {
            Some(v) => *v,
            None => {
                let output = self
                    .provider
                    .compiler_version(&cc)
                    .with_context(|| format!("failed to query version of {}", cc.display()))?;
                let major = parse_major_version(&output)?;
                self.major_versions.insert(cc.clone(), major);
                major
            }
        };

        tracing::info!("using CC={} CXX={}", cc.display(), cxx.display());

        Ok(ToolchainInfo {
            cc,
            cxx,
            cc_major_version,
        })
    }
}

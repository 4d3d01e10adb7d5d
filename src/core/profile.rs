//! Conan profile model.
//!
//! A profile is a small INI-like document:
//!
//! ```text
//! [settings]
//! arch=x86_64
//! compiler=gcc
//! [buildenv]
//! PATH='C:\rtools44\usr\bin;...'
//! [platform_requires]
//! hdf5/1.14.5
//! [platform_tool_requires]
//! cmake/3.31.6
//! [replace_requires]
//! hdf5/*: hdf5/1.14.5
//! ```
//!
//! Every section is stored as ordered `(key, value)` pairs. How a pair is
//! spelled depends on the section: `key=value` for settings and build
//! environment, `name/version` for the requires sections and
//! `pattern: replacement` for `replace_requires`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::util::fs::write_atomic;

/// Profile sections, declared in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Settings,
    Buildenv,
    PlatformRequires,
    PlatformToolRequires,
    ReplaceRequires,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Settings,
        Section::Buildenv,
        Section::PlatformRequires,
        Section::PlatformToolRequires,
        Section::ReplaceRequires,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Settings => "settings",
            Section::Buildenv => "buildenv",
            Section::PlatformRequires => "platform_requires",
            Section::PlatformToolRequires => "platform_tool_requires",
            Section::ReplaceRequires => "replace_requires",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Section::ALL.into_iter().find(|s| s.name() == name)
    }

    fn render_entry(self, key: &str, value: &str) -> String {
        match self {
            Section::Settings | Section::Buildenv => format!("{}={}", key, value),
            Section::PlatformRequires | Section::PlatformToolRequires => {
                format!("{}/{}", key, value)
            }
            Section::ReplaceRequires => format!("{}: {}", key, value),
        }
    }

    fn parse_entry(self, line: &str) -> Option<(String, String)> {
        let (key, value) = match self {
            Section::Settings | Section::Buildenv => line.split_once('=')?,
            Section::PlatformRequires | Section::PlatformToolRequires => line.split_once('/')?,
            Section::ReplaceRequires => line.split_once(':')?,
        };
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.trim().to_string()))
    }
}

/// An ordered set of profile sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    sections: BTreeMap<Section, Vec<(String, String)>>,
}

impl Profile {
    pub fn new() -> Self {
        Profile::default()
    }

    /// Set `key` in `section`. An existing key keeps its position and gets
    /// the new value; a new key is appended.
    pub fn set(
        &mut self,
        section: Section,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let key = key.into();
        let value = value.into();
        let entries = self.sections.entry(section).or_default();

        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, section: Section, key: &str) -> Option<&str> {
        self.entries(section)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self, section: Section) -> &[(String, String)] {
        self.sections.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `section` holds at least one entry.
    pub fn has_section(&self, section: Section) -> bool {
        !self.entries(section).is_empty()
    }

    /// Serialize the profile. Empty sections are omitted and there is no
    /// newline after the last line.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for (section, entries) in &self.sections {
            if entries.is_empty() {
                continue;
            }
            lines.push(format!("[{}]", section.name()));
            for (key, value) in entries {
                lines.push(section.render_entry(key, value));
            }
        }
        lines.join("\n")
    }

    /// Parse profile text as written by [`render`](Self::render) or by
    /// `conan profile detect`.
    ///
    /// Sections this model does not know about (`[conf]`, `[options]`, ...)
    /// are skipped with a warning.
    pub fn parse(text: &str) -> Result<Self> {
        let mut profile = Profile::new();
        let mut current: Option<Section> = None;
        let mut skipping = false;

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = Section::from_name(name.trim());
                skipping = current.is_none();
                if skipping {
                    tracing::warn!("ignoring unsupported profile section [{}]", name);
                }
                continue;
            }

            if skipping {
                continue;
            }

            let Some(section) = current else {
                bail!("line {}: `{}` appears before any section", lineno + 1, line);
            };

            match section.parse_entry(line) {
                Some((key, value)) => {
                    profile.set(section, key, value);
                }
                None => bail!(
                    "line {}: malformed [{}] entry `{}`",
                    lineno + 1,
                    section.name(),
                    line
                ),
            }
        }

        Ok(profile)
    }

    /// Replace the file at `path` with the rendered profile, creating parent
    /// directories. Readers never see a partially written profile.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes())
            .with_context(|| format!("failed to write profile {}", path.display()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

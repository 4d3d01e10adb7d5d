//! Version string parsing for compilers, build tools and probe output.

use anyhow::{Context, Result};
use regex::Regex;
use semver::Version;

use crate::core::error::PipelineError;

fn detection_failed(what: &str, output: &str) -> anyhow::Error {
    PipelineError::VersionDetectionFailed {
        what: what.to_string(),
        output: output.trim().to_string(),
    }
    .into()
}

fn first_line(output: &str) -> &str {
    output.lines().next().unwrap_or("").trim()
}

/// Leading integer of `cc -dumpversion` output (`13.2.0` -> 13, `16` -> 16).
pub fn parse_major_version(output: &str) -> Result<u32> {
    let re = Regex::new(r"^\d+").context("invalid version pattern")?;
    let line = first_line(output);

    re.find(line)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| detection_failed("compiler", output))
}

/// Parse the first `MAJOR.MINOR.PATCH` triple on the first line of `output`.
///
/// Probe binaries print exactly this, e.g. `1.14.5\n`.
pub fn parse_version_triplet(what: &str, output: &str) -> Result<Version> {
    let re = Regex::new(r"(\d+)\.(\d+)\.(\d+)").context("invalid version pattern")?;
    let line = first_line(output);

    let caps = re
        .captures(line)
        .ok_or_else(|| detection_failed(what, output))?;

    let part = |i: usize| -> Result<u64> {
        caps[i]
            .parse::<u64>()
            .map_err(|_| detection_failed(what, output))
    };

    Ok(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Parse `<tool> --version` output.
///
/// `cmake` and `b2` get anchored patterns matching their banners
/// (`cmake version 3.31.6`, `B2 5.2.1 ...`); any other tool falls back to
/// the first version triple on the first line.
pub fn parse_tool_version(tool: &str, output: &str) -> Result<Version> {
    let pattern = match tool {
        "cmake" => Some(r"^cmake version (\d+\.\d+\.\d+)"),
        "b2" => Some(r"^B2 (?:Version )?(\d+\.\d+\.\d+)"),
        _ => None,
    };

    let Some(pattern) = pattern else {
        return parse_version_triplet(tool, output);
    };

    let re = Regex::new(pattern).context("invalid version pattern")?;
    let line = first_line(output);
    let version = re
        .captures(line)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| detection_failed(tool, output))?;

    Version::parse(&version).map_err(|_| detection_failed(tool, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_major_version() {
        assert_eq!(parse_major_version("13.2.0\n").unwrap(), 13);
        assert_eq!(parse_major_version("16").unwrap(), 16);
    }

    #[test]
    fn test_parse_major_version_rejects_garbage() {
        let err = parse_major_version("clang: error: unknown argument").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::VersionDetectionFailed { .. })
        ));
    }

    #[test]
    fn test_parse_cmake_version() {
        let output = "cmake version 3.31.6\n\nCMake suite maintained and supported by Kitware (kitware.com/cmake).\n";
        assert_eq!(
            parse_tool_version("cmake", output).unwrap(),
            Version::new(3, 31, 6)
        );
    }

    #[test]
    fn test_parse_b2_version() {
        assert_eq!(
            parse_tool_version("b2", "B2 5.2.1 (OS=NT, jobs=16)\n").unwrap(),
            Version::new(5, 2, 1)
        );
        assert_eq!(
            parse_tool_version("b2", "B2 Version 5.1.0. OS=LINUX.\n").unwrap(),
            Version::new(5, 1, 0)
        );
    }

    #[test]
    fn test_tool_banner_must_be_on_first_line() {
        let output = "warning: something\ncmake version 3.31.6\n";
        assert!(parse_tool_version("cmake", output).is_err());
    }

    #[test]
    fn test_parse_version_triplet() {
        assert_eq!(
            parse_version_triplet("hdf5", "1.14.5\n").unwrap(),
            Version::new(1, 14, 5)
        );
        assert_eq!(
            parse_version_triplet("ninja", "ninja 1.12.1").unwrap(),
            Version::new(1, 12, 1)
        );
        assert!(parse_version_triplet("hdf5", "").is_err());
    }
}

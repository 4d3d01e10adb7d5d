//! CLI integration tests for conan-makevars.
//!
//! These tests stop before any external tool would run: they exercise
//! argument handling, the up-to-date fast path, forced regeneration and
//! error reporting.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const VALID_MAKEVARS: &str = "export CC := /usr/bin/gcc\n\
export CXX := /usr/bin/g++\n\
export CXX17 := /usr/bin/g++\n\
\n\
### BEGINNING OF conandeps.mk\n\
CONAN_LIBS = $(CONAN_LIBS_HICTK)\n\
### END OF conandeps.mk\n";

/// Get the conan-makevars binary command, isolated from the user's
/// global configuration.
fn conan_makevars(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("conan-makevars").unwrap();
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("CONAN_MAKEVARS_LOG");
    cmd
}

/// Create a package directory with an optional existing Makevars.
fn package(makevars: Option<&str>) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    if let Some(text) = makevars {
        fs::write(tmp.path().join("src").join("Makevars"), text).unwrap();
    }
    tmp
}

// ============================================================================
// arguments
// ============================================================================

#[test]
fn test_help_lists_options() {
    let home = TempDir::new().unwrap();

    conan_makevars(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--workdir"))
        .stdout(predicate::str::contains("--no-venv"))
        .stdout(predicate::str::contains("toolchain"));
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();

    conan_makevars(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("conan-makevars"));
}

#[test]
fn test_generate_flags_conflict_with_subcommands() {
    let home = TempDir::new().unwrap();

    conan_makevars(home.path())
        .args(["--force", "toolchain"])
        .assert()
        .failure();
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();

    conan_makevars(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("conan-makevars"));
}

// ============================================================================
// generation
// ============================================================================

#[test]
fn test_valid_makevars_is_left_alone() {
    let home = TempDir::new().unwrap();
    let pkg = package(Some(VALID_MAKEVARS));
    let makevars = pkg.path().join("src").join("Makevars");

    conan_makevars(home.path())
        .arg("--workdir")
        .arg(pkg.path())
        .arg("--no-venv")
        .assert()
        .success()
        .stdout(predicate::str::contains("Makevars"));

    assert_eq!(fs::read_to_string(&makevars).unwrap(), VALID_MAKEVARS);

    // A second run is just as quiet
    conan_makevars(home.path())
        .arg("--workdir")
        .arg(pkg.path())
        .arg("--no-venv")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&makevars).unwrap(), VALID_MAKEVARS);
}

#[test]
fn test_force_removes_existing_makevars() {
    let home = TempDir::new().unwrap();
    let pkg = package(Some(VALID_MAKEVARS));
    let makevars = pkg.path().join("src").join("Makevars");

    // No recipe, so the run stops right after clearing the old file
    conan_makevars(home.path())
        .arg("--workdir")
        .arg(pkg.path())
        .args(["--no-venv", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: dependency recipe not found"));

    assert!(!makevars.exists());
}

#[test]
fn test_incomplete_makevars_is_removed() {
    let home = TempDir::new().unwrap();
    let pkg = package(Some("export CC := gcc\n"));

    conan_makevars(home.path())
        .arg("--workdir")
        .arg(pkg.path())
        .arg("--no-venv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency recipe not found"));

    assert!(!pkg.path().join("src").join("Makevars").exists());
}

#[test]
fn test_missing_workdir_fails() {
    let home = TempDir::new().unwrap();

    conan_makevars(home.path())
        .args(["--workdir", "/definitely/not/a/package", "--no-venv"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: working directory not found"));
}

#[test]
fn test_project_config_moves_output() {
    let home = TempDir::new().unwrap();
    let pkg = package(None);
    fs::create_dir_all(pkg.path().join(".conan-makevars")).unwrap();
    fs::write(
        pkg.path().join(".conan-makevars").join("config.toml"),
        "[pipeline]\noutput = \"src/Makevars.win\"\n",
    )
    .unwrap();
    fs::write(pkg.path().join("src").join("Makevars.win"), VALID_MAKEVARS).unwrap();

    conan_makevars(home.path())
        .arg("--workdir")
        .arg(pkg.path())
        .arg("--no-venv")
        .assert()
        .success()
        .stdout(predicate::str::contains("Makevars.win"));
}

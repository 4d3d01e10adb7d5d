//! Test doubles for the pipeline's external seams.
//!
//! # Example
//!
//! ```rust,ignore
//! use conan_makevars::test_support::{MockProcessOutput, MockRunner};
//!
//! #[test]
//! fn test_example() {
//!     let runner = MockRunner::new();
//!     runner.expect("g++ -dumpversion", MockProcessOutput::success("13.2.0"));
//!
//!     // Hand `&runner` to the code under test...
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::toolchain::ToolchainProvider;
use crate::core::manifest::DependencyManifest;
use crate::sources::{PackageManager, RecipeInfo};
use crate::util::context::{conan_home, Environment};
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};

/// Canned result of a mocked command.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code.
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failed output.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn to_process_output(&self) -> ProcessOutput {
        ProcessOutput {
            status: Some(self.status),
            stdout: self.stdout.clone().into_bytes(),
            stderr: self.stderr.clone().into_bytes(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Output to return when matched.
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    /// Number of times this expectation has been used.
    pub used: usize,
}

impl CommandExpectation {
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// [`CommandRunner`] returning canned output.
///
/// Commands are matched on [`ProcessBuilder::display_command`] against the
/// expectations in registration order; the first available match wins.
/// A successful command carrying `-o <file>` creates `<file>`, so compiler
/// invocations leave an artifact behind like the real thing.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: RefCell<Vec<CommandExpectation>>,
    calls: RefCell<Vec<ProcessBuilder>>,
    default_output: RefCell<Option<MockProcessOutput>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    pub fn expect_pattern(&self, expectation: CommandExpectation) -> &Self {
        self.expectations.borrow_mut().push(expectation);
        self
    }

    /// Output for commands that match no expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        *self.default_output.borrow_mut() = Some(output);
        self
    }

    /// Every command run so far.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(needle)).count()
    }

    /// Verify that every expectation was used at least once, and exactly
    /// `times` times when a count was given.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.borrow().iter().enumerate() {
            match exp.times {
                Some(expected) if exp.used != expected => bail!(
                    "expectation {} was used {} times, expected {}",
                    i,
                    exp.used,
                    expected
                ),
                None if exp.used == 0 => bail!("expectation {} ({:?}) was never used", i, exp.pattern),
                _ => {}
            }
        }
        Ok(())
    }

    fn touch_output(cmd: &ProcessBuilder) {
        let args = cmd.get_args();
        if let Some(pos) = args.iter().position(|a| a == "-o") {
            if let Some(out) = args.get(pos + 1) {
                let _ = std::fs::write(out, b"");
            }
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        let full_cmd = cmd.display_command();
        self.calls.borrow_mut().push(cmd.clone());

        let mut output = None;
        for exp in self.expectations.borrow_mut().iter_mut() {
            if exp.available() && exp.pattern.matches(&full_cmd) {
                exp.used += 1;
                output = Some(exp.output.clone());
                break;
            }
        }

        let Some(output) = output.or_else(|| self.default_output.borrow().clone()) else {
            bail!("unexpected command: {}", full_cmd);
        };

        if output.status == 0 {
            Self::touch_output(cmd);
        }
        Ok(output.to_process_output())
    }
}

/// [`ToolchainProvider`] backed by a fixed program table.
#[derive(Debug, Default)]
pub struct FakeProvider {
    programs: HashMap<String, PathBuf>,
    dump_version: String,
    search_path: String,
    cxx_flags: String,
    lookups: Cell<usize>,
    version_queries: Cell<usize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        FakeProvider {
            dump_version: "13.2.0\n".to_string(),
            cxx_flags: "-I\"/usr/lib/R/site-library/Rcpp/include\"".to_string(),
            ..FakeProvider::default()
        }
    }

    pub fn with_program(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.programs.insert(name.to_string(), path.into());
        self
    }

    pub fn with_dump_version(mut self, output: &str) -> Self {
        self.dump_version = output.to_string();
        self
    }

    pub fn with_search_path(mut self, path: &str) -> Self {
        self.search_path = path.to_string();
        self
    }

    pub fn with_cxx_flags(mut self, flags: &str) -> Self {
        self.cxx_flags = flags.to_string();
        self
    }

    /// Number of `which` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    pub fn version_queries(&self) -> usize {
        self.version_queries.get()
    }
}

impl ToolchainProvider for FakeProvider {
    fn which(&self, program: &str) -> Result<Option<PathBuf>> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.programs.get(program).cloned())
    }

    fn compiler_version(&self, _cc: &Path) -> Result<String> {
        self.version_queries.set(self.version_queries.get() + 1);
        Ok(self.dump_version.clone())
    }

    fn search_path(&self) -> Result<String> {
        Ok(self.search_path.clone())
    }

    fn cxx_flags(&self) -> Result<String> {
        Ok(self.cxx_flags.clone())
    }
}

/// One recorded [`FakePackageManager`] call.
#[derive(Debug, Clone)]
pub struct PackageManagerCall {
    pub phase: &'static str,
    pub args: Vec<String>,
    pub env: Environment,
}

/// [`PackageManager`] that writes canned files instead of building anything.
#[derive(Debug)]
pub struct FakePackageManager {
    detected_profile: String,
    recipe: RecipeInfo,
    manifest: Option<String>,
    calls: RefCell<Vec<PackageManagerCall>>,
}

impl Default for FakePackageManager {
    fn default() -> Self {
        FakePackageManager::new()
    }
}

impl FakePackageManager {
    pub fn new() -> Self {
        FakePackageManager {
            detected_profile: "[settings]\n\
                               arch=x86_64\n\
                               build_type=Release\n\
                               compiler=gcc\n\
                               compiler.cppstd=gnu17\n\
                               compiler.libcxx=libstdc++11\n\
                               compiler.version=13\n\
                               os=Linux\n"
                .to_string(),
            recipe: RecipeInfo {
                name: "hictk".to_string(),
                version: "2.1.4".to_string(),
            },
            manifest: Some(
                "CONAN_INCLUDE_DIRS = $(CONAN_INCLUDE_DIRS_HICTK)\n\
                 CONAN_LIBS = $(CONAN_LIBS_HICTK)\n"
                    .to_string(),
            ),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_detected_profile(mut self, text: &str) -> Self {
        self.detected_profile = text.to_string();
        self
    }

    /// Make `install` succeed without writing a manifest.
    pub fn without_manifest(mut self) -> Self {
        self.manifest = None;
        self
    }

    pub fn calls(&self) -> Vec<PackageManagerCall> {
        self.calls.borrow().clone()
    }

    pub fn phases(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|c| c.phase).collect()
    }

    fn record(&self, phase: &'static str, args: Vec<String>, env: &Environment) {
        self.calls.borrow_mut().push(PackageManagerCall {
            phase,
            args,
            env: env.clone(),
        });
    }
}

impl PackageManager for FakePackageManager {
    fn detect_profile(&self, name: &str, env: &Environment) -> Result<()> {
        self.record("profile detect", vec![name.to_string()], env);
        let path = conan_home(env).join("profiles").join(name);
        crate::util::fs::write_string(&path, &self.detected_profile)
    }

    fn inspect(&self, recipe: &Path, env: &Environment) -> Result<RecipeInfo> {
        self.record("inspect", vec![recipe.display().to_string()], env);
        Ok(self.recipe.clone())
    }

    fn create(&self, recipe: &Path, args: &[String], env: &Environment) -> Result<()> {
        let mut all = vec![recipe.display().to_string()];
        all.extend_from_slice(args);
        self.record("create", all, env);
        Ok(())
    }

    fn install(&self, args: &[String], env: &Environment) -> Result<()> {
        self.record("install", args.to_vec(), env);

        let Some(ref manifest) = self.manifest else {
            return Ok(());
        };
        let Some(folder) = args.iter().find_map(|a| a.strip_prefix("--output-folder=")) else {
            bail!("install called without --output-folder");
        };
        crate::util::fs::write_string(
            &DependencyManifest::expected_path(Path::new(folder)),
            manifest,
        )
    }
}

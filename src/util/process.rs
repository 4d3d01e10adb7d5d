//! Subprocess execution utilities.
//!
//! Every external program the pipeline touches (compilers, probe binaries,
//! `conan`, `Rscript`, `python`) is described by a [`ProcessBuilder`] and
//! executed through a [`CommandRunner`], so tests can substitute canned
//! output for any of them.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

use crate::util::context::Environment;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    clear_env: bool,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            clear_env: false,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Run the child with exactly the given environment instead of inheriting
    /// the parent's. Variables set afterwards with [`env`](Self::env) still apply.
    pub fn environment(mut self, environment: &Environment) -> Self {
        self.clear_env = true;
        for (key, value) in environment.iter() {
            self.env.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get an environment variable that will be passed to the child.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if self.clear_env {
            cmd.env_clear();
        }

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        Ok(output)
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// A successful output with the given stdout.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        ProcessOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// A failed output with the given exit code and stderr.
    pub fn failure(status: i32, stderr: impl Into<Vec<u8>>) -> Self {
        ProcessOutput {
            status: Some(status),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Everything the process printed, stderr first.
    pub fn diagnostics(&self) -> String {
        let mut text = self.stderr_lossy();
        let stdout = self.stdout_lossy();
        if !stdout.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stdout);
        }
        text.trim_end().to_string()
    }
}

impl From<Output> for ProcessOutput {
    fn from(output: Output) -> Self {
        ProcessOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Something that can run a [`ProcessBuilder`] to completion.
pub trait CommandRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput>;

    /// Run and require a zero exit status.
    fn run_checked(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        let output = self.run(cmd)?;
        if !output.is_success() {
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                cmd.display_command(),
                output.status,
                output.diagnostics()
            );
        }
        Ok(output)
    }
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        tracing::debug!("running `{}`", cmd.display_command());
        Ok(cmd.exec()?.into())
    }
}

/// Find an executable on the search path carried by `env`.
pub fn find_executable(name: &str, env: &Environment) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    which::which_in(name, Some(env.path()), cwd).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_process_builder() {
        let output = SystemRunner
            .run(&ProcessBuilder::new("echo").arg("hello"))
            .unwrap();

        assert!(output.is_success());
        assert!(output.stdout_lossy().contains("hello"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("g++").args(["-std=c++17", "-o", "probe.bin", "probe.cpp"]);

        assert_eq!(pb.display_command(), "g++ -std=c++17 -o probe.bin probe.cpp");
    }

    #[test]
    fn test_environment_is_copied() {
        let env = Environment::from_pairs([("CC", "/usr/bin/clang"), ("PATH", "/usr/bin")]);
        let pb = ProcessBuilder::new("conan")
            .environment(&env)
            .env("CC", "/opt/gcc/bin/gcc");

        assert_eq!(pb.get_env("PATH"), Some("/usr/bin"));
        assert_eq!(pb.get_env("CC"), Some("/opt/gcc/bin/gcc"));
    }

    #[test]
    fn test_diagnostics_prefers_stderr() {
        let output = ProcessOutput {
            status: Some(1),
            stdout: b"partial\n".to_vec(),
            stderr: b"fatal error: zlib.h: No such file".to_vec(),
        };

        assert_eq!(
            output.diagnostics(),
            "fatal error: zlib.h: No such file\npartial"
        );
    }
}

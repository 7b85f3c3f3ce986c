//! Subprocess execution utilities.
//!
//! [`ProcessBuilder`] describes one invocation; [`CommandRunner`] executes
//! it. Toolchain probes and compile/link steps both go through a runner so
//! that tests can script compiler output with a mock.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
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

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Standard output split into lines
    pub stdout_lines: Vec<String>,
    /// Standard error, verbatim
    pub stderr: String,
}

impl ProcessOutput {
    /// Zero exit code.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout and stderr joined for diagnostics.
    pub fn combined(&self) -> String {
        let mut text = self.stdout_lines.join("\n");
        if !self.stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(self.stderr.trim_end());
        }
        text
    }
}

/// Runs external commands.
///
/// An `Err` means the process could not be started at all (for example the
/// program is not installed); a started process always yields `Ok`, and the
/// caller decides what a non-zero exit code means.
pub trait CommandRunner: Send + Sync {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput>;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, pb: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let mut cmd = pb.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::trace!("exec: {}", pb.display_command());
        let output = cmd.output()?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout_lines: String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_lines() {
        let out = SystemRunner
            .run(&ProcessBuilder::new("printf").arg("a\\nb\\n"))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_lines, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_system_runner_missing_program_is_err() {
        let result = SystemRunner.run(&ProcessBuilder::new("keel-definitely-not-a-program"));
        assert!(result.is_err());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("gcc").args(["-Wall", "-o", "output", "input.c"]);

        assert_eq!(pb.display_command(), "gcc -Wall -o output input.c");
    }

    #[test]
    fn test_combined_output() {
        let out = ProcessOutput {
            exit_code: Some(1),
            stdout_lines: vec!["main.c: In function 'main':".to_string()],
            stderr: "error: expected ';'\n".to_string(),
        };
        assert!(!out.success());
        assert_eq!(
            out.combined(),
            "main.c: In function 'main':\nerror: expected ';'"
        );
    }
}

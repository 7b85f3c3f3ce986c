//! Test utilities and mocks for keel unit tests.
//!
//! The build engine only touches the disk through [`FileSystem`] and only
//! runs programs through [`CommandRunner`]; the mocks here implement both so
//! that staleness and probing can be tested with explicit timestamps and
//! scripted compiler output.
//!
//! # Example
//!
//! ```rust,ignore
//! use keel::test_support::{MockFileSystem, MockRunner, MockProcessOutput};
//!
//! let fs = MockFileSystem::new();
//! fs.add_file("src/main.c", "#include \"util.h\"\n", 10);
//!
//! let runner = MockRunner::new();
//! runner.expect_prefix("gcc -dumpversion", MockProcessOutput::success("12.2.0"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::util::fs::FileSystem;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};

#[derive(Debug, Clone)]
struct MockFile {
    content: String,
    modified: SystemTime,
}

/// In-memory filesystem with explicit modification times.
///
/// Timestamps are given as seconds after the Unix epoch so tests can state
/// orderings directly. Reads are counted per path, which lets cache tests
/// assert that a memoized result did not touch the file again.
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: Mutex<BTreeMap<PathBuf, MockFile>>,
    reads: Mutex<HashMap<PathBuf, usize>>,
}

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file with the given content and timestamp.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>, mtime: u64) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MockFile {
                content: content.into(),
                modified: at(mtime),
            },
        );
    }

    /// Change a file's timestamp, keeping its content.
    pub fn touch(&self, path: impl AsRef<Path>, mtime: u64) {
        let mut files = self.files.lock().unwrap();
        if let Some(file) = files.get_mut(path.as_ref()) {
            file.modified = at(mtime);
        }
    }

    /// Remove a file.
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().remove(path.as_ref());
    }

    /// How many times `read_to_string` was called for `path`.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads
            .lock()
            .unwrap()
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap()
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files.lock().unwrap().get(path).map(|f| f.modified)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        *self
            .reads
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("file not found: {}", path.display()),
                )
            })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        if names.is_empty() && !files.keys().any(|p| p.starts_with(path)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {}", path.display()),
            ));
        }
        names.sort();
        Ok(names)
    }
}

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            exit_code: Some(self.status),
            stdout_lines: self.stdout.lines().map(str::to_string).collect(),
            stderr: self.stderr.clone(),
        }
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
            CommandPattern::Any => true,
        }
    }
}

/// Scripted [`CommandRunner`].
///
/// Commands are matched against expectations in insertion order using the
/// rendered command line (`program arg arg ...`). A command no expectation
/// matches fails to spawn with `NotFound`, as a missing program would.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Mutex<Vec<(CommandPattern, MockProcessOutput)>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandPattern::Exact(cmd.to_string()), output)
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandPattern::StartsWith(prefix.to_string()), output)
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandPattern::Contains(substring.to_string()), output)
    }

    pub fn expect_pattern(&self, pattern: CommandPattern, output: MockProcessOutput) -> &Self {
        self.expectations.lock().unwrap().push((pattern, output));
        self
    }

    /// Get all commands that were run, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded commands containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let line = cmd.display_command();
        self.calls.lock().unwrap().push(line.clone());

        let expectations = self.expectations.lock().unwrap();
        expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&line))
            .map(|(_, output)| output.to_output())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("unexpected command: {line}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_timestamps_and_reads() {
        let fs = MockFileSystem::new();
        fs.add_file("a/b.h", "x", 5);
        assert!(fs.exists(Path::new("a/b.h")));
        assert!(fs.exists(Path::new("a")));
        assert!(!fs.is_file(Path::new("a")));
        assert_eq!(fs.modified(Path::new("a/b.h")), Some(at(5)));

        fs.touch("a/b.h", 9);
        assert_eq!(fs.modified(Path::new("a/b.h")), Some(at(9)));

        fs.read_to_string(Path::new("a/b.h")).unwrap();
        fs.read_to_string(Path::new("a/b.h")).unwrap();
        assert_eq!(fs.read_count("a/b.h"), 2);
        assert!(fs.read_to_string(Path::new("missing")).is_err());
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("lib/libz.so", "", 1);
        fs.add_file("lib/libz.a", "", 1);
        fs.add_file("lib/sub/x", "", 1);
        assert_eq!(
            fs.read_dir(Path::new("lib")).unwrap(),
            vec!["libz.a".to_string(), "libz.so".to_string()]
        );
        assert!(fs.read_dir(Path::new("nope")).is_err());
    }

    #[test]
    fn test_mock_runner_matches_in_order() {
        let runner = MockRunner::new();
        runner
            .expect("gcc -dumpversion", MockProcessOutput::success("12.2.0"))
            .expect_prefix("gcc", MockProcessOutput::failure(1, "bad"));

        let out = runner
            .run(&ProcessBuilder::new("gcc").arg("-dumpversion"))
            .unwrap();
        assert_eq!(out.stdout_lines, vec!["12.2.0".to_string()]);

        let out = runner
            .run(&ProcessBuilder::new("gcc").arg("-dumpmachine"))
            .unwrap();
        assert!(!out.success());

        let err = runner.run(&ProcessBuilder::new("cl")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(runner.calls().len(), 3);
    }
}

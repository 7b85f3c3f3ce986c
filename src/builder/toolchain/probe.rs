//! Toolchain probes.
//!
//! Compilers are asked about themselves (`-dumpversion`, `-dumpmachine`,
//! `-dumpspecs`, banner output) at most once per program and probe kind.
//! Results live in a [`ProbeCache`] that is created by the caller and passed
//! down; concurrent callers asking for the same probe wait for the first
//! one to finish and share its answer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::util::process::{CommandRunner, ProcessBuilder};

/// Placeholder when `-dumpversion` is unavailable.
pub const NO_VERSION: &str = "noversion";
/// Placeholder when `-dumpmachine` is unavailable.
pub const NO_MACHINE: &str = "nomachine";

/// What is being asked of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Version,
    Machine,
    Specs,
    /// Banner output used to recognize the vendor
    Identity,
}

impl ProbeKind {
    pub(crate) fn default_args(self) -> &'static [&'static str] {
        match self {
            ProbeKind::Version => &["-dumpversion"],
            ProbeKind::Machine => &["-dumpmachine"],
            ProbeKind::Specs => &["-dumpspecs"],
            ProbeKind::Identity => &["--version"],
        }
    }
}

/// Result of a probe that may legitimately be impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome<T> {
    Available(T),
    /// The program is missing or does not support the probe
    Unavailable(String),
}

impl<T> ProbeOutcome<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            ProbeOutcome::Available(v) => Some(v),
            ProbeOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available(_))
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            ProbeOutcome::Available(v) => v,
            ProbeOutcome::Unavailable(_) => default,
        }
    }
}

type ProbeSlot = Arc<OnceLock<ProbeOutcome<Vec<String>>>>;

type ProbeKey = (PathBuf, ProbeKind, Vec<String>);

/// Memoized probe results keyed by (program, probe kind, arguments).
pub struct ProbeCache {
    runner: Arc<dyn CommandRunner>,
    entries: Mutex<HashMap<ProbeKey, ProbeSlot>>,
}

impl std::fmt::Debug for ProbeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("ProbeCache").field("entries", &entries).finish()
    }
}

impl ProbeCache {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        ProbeCache {
            runner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Run (or recall) a probe with its default arguments.
    pub fn probe(&self, program: &Path, kind: ProbeKind) -> ProbeOutcome<Vec<String>> {
        self.probe_with(program, kind, kind.default_args())
    }

    /// Run (or recall) a probe with explicit arguments.
    ///
    /// The first caller of a (program, kind, arguments) key runs the program;
    /// concurrent and later callers get the memoized answer.
    pub fn probe_with(
        &self,
        program: &Path,
        kind: ProbeKind,
        args: &[&str],
    ) -> ProbeOutcome<Vec<String>> {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let key = (
                program.to_path_buf(),
                kind,
                args.iter().map(|a| a.to_string()).collect(),
            );
            Arc::clone(entries.entry(key).or_default())
        };
        slot.get_or_init(|| self.run(program, kind, args)).clone()
    }

    fn run(&self, program: &Path, kind: ProbeKind, args: &[&str]) -> ProbeOutcome<Vec<String>> {
        let cmd = ProcessBuilder::new(program).args(args);
        match self.runner.run(&cmd) {
            Ok(output) if kind == ProbeKind::Identity => {
                // Some compilers print their banner on stderr and exit
                // non-zero when given no input.
                let lines: Vec<String> = output
                    .combined()
                    .lines()
                    .map(str::to_string)
                    .filter(|l| !l.trim().is_empty())
                    .collect();
                if lines.is_empty() {
                    ProbeOutcome::Unavailable(format!("{} printed nothing", cmd.display_command()))
                } else {
                    ProbeOutcome::Available(lines)
                }
            }
            Ok(output) if output.success() => ProbeOutcome::Available(output.stdout_lines),
            Ok(output) => ProbeOutcome::Unavailable(format!(
                "{} exited with {:?}",
                cmd.display_command(),
                output.exit_code
            )),
            Err(e) => ProbeOutcome::Unavailable(format!("{}: {}", cmd.display_command(), e)),
        }
    }

    fn first_line(&self, program: &Path, kind: ProbeKind, fallback: &str) -> String {
        match self.probe(program, kind) {
            ProbeOutcome::Available(lines) => match lines.first() {
                Some(line) if !line.trim().is_empty() => line.trim().to_string(),
                _ => fallback.to_string(),
            },
            ProbeOutcome::Unavailable(reason) => {
                tracing::warn!("probe degraded to `{}`: {}", fallback, reason);
                fallback.to_string()
            }
        }
    }

    /// Compiler version, or `"noversion"`.
    pub fn version(&self, program: &Path) -> String {
        self.first_line(program, ProbeKind::Version, NO_VERSION)
    }

    /// Target triple, or `"nomachine"`.
    pub fn machine(&self, program: &Path) -> String {
        self.first_line(program, ProbeKind::Machine, NO_MACHINE)
    }

    /// Specs text lines, empty if unavailable.
    pub fn specs(&self, program: &Path) -> Vec<String> {
        match self.probe(program, ProbeKind::Specs) {
            ProbeOutcome::Available(lines) => lines,
            ProbeOutcome::Unavailable(reason) => {
                tracing::debug!("no specs: {}", reason);
                Vec::new()
            }
        }
    }
}

/// Collect option values from one section of GCC specs text.
///
/// A section starts at the line `section` (e.g. `*link:`) and runs until the
/// next line starting with `*`. Within it, every occurrence of one of
/// `options` is followed by a value: leading whitespace is skipped and the
/// value runs to the next whitespace or `}`. Values are returned in encounter
/// order.
pub fn parse_specs(lines: &[String], section: &str, options: &[&str]) -> Vec<String> {
    let mut values = Vec::new();
    let mut in_section = false;

    for line in lines {
        if line.starts_with('*') {
            in_section = line.trim_end() == section;
            continue;
        }
        if !in_section {
            continue;
        }
        for option in options {
            let mut rest = line.as_str();
            while let Some(pos) = rest.find(option) {
                let after = rest[pos + option.len()..].trim_start();
                let end = after
                    .find(|c: char| c.is_whitespace() || c == '}')
                    .unwrap_or(after.len());
                if end > 0 {
                    values.push(after[..end].to_string());
                }
                rest = &after[end..];
            }
        }
    }
    values
}

/// Library directories the GCC driver searches implicitly.
///
/// Combines `%q` values from the specs `*link:` section with the compiler's
/// private library directory and the conventional system directories.
pub fn gcc_library_path(probes: &ProbeCache, program: &Path) -> Vec<PathBuf> {
    let specs = probes.specs(program);
    let mut dirs: Vec<PathBuf> = parse_specs(&specs, "*link:", &["%q"])
        .into_iter()
        .map(PathBuf::from)
        .collect();

    let machine = probes.machine(program);
    let version = probes.version(program);
    if machine != NO_MACHINE && version != NO_VERSION {
        dirs.push(
            Path::new("/usr/lib/gcc")
                .join(&machine)
                .join(&version),
        );
    }
    for dir in ["/lib", "/usr/lib", "/usr/local/lib"] {
        dirs.push(PathBuf::from(dir));
    }
    dirs.dedup();
    dirs
}

//! Staleness decisions for compile and link outputs.
//!
//! Every source/output pair is judged on its own: the output is stale when
//! it is missing or strictly older than the source or than any file in the
//! source's include closure. Changes deep in an include chain are caught
//! because the closure is transitive; nothing else propagates.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::source::SourceFile;
use crate::deps::{DependencyCache, SearchPath};
use crate::util::fs::FileSystem;

/// Why an output has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    MissingOutput,
    SourceNewer,
    /// A file in the include closure is newer than the output
    DependencyNewer(PathBuf),
    /// A link input (object or located library) is newer than the output
    InputNewer(PathBuf),
    /// The command line differs from the one that produced the output
    OptionsChanged,
    /// An object of the link was rebuilt in this session
    InputRebuilt,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::MissingOutput => f.write_str("output missing"),
            StaleReason::SourceNewer => f.write_str("source changed"),
            StaleReason::DependencyNewer(path) => write!(f, "{} changed", path.display()),
            StaleReason::InputNewer(path) => write!(f, "{} is newer", path.display()),
            StaleReason::OptionsChanged => f.write_str("options changed"),
            StaleReason::InputRebuilt => f.write_str("objects rebuilt"),
        }
    }
}

/// Judges outputs of one target against its search path.
pub struct StalenessEngine {
    fs: Arc<dyn FileSystem>,
    deps: Arc<DependencyCache>,
    search: SearchPath,
}

impl fmt::Debug for StalenessEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StalenessEngine")
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl StalenessEngine {
    pub fn new(fs: Arc<dyn FileSystem>, deps: Arc<DependencyCache>, search: SearchPath) -> Self {
        StalenessEngine { fs, deps, search }
    }

    pub fn search(&self) -> &SearchPath {
        &self.search
    }

    /// Whether `output` must be rebuilt from `source`.
    pub fn needs_rebuild(&self, source: &Path, output: &Path) -> bool {
        self.explain(source, output).is_some()
    }

    /// The first reason `output` is stale, or `None` when it is fresh.
    ///
    /// An output with the same timestamp as an input counts as fresh.
    pub fn explain(&self, source: &Path, output: &Path) -> Option<StaleReason> {
        let fs = self.fs.as_ref();
        let out = SourceFile::observe(fs, output);
        if !out.exists() {
            return Some(StaleReason::MissingOutput);
        }

        if SourceFile::observe(fs, source).is_newer_than(&out) {
            return Some(StaleReason::SourceNewer);
        }

        let closure = self.deps.resolve(source, &self.search);
        closure
            .into_iter()
            .find(|dep| SourceFile::observe(fs, dep).is_newer_than(&out))
            .map(|dep| {
                tracing::debug!(
                    "{} is stale because {} is newer",
                    output.display(),
                    dep.display()
                );
                StaleReason::DependencyNewer(dep)
            })
    }

    /// Whether a link output is older than any of its inputs.
    pub fn explain_link(&self, output: &Path, inputs: &[PathBuf]) -> Option<StaleReason> {
        let fs = self.fs.as_ref();
        let out = SourceFile::observe(fs, output);
        if !out.exists() {
            return Some(StaleReason::MissingOutput);
        }
        inputs
            .iter()
            .find(|input| SourceFile::observe(fs, input).is_newer_than(&out))
            .map(|input| StaleReason::InputNewer(input.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFileSystem;

    fn engine(fs: &Arc<MockFileSystem>, dirs: &[&str]) -> StalenessEngine {
        let shared: Arc<dyn FileSystem> = Arc::clone(fs) as Arc<dyn FileSystem>;
        let deps = Arc::new(DependencyCache::new(Arc::clone(&shared)));
        StalenessEngine::new(shared, deps, SearchPath::new(dirs.iter().copied()))
    }

    #[test]
    fn test_missing_output() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("src/a.c", "", 10);
        let engine = engine(&fs, &[]);
        assert_eq!(
            engine.explain(Path::new("src/a.c"), Path::new("obj/a.o")),
            Some(StaleReason::MissingOutput)
        );
    }

    #[test]
    fn test_source_newer_and_equal_timestamps() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("src/a.c", "", 10);
        fs.add_file("obj/a.o", "", 10);
        let engine = engine(&fs, &[]);
        assert!(!engine.needs_rebuild(Path::new("src/a.c"), Path::new("obj/a.o")));

        fs.touch("src/a.c", 11);
        assert_eq!(
            engine.explain(Path::new("src/a.c"), Path::new("obj/a.o")),
            Some(StaleReason::SourceNewer)
        );
    }

    #[test]
    fn test_header_change_through_depth_three_chain() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("src/main.c", "#include \"a.h\"\n", 10);
        fs.add_file("src/a.h", "#include <b.h>\n", 10);
        fs.add_file("include/b.h", "#include \"c.h\"\n", 10);
        fs.add_file("include/c.h", "#include \"d.h\"\n", 10);
        fs.add_file("include/d.h", "", 10);
        fs.add_file("obj/main.o", "", 20);
        let engine = engine(&fs, &["include"]);

        let src = Path::new("src/main.c");
        let obj = Path::new("obj/main.o");
        assert!(!engine.needs_rebuild(src, obj));

        fs.touch("include/d.h", 21);
        assert_eq!(
            engine.explain(src, obj),
            Some(StaleReason::DependencyNewer(PathBuf::from("include/d.h")))
        );
    }

    #[test]
    fn test_unrelated_header_does_not_matter() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("src/main.c", "#include <stdio.h>\n", 10);
        fs.add_file("include/other.h", "", 50);
        fs.add_file("obj/main.o", "", 20);
        let engine = engine(&fs, &["include"]);
        assert!(!engine.needs_rebuild(Path::new("src/main.c"), Path::new("obj/main.o")));
    }

    #[test]
    fn test_link_inputs() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("obj/a.o", "", 10);
        fs.add_file("obj/b.o", "", 30);
        fs.add_file("bin/app", "", 20);
        let engine = engine(&fs, &[]);
        let inputs = vec![PathBuf::from("obj/a.o"), PathBuf::from("obj/b.o")];

        assert_eq!(
            engine.explain_link(Path::new("bin/app"), &inputs),
            Some(StaleReason::InputNewer(PathBuf::from("obj/b.o")))
        );
        assert_eq!(
            engine.explain_link(Path::new("bin/other"), &inputs),
            Some(StaleReason::MissingOutput)
        );
        fs.touch("bin/app", 30);
        assert_eq!(engine.explain_link(Path::new("bin/app"), &inputs), None);
    }
}

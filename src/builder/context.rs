//! Build context: toolchain, collaborators and output layout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::history::HISTORY_FILE;
use crate::builder::toolchain::{gcc_library_path, ProbeCache, Toolchain, VendorKind};
use crate::core::manifest::Properties;
use crate::deps::{DependencyCache, DEPS_FILE};
use crate::util::fs::FileSystem;
use crate::util::process::CommandRunner;

/// Everything a build needs besides the manifest.
#[derive(Clone)]
pub struct BuildContext {
    pub toolchain: Arc<Toolchain>,

    /// Memoized compiler probes, shared by every target
    pub probes: Arc<ProbeCache>,

    pub fs: Arc<dyn FileSystem>,

    pub runner: Arc<dyn CommandRunner>,

    /// Include closures, shared by every target and persisted between runs
    pub deps: Arc<DependencyCache>,

    /// Directory containing Keel.toml
    pub project_root: PathBuf,

    /// `target/debug` or `target/release` under the project root
    pub output_dir: PathBuf,

    pub release: bool,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("vendor", &self.toolchain.vendor)
            .field("platform", &self.toolchain.platform)
            .field("project_root", &self.project_root)
            .field("output_dir", &self.output_dir)
            .field("release", &self.release)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    pub fn new(
        project_root: &Path,
        release: bool,
        toolchain: Toolchain,
        probes: Arc<ProbeCache>,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let deps = Arc::new(DependencyCache::load(
            Arc::clone(&fs),
            &project_root.join(DEPS_FILE),
        ));
        let profile = if release { "release" } else { "debug" };
        BuildContext {
            toolchain: Arc::new(toolchain),
            probes,
            fs,
            runner,
            deps,
            project_root: project_root.to_path_buf(),
            output_dir: project_root.join("target").join(profile),
            release,
        }
    }

    pub fn profile_name(&self) -> &'static str {
        if self.release {
            "release"
        } else {
            "debug"
        }
    }

    /// Object files of `target` live here, mirroring the source tree.
    pub fn obj_dir(&self, target: &str) -> PathBuf {
        self.output_dir.join("obj").join(target)
    }

    /// Linked outputs of every target.
    pub fn bin_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    pub fn deps_path(&self) -> PathBuf {
        self.project_root.join(DEPS_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.project_root.join(HISTORY_FILE)
    }

    /// Facts manifest conditions are evaluated against.
    pub fn properties(&self) -> Properties {
        Properties::new(
            self.toolchain.platform.as_str(),
            self.toolchain.vendor.as_str(),
            self.profile_name(),
        )
    }

    /// Directories the linker searches when a library set names none.
    ///
    /// Only GCC-style drivers can report theirs.
    pub fn default_library_dirs(&self) -> Vec<PathBuf> {
        match self.toolchain.vendor {
            VendorKind::Gcc | VendorKind::Clang | VendorKind::Intel => {
                let cc = self
                    .toolchain
                    .programs
                    .cc
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(self.toolchain.vendor.processors()[0].program));
                gcc_library_path(&self.probes, &cc)
            }
            _ => Vec::new(),
        }
    }
}

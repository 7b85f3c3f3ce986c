//! Memoized dependency records.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::deps::SearchPath;
use crate::scanner::IncludeDirective;
use crate::util::fs::FileSystem;

/// An include that could not be found on the search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unresolved {
    /// File containing the directive
    pub from: PathBuf,
    pub include: IncludeDirective,
}

/// Observed modification time of one file at the time a record was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

/// The dependency information for one source under one search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub source: PathBuf,
    /// Fingerprint of the search path the closure was computed with
    pub search: String,
    /// Includes found directly in the source
    pub direct: Vec<IncludeDirective>,
    /// Transitive closure in depth-first discovery order, without the
    /// source itself
    pub closure: Vec<PathBuf>,
    pub unresolved: Vec<Unresolved>,
    /// Source and every closure member
    pub stamps: Vec<Stamp>,
}

impl DependencyRecord {
    /// Whether the record still describes the files on disk.
    ///
    /// A record goes stale when any stamped file changed or disappeared, or
    /// when a previously unresolved include now resolves.
    pub fn is_current(&self, fs: &dyn FileSystem, search: &SearchPath) -> bool {
        if self.search != search.fingerprint() {
            return false;
        }
        if self
            .stamps
            .iter()
            .any(|stamp| fs.modified(&stamp.path) != stamp.modified)
        {
            return false;
        }
        !self
            .unresolved
            .iter()
            .any(|u| search.resolve(fs, &u.from, &u.include).is_some())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.closure.iter().any(|p| p == path)
    }
}

//! Source files and languages.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::util::fs::FileSystem;

/// Source language handled by a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    C,
    #[serde(alias = "cpp", alias = "cxx", alias = "c++")]
    Cxx,
    Fortran,
}

impl Language {
    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
            Language::Fortran => "fortran",
        }
    }
}

/// A path observed on disk together with its modification time.
///
/// Observations are taken fresh on every build pass; a `SourceFile` is never
/// updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// `None` when the file does not exist
    pub modified: Option<SystemTime>,
}

impl SourceFile {
    /// Stat `path` through the filesystem collaborator.
    pub fn observe(fs: &dyn FileSystem, path: &Path) -> Self {
        SourceFile {
            path: path.to_path_buf(),
            modified: fs.modified(path),
        }
    }

    pub fn exists(&self) -> bool {
        self.modified.is_some()
    }

    /// Whether this file was modified strictly after `other`.
    ///
    /// A missing file is never newer; anything existing is newer than a
    /// missing file.
    pub fn is_newer_than(&self, other: &SourceFile) -> bool {
        match (self.modified, other.modified) {
            (Some(mine), Some(theirs)) => mine > theirs,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

//! Include-dependency scanning.
//!
//! Scanners extract header references from source text line by line. They do
//! not expand macros or evaluate conditional compilation, so the result is a
//! conservative over-approximation of the real dependencies. Malformed
//! directives are skipped; scanning never fails.

mod c;
mod fortran;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use c::scan_c;
pub use fortran::scan_fortran;

/// Delimiter used by an include directive.
///
/// The form decides where the header is searched for, so it is kept
/// alongside the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeForm {
    /// `"name"`: including file's directory first, then the search path
    Quote,
    /// `<name>`: search path only
    Angle,
}

/// A header reference found by a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncludeDirective {
    pub name: String,
    pub form: IncludeForm,
}

impl IncludeDirective {
    pub fn quote(name: impl Into<String>) -> Self {
        IncludeDirective {
            name: name.into(),
            form: IncludeForm::Quote,
        }
    }

    pub fn angle(name: impl Into<String>) -> Self {
        IncludeDirective {
            name: name.into(),
            form: IncludeForm::Angle,
        }
    }
}

impl std::fmt::Display for IncludeDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.form {
            IncludeForm::Quote => write!(f, "\"{}\"", self.name),
            IncludeForm::Angle => write!(f, "<{}>", self.name),
        }
    }
}

/// Which scanner understands a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    /// `#include` / `#import`
    #[default]
    C,
    /// Fortran `include 'name'` statements, plus `#include` for
    /// preprocessed sources
    Fortran,
}

const FORTRAN_EXTENSIONS: &[&str] = &[
    "f", "for", "ftn", "fpp", "f77", "f90", "f95", "f03", "f08",
];

impl ScannerKind {
    /// Pick a scanner by file extension. Content is never sniffed.
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if FORTRAN_EXTENSIONS.contains(&ext.as_str()) {
            ScannerKind::Fortran
        } else {
            ScannerKind::C
        }
    }

    pub fn scan(self, text: &str) -> Vec<IncludeDirective> {
        match self {
            ScannerKind::C => scan_c(text),
            ScannerKind::Fortran => scan_fortran(text),
        }
    }
}

/// Push `directive` unless an identical one was already found.
fn push_unique(found: &mut Vec<IncludeDirective>, directive: IncludeDirective) {
    if !found.contains(&directive) {
        found.push(directive);
    }
}

/// Extract the delimited name at the start of `rest`.
///
/// `rest` must begin with the opening delimiter. Returns `None` when the
/// closing delimiter is missing or the name is empty.
fn delimited_name(rest: &str, close: char) -> Option<&str> {
    let inner = &rest[1..];
    let end = inner.find(close)?;
    let name = &inner[..end];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

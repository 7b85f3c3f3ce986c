//! Header search paths.

use std::path::{Path, PathBuf};

use crate::scanner::{IncludeDirective, IncludeForm};
use crate::util::fs::{normalize_lexical, FileSystem};
use crate::util::hash::Fingerprint;

/// Ordered list of include directories plus a fingerprint of that list.
///
/// The fingerprint keys memoized dependency records: the same source
/// resolved against a different search path is a different record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
    fingerprint: String,
}

impl SearchPath {
    pub fn new(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let dirs: Vec<PathBuf> = dirs.into_iter().map(Into::into).collect();
        let mut fp = Fingerprint::new();
        for dir in &dirs {
            fp.update_path(dir);
        }
        SearchPath {
            dirs,
            fingerprint: fp.finish_short(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Find the file an include directive in `including` refers to.
    ///
    /// Quote form tries the including file's directory first and then the
    /// search directories in order; angle form tries only the search
    /// directories. The first existing file wins.
    pub fn resolve(
        &self,
        fs: &dyn FileSystem,
        including: &Path,
        include: &IncludeDirective,
    ) -> Option<PathBuf> {
        let name = Path::new(&include.name);
        if name.is_absolute() {
            return fs.is_file(name).then(|| normalize_lexical(name));
        }

        let local = match include.form {
            IncludeForm::Quote => including.parent(),
            IncludeForm::Angle => None,
        };

        local
            .into_iter()
            .chain(self.dirs.iter().map(PathBuf::as_path))
            .map(|dir| normalize_lexical(&dir.join(name)))
            .find(|candidate| fs.is_file(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFileSystem;

    fn fixture() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("proj/src/main.c", "", 1);
        fs.add_file("proj/src/config.h", "", 1);
        fs.add_file("proj/include/config.h", "", 1);
        fs.add_file("proj/include/api.h", "", 1);
        fs
    }

    #[test]
    fn test_quote_prefers_including_directory() {
        let fs = fixture();
        let search = SearchPath::new(["proj/include"]);
        let found = search.resolve(
            &fs,
            Path::new("proj/src/main.c"),
            &IncludeDirective::quote("config.h"),
        );
        assert_eq!(found, Some(PathBuf::from("proj/src/config.h")));
    }

    #[test]
    fn test_angle_skips_including_directory() {
        let fs = fixture();
        let search = SearchPath::new(["proj/include"]);
        let found = search.resolve(
            &fs,
            Path::new("proj/src/main.c"),
            &IncludeDirective::angle("config.h"),
        );
        assert_eq!(found, Some(PathBuf::from("proj/include/config.h")));
    }

    #[test]
    fn test_angle_not_found_locally() {
        let fs = fixture();
        let search = SearchPath::new(Vec::<PathBuf>::new());
        let found = search.resolve(
            &fs,
            Path::new("proj/src/main.c"),
            &IncludeDirective::angle("config.h"),
        );
        assert_eq!(found, None);
    }

    #[test]
    fn test_search_order_first_match_wins() {
        let fs = fixture();
        fs.add_file("proj/other/api.h", "", 1);
        let search = SearchPath::new(["proj/other", "proj/include"]);
        let found = search.resolve(
            &fs,
            Path::new("proj/src/main.c"),
            &IncludeDirective::angle("api.h"),
        );
        assert_eq!(found, Some(PathBuf::from("proj/other/api.h")));
    }

    #[test]
    fn test_relative_names_are_normalized() {
        let fs = fixture();
        let search = SearchPath::new(Vec::<PathBuf>::new());
        let found = search.resolve(
            &fs,
            Path::new("proj/src/main.c"),
            &IncludeDirective::quote("../include/api.h"),
        );
        assert_eq!(found, Some(PathBuf::from("proj/include/api.h")));
    }

    #[test]
    fn test_fingerprint_tracks_directory_order() {
        let a = SearchPath::new(["x", "y"]);
        let b = SearchPath::new(["y", "x"]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), SearchPath::new(["x", "y"]).fingerprint());
    }
}

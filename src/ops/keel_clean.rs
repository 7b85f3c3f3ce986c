//! Implementation of `keel clean`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::history::HISTORY_FILE;
use crate::deps::DEPS_FILE;
use crate::ops::keel_build::COMPILE_COMMANDS_FILE;
use crate::util::fs::remove_dir_all_if_exists;

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Only remove this profile's outputs (`debug` or `release`)
    pub profile: Option<String>,

    /// Also drop the dependency cache and build history
    pub caches: bool,
}

/// Remove build outputs under `root`. Returns the paths that were removed.
///
/// Toolchain configuration in `.keel/` is never touched.
pub fn clean(root: &Path, opts: &CleanOptions) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let target_dir = match &opts.profile {
        Some(profile) => root.join("target").join(profile),
        None => root.join("target"),
    };
    if target_dir.exists() {
        remove_dir_all_if_exists(&target_dir)?;
        removed.push(target_dir);
    }

    if opts.caches {
        for file in [DEPS_FILE, HISTORY_FILE, COMPILE_COMMANDS_FILE] {
            let path = root.join(file);
            if path.is_file() {
                std::fs::remove_file(&path)?;
                removed.push(path);
            }
        }
    }

    for path in &removed {
        tracing::debug!("removed {}", path.display());
    }
    Ok(removed)
}

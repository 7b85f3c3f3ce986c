//! Command history for incremental builds.
//!
//! Timestamps alone miss option changes: a new define leaves every object
//! newer than its source. Each output remembers a fingerprint of the command
//! line that produced it, and a differing fingerprint forces a rebuild.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::toolchain::CommandSpec;
use crate::util::fs::write_string;
use crate::util::hash::Fingerprint;

/// Where the history lives, relative to the project root.
pub const HISTORY_FILE: &str = ".keel/history.json";

/// Command fingerprints of the last successful build steps.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BuildHistory {
    /// Compile fingerprints by object path
    #[serde(default)]
    pub compile: BTreeMap<PathBuf, String>,

    /// Link fingerprints by target name
    #[serde(default)]
    pub link: BTreeMap<String, String>,
}

impl BuildHistory {
    /// Load the history. Missing or corrupt files give an empty history,
    /// which rebuilds everything once.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return BuildHistory::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring corrupt build history {}: {}", path.display(), e);
            BuildHistory::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize build history")?;
        write_string(path, &content)
    }

    /// Fingerprint of a command: program, arguments and environment.
    pub fn fingerprint(command: &CommandSpec) -> String {
        let mut fp = Fingerprint::new();
        fp.update_path(&command.program);
        fp.update_strs(command.args.iter().map(String::as_str));
        for (key, value) in &command.env {
            fp.update_str(key).update_str(value);
        }
        fp.finish_short()
    }

    /// Whether `object` was last built by a different command.
    /// An object never recorded counts as changed.
    pub fn compile_changed(&self, object: &Path, fingerprint: &str) -> bool {
        self.compile.get(object).map(String::as_str) != Some(fingerprint)
    }

    pub fn record_compile(&mut self, object: &Path, fingerprint: String) {
        self.compile.insert(object.to_path_buf(), fingerprint);
    }

    pub fn link_changed(&self, target: &str, fingerprint: &str) -> bool {
        self.link.get(target).map(String::as_str) != Some(fingerprint)
    }

    pub fn record_link(&mut self, target: &str, fingerprint: String) {
        self.link.insert(target.to_string(), fingerprint);
    }
}

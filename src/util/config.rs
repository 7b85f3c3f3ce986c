//! Toolchain configuration files.
//!
//! Toolchain overrides live in two places:
//! - Global: `~/.keel/toolchain.toml` - user-wide defaults
//! - Project: `.keel/toolchain.toml` - project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::toolchain::{TargetPlatform, VendorKind};
use crate::util::fs::write_string;

/// Toolchain configuration for compiler overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub toolchain: ToolchainSettings,
}

/// Toolchain settings for C/C++/Fortran compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Vendor family, bypassing detection (e.g. "msvc", "intel")
    pub vendor: Option<VendorKind>,

    /// Processor variant within the vendor (e.g. "thumb" for ARM)
    pub variant: Option<String>,

    /// Target platform when cross-compiling
    pub platform: Option<TargetPlatform>,

    /// Path to the C compiler (e.g., /usr/bin/clang)
    pub cc: Option<PathBuf>,

    /// Path to the C++ compiler (e.g., /usr/bin/clang++)
    pub cxx: Option<PathBuf>,

    /// Path to the Fortran compiler
    pub fc: Option<PathBuf>,

    /// Path to the archiver (e.g., /usr/bin/llvm-ar)
    pub ar: Option<PathBuf>,

    /// Additional compiler flags
    pub cflags: Vec<String>,

    /// Additional linker flags
    pub ldflags: Vec<String>,
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load toolchain configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("{:#}", e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize toolchain config")?;
        write_string(path, &contents)
    }

    /// Check if any toolchain settings are configured.
    pub fn has_overrides(&self) -> bool {
        self.toolchain != ToolchainSettings::default()
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        let ours = &mut self.toolchain;
        let theirs = other.toolchain;

        if theirs.vendor.is_some() {
            ours.vendor = theirs.vendor;
        }
        if theirs.variant.is_some() {
            ours.variant = theirs.variant;
        }
        if theirs.platform.is_some() {
            ours.platform = theirs.platform;
        }
        if theirs.cc.is_some() {
            ours.cc = theirs.cc;
        }
        if theirs.cxx.is_some() {
            ours.cxx = theirs.cxx;
        }
        if theirs.fc.is_some() {
            ours.fc = theirs.fc;
        }
        if theirs.ar.is_some() {
            ours.ar = theirs.ar;
        }
        if !theirs.cflags.is_empty() {
            ours.cflags = theirs.cflags;
        }
        if !theirs.ldflags.is_empty() {
            ours.ldflags = theirs.ldflags;
        }
    }
}

/// Load merged toolchain configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.keel/toolchain.toml)
/// 2. Global config (~/.keel/toolchain.toml)
/// 3. Defaults
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    if let Some(global) = global_path {
        config.merge(ToolchainConfig::load_or_default(global));
    }
    config.merge(ToolchainConfig::load_or_default(project_path));

    config
}

/// Get the global keel config directory (~/.keel).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".keel"))
}

/// Get the global toolchain config path (~/.keel/toolchain.toml).
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("toolchain.toml"))
}

/// Get the project toolchain config path (.keel/toolchain.toml).
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".keel").join("toolchain.toml")
}

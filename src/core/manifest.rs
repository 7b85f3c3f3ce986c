//! Keel.toml manifest parsing and schema.
//!
//! A manifest names a project and its targets. Each target resolves into a
//! [`CapabilityModel`] and, once the build properties are known, a fully
//! evaluated [`BuildOptions`]: every `if`/`unless` condition on a define has
//! been turned into an active flag by then.
//!
//! ```toml
//! [project]
//! name = "demo"
//! version = "1.2.0"
//!
//! [targets.demo]
//! kind = "shared"
//! sources = ["src/**/*.c"]
//! include = ["include"]
//! defines = ["API=1", { name = "USE_EPOLL", if = "linux" }]
//! libs = [{ names = ["m"] }]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::Deserialize;

use crate::builder::toolchain::LibraryVersion;
use crate::core::capability::{CapabilityModel, OutputKind, RuntimeLinkage, Subsystem};
use crate::core::errors::ConfigError;
use crate::core::options::{BuildOptions, DefineOp, LibrarySet, Optimization, WarningLevel};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Keel.toml";

/// Sources of the implicit target when a manifest declares none.
const DEFAULT_SOURCES: &[&str] = &["src/**/*.c", "src/**/*.cpp", "src/**/*.cc"];

/// Facts conditions are evaluated against.
///
/// A term matches when it names a property: the platform (`linux`,
/// `windows`, ...), its family (`unix` or `windows`), the vendor (`gcc`,
/// `msvc`, ...) or the profile (`debug`, `release`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    names: BTreeSet<String>,
}

impl Properties {
    pub fn new(platform: &str, vendor: &str, profile: &str) -> Self {
        let family = if platform == "windows" { "windows" } else { "unix" };
        let names = [platform, family, vendor, profile]
            .into_iter()
            .map(str::to_string)
            .collect();
        Properties { names }
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Evaluate a condition: `&&`-joined terms, each optionally negated
    /// with `!`. An empty condition is true.
    pub fn eval(&self, condition: &str) -> bool {
        condition
            .split("&&")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .all(|term| match term.strip_prefix('!') {
                Some(negated) => !self.has(negated.trim()),
                None => self.has(term),
            })
    }
}

/// A define entry: `"NAME"`, `"NAME=value"` or a table with conditions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DefineSpec {
    Simple(String),
    Detailed {
        name: String,
        #[serde(default)]
        value: Option<String>,
        /// Undefine instead of define
        #[serde(default)]
        undef: bool,
        #[serde(default, rename = "if")]
        when: Option<String>,
        #[serde(default)]
        unless: Option<String>,
    },
}

impl DefineSpec {
    /// Resolve into an operation with its activation evaluated.
    pub fn resolve(&self, props: &Properties) -> DefineOp {
        match self {
            DefineSpec::Simple(text) => match text.split_once('=') {
                Some((name, value)) => DefineOp::define_value(name, value),
                None => DefineOp::define(text.as_str()),
            },
            DefineSpec::Detailed {
                name,
                value,
                undef,
                when,
                unless,
            } => {
                let mut op = if *undef {
                    DefineOp::undefine(name.as_str())
                } else {
                    DefineOp::define(name.as_str())
                };
                op.value = value.clone();
                let active = when.as_deref().map_or(true, |c| props.eval(c))
                    && !unless.as_deref().is_some_and(|c| props.eval(c));
                op.when(active)
            }
        }
    }
}

/// Project metadata from the `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,

    /// Project version (semver); the default version of shared libraries
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl ProjectMetadata {
    pub fn version(&self) -> Result<Option<Version>> {
        self.version
            .as_deref()
            .map(|v| v.parse().with_context(|| format!("invalid version: {v}")))
            .transpose()
    }
}

/// Build profile settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub debug: Option<bool>,

    #[serde(default)]
    pub optimize: Option<Optimization>,

    #[serde(default)]
    pub warnings: Option<i32>,

    #[serde(default)]
    pub defines: Vec<DefineSpec>,

    #[serde(default)]
    pub cflags: Vec<String>,

    #[serde(default)]
    pub ldflags: Vec<String>,
}

/// One target as written in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub kind: OutputKind,

    #[serde(default)]
    pub sources: Vec<String>,

    /// Include search directories, in search order
    #[serde(default)]
    pub include: Vec<PathBuf>,

    #[serde(default)]
    pub subsystem: Subsystem,

    #[serde(default)]
    pub runtime: RuntimeLinkage,

    #[serde(default)]
    pub version: Option<LibraryVersion>,

    #[serde(default)]
    pub defines: Vec<DefineSpec>,

    #[serde(default)]
    pub libs: Vec<LibrarySet>,

    #[serde(default)]
    pub cflags: Vec<String>,

    #[serde(default)]
    pub ldflags: Vec<String>,

    #[serde(default)]
    pub warnings: Option<i32>,

    #[serde(default)]
    pub optimize: Option<Optimization>,

    #[serde(default)]
    pub exceptions: Option<bool>,

    #[serde(default)]
    pub rtti: Option<bool>,

    #[serde(default)]
    pub multithreaded: Option<bool>,
}

impl Target {
    /// An executable compiling the conventional source directories.
    pub fn default_for(name: &str) -> Self {
        Target {
            name: name.to_string(),
            kind: OutputKind::Executable,
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
            subsystem: Subsystem::default(),
            runtime: RuntimeLinkage::default(),
            version: None,
            defines: Vec::new(),
            libs: Vec::new(),
            cflags: Vec::new(),
            ldflags: Vec::new(),
            warnings: None,
            optimize: None,
            exceptions: None,
            rtti: None,
            multithreaded: None,
        }
    }

    pub fn capability(&self) -> CapabilityModel {
        CapabilityModel::new(self.kind)
            .with_subsystem(self.subsystem)
            .with_runtime(self.runtime)
    }

    /// Build options for this target under `profile`.
    ///
    /// Target settings win over the profile; profile defines, cflags and
    /// ldflags are appended after the target's own. Relative include and
    /// library directories are anchored at `root`.
    pub fn options(&self, profile: &Profile, props: &Properties, root: &Path) -> BuildOptions {
        let anchor = |dir: &Path| {
            if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                root.join(dir)
            }
        };

        let defines = self
            .defines
            .iter()
            .chain(&profile.defines)
            .map(|d| d.resolve(props))
            .collect();

        let library_sets = self
            .libs
            .iter()
            .map(|set| LibrarySet {
                dir: set.dir.as_deref().map(anchor),
                ..set.clone()
            })
            .collect();

        let defaults = BuildOptions::default();
        BuildOptions {
            debug: profile.debug.unwrap_or(false),
            multithreaded: self.multithreaded.unwrap_or(defaults.multithreaded),
            exceptions: self.exceptions.unwrap_or(defaults.exceptions),
            rtti: self.rtti,
            optimization: self.optimize.or(profile.optimize),
            warning_level: self
                .warnings
                .or(profile.warnings)
                .map(WarningLevel)
                .unwrap_or_default(),
            defines,
            include_dirs: self.include.iter().map(|d| anchor(d.as_path())).collect(),
            library_sets,
            compiler_args: self.cflags.iter().chain(&profile.cflags).cloned().collect(),
            linker_args: self.ldflags.iter().chain(&profile.ldflags).cloned().collect(),
        }
    }

    /// Library version for the link: the target's own, else the project
    /// version for shared libraries.
    pub fn library_version(&self, project: Option<&Version>) -> Option<LibraryVersion> {
        if self.version.is_some() {
            return self.version.clone();
        }
        if self.kind != OutputKind::Shared {
            return None;
        }
        project.and_then(|v| {
            format!("{}.{}.{}", v.major, v.minor, v.patch)
                .parse()
                .ok()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources(self.name.clone()));
        }
        Ok(())
    }
}

/// The parsed Keel.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub project: ProjectMetadata,

    /// Targets sorted by name
    pub targets: Vec<Target>,

    pub profiles: BTreeMap<String, Profile>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    project: ProjectMetadata,

    #[serde(default)]
    targets: BTreeMap<String, Target>,

    #[serde(default)]
    profile: BTreeMap<String, Profile>,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest =
            toml::from_str(content).with_context(|| format!("failed to parse {MANIFEST_NAME}"))?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut targets = Vec::new();
        for (name, mut target) in raw.targets {
            target.name = name;
            target
                .validate()
                .with_context(|| format!("invalid target in {}", path.display()))?;
            targets.push(target);
        }

        if targets.is_empty() {
            targets.push(Target::default_for(&raw.project.name));
        }

        raw.project.version()?;

        for name in raw.profile.keys() {
            if name != "debug" && name != "release" {
                bail!("unknown profile `{name}`, expected `debug` or `release`");
            }
        }

        Ok(Manifest {
            project: raw.project,
            targets,
            profiles: raw.profile,
            manifest_dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// Project version, if one is declared and valid.
    pub fn version(&self) -> Option<Version> {
        self.project.version().ok().flatten()
    }

    /// Get a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Get the debug profile (with defaults).
    pub fn debug_profile(&self) -> Profile {
        let mut profile = Profile {
            debug: Some(true),
            ..Default::default()
        };

        if let Some(custom) = self.profiles.get("debug") {
            merge_profile(&mut profile, custom);
        }

        profile
    }

    /// Get the release profile (with defaults).
    pub fn release_profile(&self) -> Profile {
        let mut profile = Profile {
            debug: Some(false),
            optimize: Some(Optimization::Speed),
            defines: vec![DefineSpec::Simple("NDEBUG".to_string())],
            ..Default::default()
        };

        if let Some(custom) = self.profiles.get("release") {
            merge_profile(&mut profile, custom);
        }

        profile
    }

    pub fn profile(&self, release: bool) -> Profile {
        if release {
            self.release_profile()
        } else {
            self.debug_profile()
        }
    }
}

fn merge_profile(base: &mut Profile, custom: &Profile) {
    if custom.debug.is_some() {
        base.debug = custom.debug;
    }
    if custom.optimize.is_some() {
        base.optimize = custom.optimize;
    }
    if custom.warnings.is_some() {
        base.warnings = custom.warnings;
    }
    if !custom.defines.is_empty() {
        base.defines = custom.defines.clone();
    }
    if !custom.cflags.is_empty() {
        base.cflags = custom.cflags.clone();
    }
    if !custom.ldflags.is_empty() {
        base.ldflags = custom.ldflags.clone();
    }
}

/// Find `Keel.toml` in `start` or the nearest ancestor.
pub fn find_manifest(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            bail!(
                "could not find {} in {} or any parent directory",
                MANIFEST_NAME,
                start.display()
            );
        }
    }
}

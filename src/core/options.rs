//! Per-target build options.
//!
//! `BuildOptions` arrives fully resolved from the driver: activation
//! conditions on define operations have already been evaluated into
//! [`DefineOp::active`]. The only decision left to the engine is dropping
//! inactive operations before synthesis.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;

/// Optimization goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimization {
    /// Smallest code
    Size,
    /// Standard speed optimizations
    Speed,
    /// Aggressive speed optimizations
    Full,
    /// Everything the vendor offers, including inter-procedural passes
    Extreme,
}

/// Warning level, 0 (silence) to 5 (warnings are errors).
///
/// Any integer is accepted; vendors see the level clamped into `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarningLevel(pub i32);

impl WarningLevel {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 5;

    /// The level clamped into the defined range.
    pub fn clamped(self) -> u8 {
        self.0.clamp(Self::MIN as i32, Self::MAX as i32) as u8
    }
}

impl Default for WarningLevel {
    fn default() -> Self {
        WarningLevel(1)
    }
}

/// Whether an operation defines or undefines a macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefineKind {
    Define,
    Undefine,
}

/// One preprocessor define or undefine operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefineOp {
    pub kind: DefineKind,
    pub name: String,
    pub value: Option<String>,
    /// Result of the activation condition; inactive operations are dropped
    pub active: bool,
}

impl DefineOp {
    pub fn define(name: impl Into<String>) -> Self {
        DefineOp {
            kind: DefineKind::Define,
            name: name.into(),
            value: None,
            active: true,
        }
    }

    pub fn define_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        DefineOp {
            value: Some(value.into()),
            ..Self::define(name)
        }
    }

    pub fn undefine(name: impl Into<String>) -> Self {
        DefineOp {
            kind: DefineKind::Undefine,
            ..Self::define(name)
        }
    }

    pub fn when(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// How a set of libraries should be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// Whatever the linker finds first (vendor default linkage)
    #[default]
    Unspecified,
    Static,
    Shared,
    /// Darwin framework; plain shared library elsewhere
    Framework,
}

/// An ordered group of libraries sharing a directory and a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibrarySet {
    pub dir: Option<PathBuf>,
    pub names: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: LibraryType,
}

impl LibrarySet {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>, kind: LibraryType) -> Self {
        LibrarySet {
            dir: None,
            names: names.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

/// Everything that shapes a compile or link invocation apart from the
/// capability model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub debug: bool,
    pub multithreaded: bool,
    pub exceptions: bool,
    /// `None` leaves RTTI at the vendor default
    pub rtti: Option<bool>,
    pub optimization: Option<Optimization>,
    pub warning_level: WarningLevel,
    pub defines: Vec<DefineOp>,
    pub include_dirs: Vec<PathBuf>,
    pub library_sets: Vec<LibrarySet>,
    /// Extra compiler arguments, passed verbatim
    pub compiler_args: Vec<String>,
    /// Extra linker arguments, decorated for the vendor's driver
    pub linker_args: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            debug: false,
            multithreaded: true,
            exceptions: true,
            rtti: None,
            optimization: None,
            warning_level: WarningLevel::default(),
            defines: Vec::new(),
            include_dirs: Vec::new(),
            library_sets: Vec::new(),
            compiler_args: Vec::new(),
            linker_args: Vec::new(),
        }
    }
}

impl BuildOptions {
    /// Define operations that survive the activation drop rule, in order.
    pub fn active_defines(&self) -> impl Iterator<Item = &DefineOp> {
        self.defines.iter().filter(|op| op.active)
    }

    /// Reject malformed macro, include and library settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for op in &self.defines {
            if op.name.is_empty() {
                return Err(ConfigError::EmptyDefineName);
            }
            if op.name.contains(|c: char| c.is_whitespace() || c == '=') {
                return Err(ConfigError::InvalidDefineName(op.name.clone()));
            }
            if op.kind == DefineKind::Undefine && op.value.is_some() {
                return Err(ConfigError::UndefineWithValue(op.name.clone()));
            }
        }

        if self.include_dirs.iter().any(|d| d.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyIncludeDir);
        }

        for set in &self.library_sets {
            if set.names.iter().any(|n| n.trim().is_empty()) {
                return Err(ConfigError::EmptyLibraryName);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_level_clamps() {
        assert_eq!(WarningLevel(-3).clamped(), 0);
        assert_eq!(WarningLevel(0).clamped(), 0);
        assert_eq!(WarningLevel(4).clamped(), 4);
        assert_eq!(WarningLevel(42).clamped(), 5);
    }

    #[test]
    fn test_inactive_defines_are_dropped() {
        let opts = BuildOptions {
            defines: vec![
                DefineOp::define("A"),
                DefineOp::define("B").when(false),
                DefineOp::undefine("C"),
            ],
            ..Default::default()
        };
        let names: Vec<_> = opts.active_defines().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_validate_rejects_bad_macro_names() {
        let opts = BuildOptions {
            defines: vec![DefineOp::define("")],
            ..Default::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::EmptyDefineName));

        let opts = BuildOptions {
            defines: vec![DefineOp::define("A B")],
            ..Default::default()
        };
        assert_eq!(
            opts.validate(),
            Err(ConfigError::InvalidDefineName("A B".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_undefine_with_value() {
        let mut op = DefineOp::undefine("NDEBUG");
        op.value = Some("1".to_string());
        let opts = BuildOptions {
            defines: vec![op],
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::UndefineWithValue(_))
        ));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(BuildOptions::default().validate().is_ok());
    }
}

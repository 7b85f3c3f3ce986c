//! The capability model: what kind of artifact a target links into.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of artifact produced by the link phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Executable binary
    #[default]
    #[serde(alias = "exe", alias = "bin")]
    Executable,

    /// Shared/dynamic library (.so / .dylib / .dll)
    #[serde(alias = "shared-library", alias = "dylib")]
    Shared,

    /// Static library (.a / .lib)
    #[serde(alias = "static-library", alias = "staticlib")]
    Static,

    /// Dynamically loaded module; on Darwin this is a bundle rather than a
    /// dylib
    #[serde(alias = "plugin-module", alias = "module")]
    Plugin,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputKind::Executable => "executable",
            OutputKind::Shared => "shared library",
            OutputKind::Static => "static library",
            OutputKind::Plugin => "plugin module",
        };
        f.write_str(name)
    }
}

/// Windows-style subsystem of the produced binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    #[default]
    Console,
    Gui,
}

/// How the language runtime is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeLinkage {
    #[default]
    Dynamic,
    Static,
}

/// Desired link output of a target.
///
/// Built once per target and passed by value to every synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CapabilityModel {
    pub output: OutputKind,
    pub subsystem: Subsystem,
    pub runtime: RuntimeLinkage,
}

impl CapabilityModel {
    pub fn new(output: OutputKind) -> Self {
        CapabilityModel {
            output,
            ..Default::default()
        }
    }

    pub fn executable() -> Self {
        Self::new(OutputKind::Executable)
    }

    pub fn shared_library() -> Self {
        Self::new(OutputKind::Shared)
    }

    pub fn static_library() -> Self {
        Self::new(OutputKind::Static)
    }

    pub fn plugin() -> Self {
        Self::new(OutputKind::Plugin)
    }

    pub fn with_subsystem(mut self, subsystem: Subsystem) -> Self {
        self.subsystem = subsystem;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeLinkage) -> Self {
        self.runtime = runtime;
        self
    }

    /// True for shared libraries and plugin modules. Both need
    /// position-independent code.
    pub fn is_shared_object(&self) -> bool {
        matches!(self.output, OutputKind::Shared | OutputKind::Plugin)
    }

    pub fn is_static_library(&self) -> bool {
        self.output == OutputKind::Static
    }

    pub fn is_gui(&self) -> bool {
        self.subsystem == Subsystem::Gui
    }

    pub fn is_static_runtime(&self) -> bool {
        self.runtime == RuntimeLinkage::Static
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_is_shared_object() {
        assert!(CapabilityModel::plugin().is_shared_object());
        assert!(CapabilityModel::shared_library().is_shared_object());
        assert!(!CapabilityModel::executable().is_shared_object());
        assert!(!CapabilityModel::static_library().is_shared_object());
    }

    #[test]
    fn test_output_kind_aliases() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: OutputKind,
        }
        let parsed: Wrapper = toml::from_str("kind = \"exe\"").unwrap();
        assert_eq!(parsed.kind, OutputKind::Executable);
        let parsed: Wrapper = toml::from_str("kind = \"staticlib\"").unwrap();
        assert_eq!(parsed.kind, OutputKind::Static);
        let parsed: Wrapper = toml::from_str("kind = \"plugin\"").unwrap();
        assert_eq!(parsed.kind, OutputKind::Plugin);
    }
}

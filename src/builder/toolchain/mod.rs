//! Toolchain abstraction for native compilers and linkers.
//!
//! Every supported compiler family is described by static tables rather
//! than by code paths: a [`ProcessorDescriptor`] per compiler variant and a
//! [`LinkerDescriptor`] per link variant. Each descriptor carries a strategy
//! table of plain functions. Vendors start from the GCC-compatible defaults
//! and override only what differs, using struct update syntax.
//!
//! Toolchain detection priority:
//! 1. Toolchain config file (`.keel/toolchain.toml` or `~/.keel/toolchain.toml`)
//! 2. Environment variables (CC, CXX, FC, AR)
//! 3. Auto-detection (searching PATH for common compilers)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::capability::{CapabilityModel, OutputKind};
use crate::core::options::{BuildOptions, LibraryType};
use crate::core::source::Language;
use crate::util::process::ProcessBuilder;

mod arm;
mod borland;
mod decorate;
mod detect;
mod gcc;
mod intel;
mod msvc;
mod naming;
mod probe;
mod registry;
mod sun;
mod xlc;

pub use decorate::{expand_library_sets, locate_library, Forwarding, LibraryStyle};
pub use detect::{detect_toolchain, detect_vendor_from_identity, toolchain_for_vendor};
pub use naming::{LibraryVersion, OutputNames, OutputNaming, Versioning};
pub use probe::{gcc_library_path, parse_specs, ProbeCache, ProbeKind, ProbeOutcome};
pub use registry::{Classification, ProcessorRegistry};

/// Bid placed on a file whose extension the processor compiles.
pub const SOURCE_BID: u32 = 100;
/// Bid placed on a header the processor understands but never compiles.
pub const HEADER_BID: u32 = 1;
/// No interest in the file.
pub const NO_BID: u32 = 0;

/// Compiler vendor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorKind {
    Gcc,
    Clang,
    Intel,
    Msvc,
    Borland,
    #[serde(rename = "sun", alias = "suncc")]
    SunCc,
    #[serde(rename = "xlc")]
    XlC,
    Arm,
}

impl VendorKind {
    pub const ALL: [VendorKind; 8] = [
        VendorKind::Gcc,
        VendorKind::Clang,
        VendorKind::Intel,
        VendorKind::Msvc,
        VendorKind::Borland,
        VendorKind::SunCc,
        VendorKind::XlC,
        VendorKind::Arm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorKind::Gcc => "gcc",
            VendorKind::Clang => "clang",
            VendorKind::Intel => "intel",
            VendorKind::Msvc => "msvc",
            VendorKind::Borland => "borland",
            VendorKind::SunCc => "sun",
            VendorKind::XlC => "xlc",
            VendorKind::Arm => "arm",
        }
    }

    /// Compiler descriptors for this vendor, in registration order.
    pub fn processors(&self) -> &'static [ProcessorDescriptor] {
        match self {
            VendorKind::Gcc => gcc::GCC_PROCESSORS,
            VendorKind::Clang => gcc::CLANG_PROCESSORS,
            VendorKind::Intel => intel::PROCESSORS,
            VendorKind::Msvc => msvc::PROCESSORS,
            VendorKind::Borland => borland::PROCESSORS,
            VendorKind::SunCc => sun::PROCESSORS,
            VendorKind::XlC => xlc::PROCESSORS,
            VendorKind::Arm => arm::PROCESSORS,
        }
    }

    /// Linker descriptors for this vendor.
    pub fn linkers(&self) -> &'static [LinkerDescriptor] {
        match self {
            VendorKind::Gcc => gcc::GCC_LINKERS,
            VendorKind::Clang => gcc::CLANG_LINKERS,
            VendorKind::Intel => intel::LINKERS,
            VendorKind::Msvc => msvc::LINKERS,
            VendorKind::Borland => borland::LINKERS,
            VendorKind::SunCc => sun::LINKERS,
            VendorKind::XlC => xlc::LINKERS,
            VendorKind::Arm => arm::LINKERS,
        }
    }
}

impl fmt::Display for VendorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VendorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        VendorKind::ALL
            .into_iter()
            .find(|v| v.as_str() == lower)
            .or(match lower.as_str() {
                "suncc" => Some(VendorKind::SunCc),
                "icc" => Some(VendorKind::Intel),
                "cl" => Some(VendorKind::Msvc),
                "bcc" | "bcc32" => Some(VendorKind::Borland),
                _ => None,
            })
            .ok_or_else(|| {
                let names: Vec<_> = VendorKind::ALL.iter().map(|v| v.as_str()).collect();
                format!("unknown vendor `{s}`, expected one of: {}", names.join(", "))
            })
    }
}

/// Operating system the output is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Linux,
    #[serde(alias = "macos")]
    Darwin,
    Windows,
    Solaris,
    Aix,
    #[serde(rename = "hpux")]
    HpUx,
    Other,
}

impl TargetPlatform {
    /// The platform this binary was built for.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "linux" | "android" => TargetPlatform::Linux,
            "macos" | "ios" => TargetPlatform::Darwin,
            "windows" => TargetPlatform::Windows,
            "solaris" | "illumos" => TargetPlatform::Solaris,
            "aix" => TargetPlatform::Aix,
            _ => TargetPlatform::Other,
        }
    }

    /// Guess the platform from a target triple such as the output of
    /// `gcc -dumpmachine`.
    pub fn from_triple(triple: &str) -> Self {
        let t = triple.to_ascii_lowercase();
        if t.contains("linux") {
            TargetPlatform::Linux
        } else if t.contains("darwin") || t.contains("apple") {
            TargetPlatform::Darwin
        } else if t.contains("mingw") || t.contains("windows") || t.contains("cygwin") {
            TargetPlatform::Windows
        } else if t.contains("solaris") || t.contains("sunos") {
            TargetPlatform::Solaris
        } else if t.contains("aix") {
            TargetPlatform::Aix
        } else if t.contains("hpux") {
            TargetPlatform::HpUx
        } else {
            TargetPlatform::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::Linux => "linux",
            TargetPlatform::Darwin => "darwin",
            TargetPlatform::Windows => "windows",
            TargetPlatform::Solaris => "solaris",
            TargetPlatform::Aix => "aix",
            TargetPlatform::HpUx => "hpux",
            TargetPlatform::Other => "other",
        }
    }

    pub fn is_windows(&self) -> bool {
        *self == TargetPlatform::Windows
    }

    pub fn is_darwin(&self) -> bool {
        *self == TargetPlatform::Darwin
    }

    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(TargetPlatform::Linux),
            "darwin" | "macos" => Ok(TargetPlatform::Darwin),
            "windows" => Ok(TargetPlatform::Windows),
            "solaris" => Ok(TargetPlatform::Solaris),
            "aix" => Ok(TargetPlatform::Aix),
            "hpux" => Ok(TargetPlatform::HpUx),
            "other" => Ok(TargetPlatform::Other),
            _ => Err(format!(
                "unknown platform `{s}`, expected one of: linux, darwin, windows, solaris, aix, hpux, other"
            )),
        }
    }
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc", "cl.exe")
    pub program: PathBuf,
    /// Command arguments, exactly as synthesized
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Full command line as a shell would see it.
    pub fn display(&self) -> String {
        let mut parts = vec![quote_path(&self.program)];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Convert to a process for direct execution.
    ///
    /// Arguments go straight into argv, so the quotes added around paths
    /// containing whitespace are removed again here.
    pub fn to_process_builder(&self) -> ProcessBuilder {
        let mut pb = ProcessBuilder::new(&self.program).args(self.args.iter().map(|a| unquote(a)));
        for (key, value) in &self.env {
            pb = pb.env(key, value);
        }
        pb
    }
}

/// Quote a path for a command line if it contains whitespace.
pub fn quote_path(path: &Path) -> String {
    let text = path.display().to_string();
    if text.contains(char::is_whitespace) {
        format!("\"{text}\"")
    } else {
        text
    }
}

/// Undo [`quote_path`] inside an argument such as `-I"My Headers"`.
fn unquote(arg: &str) -> String {
    let Some(open) = arg.find('"') else {
        return arg.to_string();
    };
    let inner = &arg[open + 1..];
    match inner.strip_suffix('"') {
        Some(body) if body.contains(char::is_whitespace) && !body.contains('"') => {
            format!("{}{}", &arg[..open], body)
        }
        _ => arg.to_string(),
    }
}

/// Everything a compiler strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    pub capability: CapabilityModel,
    pub options: &'a BuildOptions,
    pub platform: TargetPlatform,
    pub language: Language,
}

/// How a vendor spells preprocessor definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefineStyle {
    pub define: &'static str,
    pub undefine: &'static str,
    /// Switch and `name=value` are separate arguments
    pub separate: bool,
}

/// Per-vendor compile rules.
#[derive(Clone, Copy)]
pub struct CompilerStrategy {
    /// Arguments implied by the capability model and options, in order
    pub implied_args: fn(&CompileContext<'_>) -> Vec<String>,
    /// Defined warning levels, ascending
    pub warnings: &'static [(u8, &'static [&'static str])],
    pub define_style: DefineStyle,
    pub include_switch: &'static str,
    /// Arguments naming the object file
    pub output_args: fn(&Path) -> Vec<String>,
}

impl fmt::Debug for CompilerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerStrategy")
            .field("define_style", &self.define_style)
            .field("include_switch", &self.include_switch)
            .finish_non_exhaustive()
    }
}

/// One compiler variant of a vendor.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorDescriptor {
    pub vendor: VendorKind,
    pub variant: &'static str,
    /// Default program name, overridable by configuration
    pub program: &'static str,
    pub language: Language,
    pub source_extensions: &'static [&'static str],
    pub header_extensions: &'static [&'static str],
    pub object_suffix: &'static str,
    /// Arguments whose output identifies the compiler
    pub probe_args: &'static [&'static str],
    pub strategy: CompilerStrategy,
}

impl ProcessorDescriptor {
    /// How interested this processor is in a file with extension `ext`.
    pub fn bid(&self, ext: &str) -> u32 {
        let ext = ext.to_ascii_lowercase();
        if self.source_extensions.contains(&ext.as_str()) {
            SOURCE_BID
        } else if self.header_extensions.contains(&ext.as_str()) {
            HEADER_BID
        } else {
            NO_BID
        }
    }
}

/// Link phase variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkerVariant {
    Executable,
    Shared,
    /// Dynamically loaded module (a bundle on Darwin)
    Plugin,
    /// Static library archiver
    Librarian,
}

impl LinkerVariant {
    pub fn for_output(output: OutputKind) -> Self {
        match output {
            OutputKind::Static => LinkerVariant::Librarian,
            OutputKind::Plugin => LinkerVariant::Plugin,
            OutputKind::Shared => LinkerVariant::Shared,
            OutputKind::Executable => LinkerVariant::Executable,
        }
    }
}

/// Everything a linker strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    pub capability: CapabilityModel,
    pub options: &'a BuildOptions,
    pub platform: TargetPlatform,
    pub output: &'a Path,
    pub names: &'a OutputNames,
    pub version: Option<&'a LibraryVersion>,
}

/// Per-vendor link rules.
#[derive(Clone, Copy)]
pub struct LinkerStrategy {
    pub implied_args: fn(&LinkContext<'_>) -> Vec<String>,
    pub output_args: fn(&Path) -> Vec<String>,
    pub forwarding: Forwarding,
    pub libraries: LibraryStyle,
    /// Prepended to each object argument (`+` for tlib)
    pub object_prefix: &'static str,
    /// Candidate file names for a library reference
    pub library_patterns: fn(&str, LibraryType, TargetPlatform) -> Vec<String>,
}

impl fmt::Debug for LinkerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkerStrategy")
            .field("forwarding", &self.forwarding)
            .field("object_prefix", &self.object_prefix)
            .finish_non_exhaustive()
    }
}

/// One link variant of a vendor.
#[derive(Debug, Clone, Copy)]
pub struct LinkerDescriptor {
    pub vendor: VendorKind,
    pub variant: LinkerVariant,
    pub program: &'static str,
    /// Driver used when any object came from C++
    pub cxx_program: &'static str,
    /// Driver used when any object came from Fortran
    pub fortran_program: &'static str,
    /// Prebuilt inputs the linker consumes directly
    pub object_extensions: &'static [&'static str],
    /// Link by-products that are accepted and ignored
    pub discard_extensions: &'static [&'static str],
    pub naming: fn(TargetPlatform) -> OutputNaming,
    pub strategy: LinkerStrategy,
}

impl LinkerDescriptor {
    pub fn bid(&self, ext: &str) -> u32 {
        let ext = ext.to_ascii_lowercase();
        if self.object_extensions.contains(&ext.as_str()) {
            SOURCE_BID
        } else if self.discard_extensions.contains(&ext.as_str()) {
            HEADER_BID
        } else {
            NO_BID
        }
    }

    /// Driver program for a link whose objects came from `languages`.
    pub fn program_for(&self, languages: &[Language]) -> &'static str {
        if languages.contains(&Language::Fortran) {
            self.fortran_program
        } else if languages.contains(&Language::Cxx) {
            self.cxx_program
        } else {
            self.program
        }
    }

    pub fn output_names(
        &self,
        platform: TargetPlatform,
        base: &str,
        version: Option<&LibraryVersion>,
    ) -> OutputNames {
        (self.naming)(platform).names(base, version)
    }

    /// Candidate file names for library `name` of type `kind`.
    pub fn library_patterns(
        &self,
        name: &str,
        kind: LibraryType,
        platform: TargetPlatform,
    ) -> Vec<String> {
        (self.strategy.library_patterns)(name, kind, platform)
    }
}

/// Pick the link variant for an output kind.
///
/// Static libraries go to the librarian, plugins to the dynamic-module
/// variant, shared libraries to the shared variant and everything else to
/// the executable linker. A vendor without the requested variant falls back
/// to its executable linker; what it cannot express is omitted.
pub fn select_linker(
    vendor: VendorKind,
    capability: &CapabilityModel,
) -> &'static LinkerDescriptor {
    let wanted = LinkerVariant::for_output(capability.output);
    let linkers = vendor.linkers();
    linkers
        .iter()
        .find(|l| l.variant == wanted)
        .or_else(|| {
            tracing::debug!("{} has no {:?} linker, using its executable linker", vendor, wanted);
            linkers.iter().find(|l| l.variant == LinkerVariant::Executable)
        })
        .unwrap_or(&linkers[0])
}

/// Program overrides from configuration or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramOverrides {
    pub cc: Option<PathBuf>,
    pub cxx: Option<PathBuf>,
    pub fc: Option<PathBuf>,
    pub ar: Option<PathBuf>,
}

/// A resolved toolchain: vendor, target platform, the processor registry
/// and the concrete programs to run.
#[derive(Debug)]
pub struct Toolchain {
    pub vendor: VendorKind,
    pub platform: TargetPlatform,
    pub registry: ProcessorRegistry,
    pub programs: ProgramOverrides,
    /// Extra compiler flags from configuration
    pub cflags: Vec<String>,
    /// Extra linker flags from configuration
    pub ldflags: Vec<String>,
}

impl Toolchain {
    pub fn new(vendor: VendorKind, platform: TargetPlatform) -> Self {
        Toolchain {
            vendor,
            platform,
            registry: ProcessorRegistry::for_vendor(vendor),
            programs: ProgramOverrides::default(),
            cflags: Vec::new(),
            ldflags: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: ProcessorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_programs(mut self, programs: ProgramOverrides) -> Self {
        self.programs = programs;
        self
    }

    /// Program that runs a processor, honoring overrides.
    pub fn compiler_program(&self, processor: &ProcessorDescriptor) -> PathBuf {
        let overridden = match processor.language {
            Language::C => &self.programs.cc,
            Language::Cxx => &self.programs.cxx,
            Language::Fortran => &self.programs.fc,
        };
        overridden
            .clone()
            .unwrap_or_else(|| PathBuf::from(processor.program))
    }

    /// Program that runs a linker for objects from `languages`.
    pub fn linker_program(&self, linker: &LinkerDescriptor, languages: &[Language]) -> PathBuf {
        if linker.variant == LinkerVariant::Librarian {
            if let Some(ar) = &self.programs.ar {
                return ar.clone();
            }
            return PathBuf::from(linker.program);
        }

        // Driver-style linkers follow the compiler override.
        let default = linker.program_for(languages);
        let driver_override = if languages.contains(&Language::Fortran) {
            &self.programs.fc
        } else if languages.contains(&Language::Cxx) {
            &self.programs.cxx
        } else {
            &self.programs.cc
        };
        let is_driver = self
            .vendor
            .processors()
            .iter()
            .any(|p| p.program == default);
        match driver_override {
            Some(program) if is_driver => program.clone(),
            _ => PathBuf::from(default),
        }
    }

    pub fn linker(&self, capability: &CapabilityModel) -> &'static LinkerDescriptor {
        select_linker(self.vendor, capability)
    }
}

/// Append `switch` and `value` either fused or as two arguments.
pub(crate) fn switch_arg(out: &mut Vec<String>, switch: &str, value: &str, separate: bool) {
    if separate {
        out.push(switch.to_string());
        out.push(value.to_string());
    } else {
        out.push(format!("{switch}{value}"));
    }
}

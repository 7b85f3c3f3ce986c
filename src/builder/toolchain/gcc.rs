//! GCC and Clang descriptors.
//!
//! The GCC-compatible strategies defined here are the defaults other
//! vendors override.

use std::path::Path;

use crate::core::capability::OutputKind;
use crate::core::options::{LibraryType, Optimization};
use crate::core::source::Language;

use super::{
    quote_path, CompileContext, CompilerStrategy, DefineStyle, Forwarding, LibraryStyle,
    LinkContext, LinkerDescriptor, LinkerStrategy, LinkerVariant, OutputNaming,
    ProcessorDescriptor, TargetPlatform, VendorKind, Versioning,
};

pub(super) const C_SOURCES: &[&str] = &["c", "m"];
pub(super) const CXX_SOURCES: &[&str] = &["cc", "cpp", "cxx", "c++", "cp", "mm"];
pub(super) const FORTRAN_SOURCES: &[&str] = &[
    "f", "for", "ftn", "fpp", "f77", "f90", "f95", "f03", "f08",
];
pub(super) const C_HEADERS: &[&str] = &["h"];
pub(super) const CXX_HEADERS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl", "ipp", "tcc"];
pub(super) const FORTRAN_HEADERS: &[&str] = &["inc", "fi", "fh"];

const OBJECT_INPUTS: &[&str] = &["o", "obj", "a", "so", "dylib", "tbd", "sl", "dll"];
const ARCHIVE_INPUTS: &[&str] = &["o", "obj"];
pub(super) const LINK_BYPRODUCTS: &[&str] = &["map", "exp", "def", "lst", "ilk", "pdb"];

const GCC_WARNINGS: &[(u8, &[&str])] = &[
    (0, &["-w"]),
    (1, &[]),
    (2, &[]),
    (3, &["-Wall"]),
    (4, &["-Wall", "-Wextra"]),
    (5, &["-Wall", "-Wextra", "-Werror"]),
];

/// `-Dname=value`, `-Uname`
pub(super) const DASH_DEFINES: DefineStyle = DefineStyle {
    define: "-D",
    undefine: "-U",
    separate: false,
};

pub(super) fn dash_output(path: &Path) -> Vec<String> {
    vec!["-o".to_string(), quote_path(path)]
}

fn optimization_flag(opt: Optimization) -> &'static str {
    match opt {
        Optimization::Size => "-Os",
        Optimization::Speed => "-O2",
        Optimization::Full | Optimization::Extreme => "-O3",
    }
}

/// Debug or optimization arguments shared by driver-style compilers.
pub(super) fn debug_or_optimize(ctx: &CompileContext<'_>, args: &mut Vec<String>) {
    if ctx.options.debug {
        args.push("-g".to_string());
    } else if let Some(opt) = ctx.options.optimization {
        args.push(optimization_flag(opt).to_string());
        if opt == Optimization::Extreme {
            args.push("-funroll-loops".to_string());
        }
    }
}

fn compile_implied(ctx: &CompileContext<'_>) -> Vec<String> {
    let mut args = vec!["-c".to_string()];
    debug_or_optimize(ctx, &mut args);

    let windows = ctx.platform.is_windows();
    if ctx.capability.is_shared_object() && !windows {
        args.push("-fPIC".to_string());
    }
    if windows {
        let subsystem = if ctx.capability.is_gui() { "-mwindows" } else { "-mconsole" };
        args.push(subsystem.to_string());
    }

    if ctx.language == Language::Cxx {
        match ctx.options.rtti {
            Some(true) => args.push("-frtti".to_string()),
            Some(false) => args.push("-fno-rtti".to_string()),
            None => {}
        }
        if !ctx.options.exceptions {
            args.push("-fno-exceptions".to_string());
        }
    }

    if ctx.options.multithreaded && !windows && !ctx.platform.is_darwin() {
        args.push("-pthread".to_string());
    }
    args
}

pub(super) const GCC_COMPAT: CompilerStrategy = CompilerStrategy {
    implied_args: compile_implied,
    warnings: GCC_WARNINGS,
    define_style: DASH_DEFINES,
    include_switch: "-I",
    output_args: dash_output,
};

pub(super) const GCC_PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::Gcc,
        variant: "gcc",
        program: "gcc",
        language: Language::C,
        source_extensions: C_SOURCES,
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["--version"],
        strategy: GCC_COMPAT,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Gcc,
        variant: "g++",
        program: "g++",
        language: Language::Cxx,
        source_extensions: CXX_SOURCES,
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["--version"],
        strategy: GCC_COMPAT,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Gcc,
        variant: "gfortran",
        program: "gfortran",
        language: Language::Fortran,
        source_extensions: FORTRAN_SOURCES,
        header_extensions: FORTRAN_HEADERS,
        object_suffix: ".o",
        probe_args: &["--version"],
        strategy: GCC_COMPAT,
    },
];

pub(super) const CLANG_PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::Clang,
        variant: "clang",
        program: "clang",
        language: Language::C,
        source_extensions: C_SOURCES,
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["--version"],
        strategy: GCC_COMPAT,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Clang,
        variant: "clang++",
        program: "clang++",
        language: Language::Cxx,
        source_extensions: CXX_SOURCES,
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["--version"],
        strategy: GCC_COMPAT,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Clang,
        variant: "flang",
        program: "flang",
        language: Language::Fortran,
        source_extensions: FORTRAN_SOURCES,
        header_extensions: FORTRAN_HEADERS,
        object_suffix: ".o",
        probe_args: &["--version"],
        strategy: GCC_COMPAT,
    },
];

/// Options the GCC driver consumes itself even though their second
/// character is not in the pass-through set.
const GCC_DRIVER_OPTIONS: &[&str] = &[
    "-bundle",
    "-dylib",
    "-dynamic",
    "-dynamiclib",
    "-nostartfiles",
    "-nostdlib",
    "-prebind",
    "-s",
    "-static",
    "-shared",
    "-symbolic",
    "-Xlinker",
    "--export-all-symbols",
    "-static-libgcc",
    "-pthread",
    "-rdynamic",
    "-pie",
];

pub(super) const GCC_FORWARDING: Forwarding = Forwarding::Driver {
    prefix: "-Wl,",
    passthrough: "gfFmOWlLuv",
    known: GCC_DRIVER_OPTIONS,
    strip_dash: false,
};

pub(super) fn dash_l(name: &str) -> String {
    format!("-l{name}")
}

pub(super) const GCC_LIBRARIES: LibraryStyle = LibraryStyle {
    dir_switch: "-L",
    name: dash_l,
    mode_switches: Some(("-Bstatic", "-Bdynamic")),
    frameworks: true,
};

/// `lib<name>.<ext>` candidates for Unix-style linkers.
pub(super) fn unix_library_patterns(
    name: &str,
    kind: LibraryType,
    platform: TargetPlatform,
) -> Vec<String> {
    let shared: Vec<String> = match platform {
        TargetPlatform::Darwin => vec![format!("lib{name}.dylib"), format!("lib{name}.tbd")],
        TargetPlatform::Windows => vec![
            format!("lib{name}.dll.a"),
            format!("{name}.dll"),
            format!("lib{name}.dll"),
        ],
        TargetPlatform::HpUx => vec![format!("lib{name}.sl")],
        _ => vec![format!("lib{name}.so")],
    };
    let archive: Vec<String> = if platform.is_windows() {
        vec![format!("lib{name}.a"), format!("{name}.lib")]
    } else {
        vec![format!("lib{name}.a")]
    };

    match kind {
        LibraryType::Static => archive,
        LibraryType::Shared => shared,
        LibraryType::Framework if platform.is_darwin() => vec![format!("{name}.framework")],
        LibraryType::Framework => shared,
        LibraryType::Unspecified => shared.into_iter().chain(archive).collect(),
    }
}

/// Link arguments of a GCC-compatible driver.
pub(super) fn link_implied(ctx: &LinkContext<'_>) -> Vec<String> {
    let mut args = Vec::new();
    if ctx.options.debug {
        args.push("-g".to_string());
    }

    let darwin = ctx.platform.is_darwin();
    match ctx.capability.output {
        OutputKind::Shared if darwin => args.push("-dynamiclib".to_string()),
        OutputKind::Plugin if darwin => args.push("-bundle".to_string()),
        OutputKind::Shared | OutputKind::Plugin => args.push("-shared".to_string()),
        OutputKind::Executable | OutputKind::Static => {}
    }

    if ctx.capability.is_static_runtime() {
        if ctx.capability.is_shared_object() {
            args.push("-static-libgcc".to_string());
        } else {
            args.push("-static".to_string());
        }
    }

    if let Some(soname) = &ctx.names.soname {
        args.push(format!("-Wl,-soname,{soname}"));
    }
    if darwin && ctx.capability.output == OutputKind::Shared {
        if let Some(version) = ctx.version {
            args.push(format!("-Wl,-current_version,{version}"));
        }
    }

    if ctx.platform.is_windows() {
        let subsystem = if ctx.capability.is_gui() { "-mwindows" } else { "-mconsole" };
        args.push(subsystem.to_string());
    } else if ctx.options.multithreaded && !darwin {
        args.push("-pthread".to_string());
    }
    args
}

fn archive_implied(_ctx: &LinkContext<'_>) -> Vec<String> {
    vec!["rcs".to_string()]
}

fn bare_output(path: &Path) -> Vec<String> {
    vec![quote_path(path)]
}

fn exe_naming(platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("", platform.exe_suffix())
}

fn shared_naming(platform: TargetPlatform) -> OutputNaming {
    match platform {
        TargetPlatform::Darwin => OutputNaming::new("lib", ".dylib").versioned(Versioning::Darwin),
        TargetPlatform::Windows => OutputNaming::new("lib", ".dll"),
        TargetPlatform::HpUx => OutputNaming::new("lib", ".sl"),
        _ => OutputNaming::new("lib", ".so").versioned(Versioning::Elf),
    }
}

fn plugin_naming(platform: TargetPlatform) -> OutputNaming {
    match platform {
        TargetPlatform::Darwin => OutputNaming::new("lib", ".bundle"),
        TargetPlatform::Windows => OutputNaming::new("lib", ".dll"),
        TargetPlatform::HpUx => OutputNaming::new("lib", ".sl"),
        _ => OutputNaming::new("lib", ".so"),
    }
}

pub(super) fn archive_naming(_platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("lib", ".a")
}

pub(super) const DRIVER_LINK: LinkerStrategy = LinkerStrategy {
    implied_args: link_implied,
    output_args: dash_output,
    forwarding: GCC_FORWARDING,
    libraries: GCC_LIBRARIES,
    object_prefix: "",
    library_patterns: unix_library_patterns,
};

pub(super) const AR_LINK: LinkerStrategy = LinkerStrategy {
    implied_args: archive_implied,
    output_args: bare_output,
    forwarding: Forwarding::Direct,
    ..DRIVER_LINK
};

/// Executable, shared, plugin and archive linkers of a driver-style
/// vendor.
pub(super) const fn driver_linkers(
    vendor: VendorKind,
    drivers: [&'static str; 3],
    ar: &'static str,
    link: LinkerStrategy,
) -> [LinkerDescriptor; 4] {
    let [cc, cxx, fc] = drivers;
    let exe = LinkerDescriptor {
        vendor,
        variant: LinkerVariant::Executable,
        program: cc,
        cxx_program: cxx,
        fortran_program: fc,
        object_extensions: OBJECT_INPUTS,
        discard_extensions: LINK_BYPRODUCTS,
        naming: exe_naming,
        strategy: link,
    };
    [
        exe,
        LinkerDescriptor {
            variant: LinkerVariant::Shared,
            naming: shared_naming,
            ..exe
        },
        LinkerDescriptor {
            variant: LinkerVariant::Plugin,
            naming: plugin_naming,
            ..exe
        },
        LinkerDescriptor {
            variant: LinkerVariant::Librarian,
            program: ar,
            cxx_program: ar,
            fortran_program: ar,
            object_extensions: ARCHIVE_INPUTS,
            naming: archive_naming,
            strategy: AR_LINK,
            ..exe
        },
    ]
}

const GCC_LINKER_TABLE: [LinkerDescriptor; 4] =
    driver_linkers(VendorKind::Gcc, ["gcc", "g++", "gfortran"], "ar", DRIVER_LINK);
const CLANG_LINKER_TABLE: [LinkerDescriptor; 4] =
    driver_linkers(VendorKind::Clang, ["clang", "clang++", "flang"], "ar", DRIVER_LINK);

pub(super) const GCC_LINKERS: &[LinkerDescriptor] = &GCC_LINKER_TABLE;
pub(super) const CLANG_LINKERS: &[LinkerDescriptor] = &CLANG_LINKER_TABLE;

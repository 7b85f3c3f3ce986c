//! ARM RealView compilers: `armcc`/`armcpp` for 32-bit ARM code and
//! `tcc`/`tcpp` for 16-bit Thumb code.
//!
//! armlink cannot build shared libraries; requests for one fall back to a
//! plain image link.

use std::path::Path;

use crate::core::options::{LibraryType, Optimization};
use crate::core::source::Language;

use super::gcc::{CXX_HEADERS, C_HEADERS, LINK_BYPRODUCTS};
use super::{
    quote_path, CompileContext, CompilerStrategy, DefineStyle, Forwarding, LibraryStyle,
    LinkContext, LinkerDescriptor, LinkerStrategy, LinkerVariant, OutputNaming,
    ProcessorDescriptor, TargetPlatform, VendorKind,
};

const ARM_WARNINGS: &[(u8, &[&str])] = &[(0, &["-W"]), (1, &[]), (5, &["--diag_error=warning"])];

fn compile_implied(ctx: &CompileContext<'_>) -> Vec<String> {
    let mut args = vec!["-c".to_string()];
    if ctx.options.debug {
        args.push("-g".to_string());
        args.push("-O0".to_string());
    } else if let Some(opt) = ctx.options.optimization {
        let flags: &[&str] = match opt {
            Optimization::Size => &["-Ospace"],
            Optimization::Speed => &["-O2", "-Otime"],
            Optimization::Full | Optimization::Extreme => &["-O3", "-Otime"],
        };
        args.extend(flags.iter().map(|f| f.to_string()));
    }
    if ctx.language == Language::Cxx && !ctx.options.exceptions {
        args.push("--no_exceptions".to_string());
    }
    args
}

fn dash_output(path: &Path) -> Vec<String> {
    vec!["-o".to_string(), quote_path(path)]
}

const ARM_COMPILE: CompilerStrategy = CompilerStrategy {
    implied_args: compile_implied,
    warnings: ARM_WARNINGS,
    define_style: DefineStyle {
        define: "-D",
        undefine: "-U",
        separate: true,
    },
    include_switch: "-I",
    output_args: dash_output,
};

pub(super) const PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::Arm,
        variant: "arm32",
        program: "armcc",
        language: Language::C,
        source_extensions: &["c"],
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["--vsn"],
        strategy: ARM_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Arm,
        variant: "arm32",
        program: "armcpp",
        language: Language::Cxx,
        source_extensions: &["cc", "cpp", "cxx"],
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["--vsn"],
        strategy: ARM_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Arm,
        variant: "thumb",
        program: "tcc",
        language: Language::C,
        source_extensions: &["c"],
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["--vsn"],
        strategy: ARM_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Arm,
        variant: "thumb",
        program: "tcpp",
        language: Language::Cxx,
        source_extensions: &["cc", "cpp", "cxx"],
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["--vsn"],
        strategy: ARM_COMPILE,
    },
];

fn link_implied(ctx: &LinkContext<'_>) -> Vec<String> {
    if ctx.options.debug {
        vec!["--debug".to_string()]
    } else {
        Vec::new()
    }
}

fn armar_implied(_ctx: &LinkContext<'_>) -> Vec<String> {
    vec!["--create".to_string()]
}

fn bare_output(path: &Path) -> Vec<String> {
    vec![quote_path(path)]
}

fn library_name(name: &str) -> String {
    format!("{name}.a")
}

fn arm_library_patterns(name: &str, _kind: LibraryType, _platform: TargetPlatform) -> Vec<String> {
    vec![format!("{name}.a"), format!("{name}.lib")]
}

fn image_naming(_platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("", ".axf")
}

fn archive_naming(_platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("", ".a")
}

const LINK: LinkerStrategy = LinkerStrategy {
    implied_args: link_implied,
    output_args: dash_output,
    forwarding: Forwarding::Direct,
    libraries: LibraryStyle {
        dir_switch: "--libpath=",
        name: library_name,
        mode_switches: None,
        frameworks: false,
    },
    object_prefix: "",
    library_patterns: arm_library_patterns,
};

const EXE: LinkerDescriptor = LinkerDescriptor {
    vendor: VendorKind::Arm,
    variant: LinkerVariant::Executable,
    program: "armlink",
    cxx_program: "armlink",
    fortran_program: "armlink",
    object_extensions: &["o", "a", "lib"],
    discard_extensions: LINK_BYPRODUCTS,
    naming: image_naming,
    strategy: LINK,
};

pub(super) const LINKERS: &[LinkerDescriptor] = &[
    EXE,
    LinkerDescriptor {
        variant: LinkerVariant::Librarian,
        program: "armar",
        cxx_program: "armar",
        fortran_program: "armar",
        object_extensions: &["o"],
        naming: archive_naming,
        strategy: LinkerStrategy {
            implied_args: armar_implied,
            output_args: bare_output,
            ..LINK
        },
        ..EXE
    },
];

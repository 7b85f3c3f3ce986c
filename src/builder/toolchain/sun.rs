//! Sun/Oracle Studio compilers (cc, CC, f95).
//!
//! The Studio drivers understand `-B`, `-h`, `-z` and `-R` directly, so
//! linker options are never wrapped.

use crate::core::capability::OutputKind;
use crate::core::options::Optimization;
use crate::core::source::Language;

use super::gcc::{
    self, unix_library_patterns, CXX_HEADERS, CXX_SOURCES, C_HEADERS, C_SOURCES, DRIVER_LINK,
    FORTRAN_HEADERS, FORTRAN_SOURCES, GCC_COMPAT,
};
use super::{
    CompileContext, CompilerStrategy, Forwarding, LibraryStyle, LinkContext, LinkerDescriptor,
    LinkerStrategy, ProcessorDescriptor, VendorKind,
};

const SUN_WARNINGS: &[(u8, &[&str])] = &[(0, &["-w"]), (1, &[]), (5, &["-errwarn=%all"])];

fn compile_implied(ctx: &CompileContext<'_>) -> Vec<String> {
    let mut args = vec!["-c".to_string()];
    if ctx.options.debug {
        args.push("-g".to_string());
    } else if let Some(opt) = ctx.options.optimization {
        let flag = match opt {
            Optimization::Size => "-xspace",
            Optimization::Speed => "-xO3",
            Optimization::Full => "-xO4",
            Optimization::Extreme => "-fast",
        };
        args.push(flag.to_string());
    }
    if ctx.capability.is_shared_object() {
        args.push("-KPIC".to_string());
    }
    if ctx.options.multithreaded {
        args.push("-mt".to_string());
    }
    if ctx.language == Language::Cxx && !ctx.options.exceptions {
        args.push("-features=no%except".to_string());
    }
    args
}

const SUN_COMPILE: CompilerStrategy = CompilerStrategy {
    implied_args: compile_implied,
    warnings: SUN_WARNINGS,
    ..GCC_COMPAT
};

pub(super) const PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::SunCc,
        variant: "cc",
        program: "cc",
        language: Language::C,
        source_extensions: C_SOURCES,
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["-V"],
        strategy: SUN_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::SunCc,
        variant: "CC",
        program: "CC",
        language: Language::Cxx,
        source_extensions: CXX_SOURCES,
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["-V"],
        strategy: SUN_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::SunCc,
        variant: "f95",
        program: "f95",
        language: Language::Fortran,
        source_extensions: FORTRAN_SOURCES,
        header_extensions: FORTRAN_HEADERS,
        object_suffix: ".o",
        probe_args: &["-V"],
        strategy: SUN_COMPILE,
    },
];

fn link_implied(ctx: &LinkContext<'_>) -> Vec<String> {
    let mut args = Vec::new();
    if ctx.options.debug {
        args.push("-g".to_string());
    }
    if matches!(ctx.capability.output, OutputKind::Shared | OutputKind::Plugin) {
        args.push("-G".to_string());
    }
    if let Some(soname) = &ctx.names.soname {
        args.push("-h".to_string());
        args.push(soname.clone());
    }
    if ctx.options.multithreaded {
        args.push("-mt".to_string());
    }
    args
}

const SUN_LINK: LinkerStrategy = LinkerStrategy {
    implied_args: link_implied,
    forwarding: Forwarding::Direct,
    libraries: LibraryStyle {
        dir_switch: "-L",
        name: gcc::dash_l,
        mode_switches: Some(("-Bstatic", "-Bdynamic")),
        frameworks: false,
    },
    library_patterns: unix_library_patterns,
    ..DRIVER_LINK
};

const LINKER_TABLE: [LinkerDescriptor; 4] =
    gcc::driver_linkers(VendorKind::SunCc, ["cc", "CC", "f95"], "ar", SUN_LINK);

pub(super) const LINKERS: &[LinkerDescriptor] = &LINKER_TABLE;

//! Microsoft Visual C++ (cl.exe, link.exe, lib.exe).

use std::path::Path;

use crate::core::capability::OutputKind;
use crate::core::options::{LibraryType, Optimization};
use crate::core::source::Language;

use super::gcc::{CXX_HEADERS, CXX_SOURCES, C_HEADERS, C_SOURCES, LINK_BYPRODUCTS};
use super::{
    quote_path, CompileContext, CompilerStrategy, DefineStyle, Forwarding, LibraryStyle,
    LinkContext, LinkerDescriptor, LinkerStrategy, LinkerVariant, OutputNaming,
    ProcessorDescriptor, TargetPlatform, VendorKind,
};

const MSVC_WARNINGS: &[(u8, &[&str])] = &[
    (0, &["/W0"]),
    (1, &["/W1"]),
    (2, &["/W2"]),
    (3, &["/W3"]),
    (4, &["/W4"]),
    (5, &["/W4", "/WX"]),
];

fn runtime_flag(ctx: &CompileContext<'_>) -> &'static str {
    match (ctx.capability.is_static_runtime(), ctx.options.debug) {
        (true, true) => "/MTd",
        (true, false) => "/MT",
        (false, true) => "/MDd",
        (false, false) => "/MD",
    }
}

fn compile_implied(ctx: &CompileContext<'_>) -> Vec<String> {
    let mut args = vec!["/nologo".to_string(), "/c".to_string()];
    if ctx.language == Language::Cxx {
        if ctx.options.exceptions {
            args.push("/EHsc".to_string());
        }
        match ctx.options.rtti {
            Some(true) => args.push("/GR".to_string()),
            Some(false) => args.push("/GR-".to_string()),
            None => {}
        }
    }
    args.push(runtime_flag(ctx).to_string());

    if ctx.options.debug {
        args.push("/Zi".to_string());
        args.push("/Od".to_string());
    } else if let Some(opt) = ctx.options.optimization {
        let flag = match opt {
            Optimization::Size => "/O1",
            Optimization::Speed => "/O2",
            Optimization::Full => "/Ox",
            Optimization::Extreme => "/GL",
        };
        args.push(flag.to_string());
    }
    args
}

fn object_output(path: &Path) -> Vec<String> {
    vec![format!("/Fo{}", quote_path(path))]
}

const MSVC_COMPILE: CompilerStrategy = CompilerStrategy {
    implied_args: compile_implied,
    warnings: MSVC_WARNINGS,
    define_style: DefineStyle {
        define: "/D",
        undefine: "/U",
        separate: false,
    },
    include_switch: "/I",
    output_args: object_output,
};

pub(super) const PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::Msvc,
        variant: "cl",
        program: "cl",
        language: Language::C,
        source_extensions: C_SOURCES,
        header_extensions: C_HEADERS,
        object_suffix: ".obj",
        probe_args: &[],
        strategy: MSVC_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Msvc,
        variant: "cl",
        program: "cl",
        language: Language::Cxx,
        source_extensions: CXX_SOURCES,
        header_extensions: CXX_HEADERS,
        object_suffix: ".obj",
        probe_args: &[],
        strategy: MSVC_COMPILE,
    },
];

fn link_implied(ctx: &LinkContext<'_>) -> Vec<String> {
    let mut args = vec!["/NOLOGO".to_string()];
    if ctx.options.debug {
        args.push("/DEBUG".to_string());
    }
    match ctx.capability.output {
        OutputKind::Shared | OutputKind::Plugin => args.push("/DLL".to_string()),
        OutputKind::Executable => {
            let subsystem = if ctx.capability.is_gui() { "WINDOWS" } else { "CONSOLE" };
            args.push(format!("/SUBSYSTEM:{subsystem}"));
        }
        OutputKind::Static => {}
    }
    args
}

fn lib_implied(_ctx: &LinkContext<'_>) -> Vec<String> {
    vec!["/NOLOGO".to_string()]
}

fn out_switch(path: &Path) -> Vec<String> {
    vec![format!("/OUT:{}", quote_path(path))]
}

fn dot_lib(name: &str) -> String {
    format!("{name}.lib")
}

pub(super) fn windows_library_patterns(
    name: &str,
    _kind: LibraryType,
    _platform: TargetPlatform,
) -> Vec<String> {
    vec![format!("{name}.lib")]
}

fn exe_naming(_platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("", ".exe")
}

fn dll_naming(_platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("", ".dll")
}

fn lib_naming(_platform: TargetPlatform) -> OutputNaming {
    OutputNaming::new("", ".lib")
}

const LINK: LinkerStrategy = LinkerStrategy {
    implied_args: link_implied,
    output_args: out_switch,
    forwarding: Forwarding::Direct,
    libraries: LibraryStyle {
        dir_switch: "/LIBPATH:",
        name: dot_lib,
        mode_switches: None,
        frameworks: false,
    },
    object_prefix: "",
    library_patterns: windows_library_patterns,
};

const EXE: LinkerDescriptor = LinkerDescriptor {
    vendor: VendorKind::Msvc,
    variant: LinkerVariant::Executable,
    program: "link",
    cxx_program: "link",
    fortran_program: "link",
    object_extensions: &["obj", "lib", "res"],
    discard_extensions: LINK_BYPRODUCTS,
    naming: exe_naming,
    strategy: LINK,
};

pub(super) const LINKERS: &[LinkerDescriptor] = &[
    EXE,
    LinkerDescriptor {
        variant: LinkerVariant::Shared,
        naming: dll_naming,
        ..EXE
    },
    LinkerDescriptor {
        variant: LinkerVariant::Plugin,
        naming: dll_naming,
        ..EXE
    },
    LinkerDescriptor {
        variant: LinkerVariant::Librarian,
        program: "lib",
        cxx_program: "lib",
        fortran_program: "lib",
        object_extensions: &["obj"],
        naming: lib_naming,
        strategy: LinkerStrategy {
            implied_args: lib_implied,
            ..LINK
        },
        ..EXE
    },
];

//! Borland C++ (bcc32, tlib).
//!
//! bcc32 doubles as the link driver. Options meant for ilink32 are handed
//! over with `-l` and lose their own dash.

use std::path::Path;

use crate::core::capability::OutputKind;
use crate::core::options::Optimization;
use crate::core::source::Language;

use super::gcc::{CXX_HEADERS, C_HEADERS, DASH_DEFINES, GCC_COMPAT, LINK_BYPRODUCTS};
use super::msvc::windows_library_patterns;
use super::{
    quote_path, CompileContext, CompilerStrategy, Forwarding, LibraryStyle, LinkContext,
    LinkerDescriptor, LinkerStrategy, LinkerVariant, OutputNaming, ProcessorDescriptor,
    TargetPlatform, VendorKind,
};

const BORLAND_WARNINGS: &[(u8, &[&str])] = &[(0, &["-w-"]), (3, &["-w"]), (5, &["-w!"])];

fn compile_implied(ctx: &CompileContext<'_>) -> Vec<String> {
    let mut args = vec!["-c".to_string()];
    if ctx.capability.is_gui() {
        args.push("-tW".to_string());
    } else {
        args.push("-tWC".to_string());
    }
    if ctx.capability.is_shared_object() {
        args.push("-tWD".to_string());
    }
    if !ctx.capability.is_static_runtime() {
        args.push("-tWR".to_string());
    }
    if ctx.options.multithreaded {
        args.push("-tWM".to_string());
    }

    if ctx.options.debug {
        args.push("-v".to_string());
        args.push("-Od".to_string());
    } else if let Some(opt) = ctx.options.optimization {
        let flag = match opt {
            Optimization::Size => "-O1",
            Optimization::Speed | Optimization::Full | Optimization::Extreme => "-O2",
        };
        args.push(flag.to_string());
    }

    if ctx.language == Language::Cxx {
        if !ctx.options.exceptions {
            args.push("-x-".to_string());
        }
        if ctx.options.rtti == Some(false) {
            args.push("-RT-".to_string());
        }
    }
    args
}

fn object_output(path: &Path) -> Vec<String> {
    vec![format!("-o{}", quote_path(path))]
}

const BORLAND_COMPILE: CompilerStrategy = CompilerStrategy {
    implied_args: compile_implied,
    warnings: BORLAND_WARNINGS,
    define_style: DASH_DEFINES,
    output_args: object_output,
    ..GCC_COMPAT
};

pub(super) const PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::Borland,
        variant: "bcc32",
        program: "bcc32",
        language: Language::C,
        source_extensions: &["c"],
        header_extensions: C_HEADERS,
        object_suffix: ".obj",
        probe_args: &[],
        strategy: BORLAND_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Borland,
        variant: "bcc32",
        program: "bcc32",
        language: Language::Cxx,
        source_extensions: &["cpp", "cxx", "cc"],
        header_extensions: CXX_HEADERS,
        object_suffix: ".obj",
        probe_args: &[],
        strategy: BORLAND_COMPILE,
    },
];

fn link_implied(ctx: &LinkContext<'_>) -> Vec<String> {
    let mut args = Vec::new();
    if ctx.options.debug {
        args.push("-v".to_string());
    }
    match ctx.capability.output {
        OutputKind::Shared | OutputKind::Plugin => args.push("-tWD".to_string()),
        OutputKind::Executable if ctx.capability.is_gui() => args.push("-tW".to_string()),
        OutputKind::Executable => args.push("-tWC".to_string()),
        OutputKind::Static => {}
    }
    args
}

fn exe_output(path: &Path) -> Vec<String> {
    vec![format!("-e{}", quote_path(path))]
}

fn tlib_implied(_ctx: &LinkContext<'_>) -> Vec<String> {
    vec!["/C".to_string()]
}

fn tlib_output(path: &Path) -> Vec<String> {
    vec![quote_path(path)]
}

fn dot_lib(name: &str) -> String {
    format!("{name}.lib")
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
    output_args: exe_output,
    forwarding: Forwarding::Driver {
        prefix: "-l",
        passthrough: "",
        known: &["-v", "-tW", "-tWC", "-tWD", "-tWM", "-tWR"],
        strip_dash: true,
    },
    libraries: LibraryStyle {
        dir_switch: "-L",
        name: dot_lib,
        mode_switches: None,
        frameworks: false,
    },
    object_prefix: "",
    library_patterns: windows_library_patterns,
};

const EXE: LinkerDescriptor = LinkerDescriptor {
    vendor: VendorKind::Borland,
    variant: LinkerVariant::Executable,
    program: "bcc32",
    cxx_program: "bcc32",
    fortran_program: "bcc32",
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
        program: "tlib",
        cxx_program: "tlib",
        fortran_program: "tlib",
        object_extensions: &["obj"],
        naming: lib_naming,
        strategy: LinkerStrategy {
            implied_args: tlib_implied,
            output_args: tlib_output,
            forwarding: Forwarding::Direct,
            object_prefix: "+",
            ..LINK
        },
        ..EXE
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::select_linker;
    use crate::core::capability::CapabilityModel;

    #[test]
    fn test_linker_options_are_forwarded_without_dash() {
        let exe = select_linker(VendorKind::Borland, &CapabilityModel::executable());
        assert_eq!(exe.strategy.forwarding.decorate("-Gi"), "-lGi");
        assert_eq!(exe.strategy.forwarding.decorate("-tWD"), "-tWD");
        assert_eq!(exe.strategy.forwarding.decorate("import32.lib"), "import32.lib");
    }

    #[test]
    fn test_tlib_prefixes_objects() {
        let lib = select_linker(VendorKind::Borland, &CapabilityModel::static_library());
        assert_eq!(lib.program, "tlib");
        assert_eq!(lib.strategy.object_prefix, "+");
    }

    #[test]
    fn test_sparse_warning_table() {
        assert_eq!(BORLAND_WARNINGS.len(), 3);
        assert_eq!(BORLAND_WARNINGS[1], (3, &["-w"][..]));
    }
}

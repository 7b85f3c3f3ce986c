//! IBM XL C/C++ (xlc, xlC, xlf) on AIX.

use crate::core::capability::OutputKind;
use crate::core::options::Optimization;
use crate::core::source::Language;

use super::gcc::{
    self, CXX_HEADERS, CXX_SOURCES, C_HEADERS, C_SOURCES, DRIVER_LINK, FORTRAN_HEADERS,
    FORTRAN_SOURCES, GCC_COMPAT,
};
use super::{
    CompileContext, CompilerStrategy, Forwarding, LibraryStyle, LinkContext, LinkerDescriptor,
    LinkerStrategy, ProcessorDescriptor, VendorKind,
};

const XLC_WARNINGS: &[(u8, &[&str])] = &[(0, &["-w"]), (1, &[]), (5, &["-qhalt=w"])];

fn compile_implied(ctx: &CompileContext<'_>) -> Vec<String> {
    let mut args = vec!["-c".to_string()];
    if ctx.options.debug {
        args.push("-g".to_string());
    } else if let Some(opt) = ctx.options.optimization {
        let flag = match opt {
            Optimization::Size => "-qcompact",
            Optimization::Speed => "-O2",
            Optimization::Full => "-O3",
            Optimization::Extreme => "-O5",
        };
        args.push(flag.to_string());
    }
    if ctx.capability.is_shared_object() {
        args.push("-qpic".to_string());
    }
    if ctx.language == Language::Cxx {
        if ctx.options.rtti == Some(false) {
            args.push("-qnortti".to_string());
        }
        if !ctx.options.exceptions {
            args.push("-qnoeh".to_string());
        }
    }
    args
}

const XLC_COMPILE: CompilerStrategy = CompilerStrategy {
    implied_args: compile_implied,
    warnings: XLC_WARNINGS,
    ..GCC_COMPAT
};

pub(super) const PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::XlC,
        variant: "xlc",
        program: "xlc",
        language: Language::C,
        source_extensions: C_SOURCES,
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["-qversion"],
        strategy: XLC_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::XlC,
        variant: "xlC",
        program: "xlC",
        language: Language::Cxx,
        source_extensions: CXX_SOURCES,
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["-qversion"],
        strategy: XLC_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::XlC,
        variant: "xlf",
        program: "xlf",
        language: Language::Fortran,
        source_extensions: FORTRAN_SOURCES,
        header_extensions: FORTRAN_HEADERS,
        object_suffix: ".o",
        probe_args: &["-qversion"],
        strategy: XLC_COMPILE,
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
    args
}

const XLC_LINK: LinkerStrategy = LinkerStrategy {
    implied_args: link_implied,
    forwarding: Forwarding::Driver {
        prefix: "-Wl,",
        passthrough: "bgfLlOqW",
        known: &["-G", "-brtl"],
        strip_dash: false,
    },
    libraries: LibraryStyle {
        dir_switch: "-L",
        name: gcc::dash_l,
        mode_switches: Some(("-bstatic", "-bdynamic")),
        frameworks: false,
    },
    ..DRIVER_LINK
};

const LINKER_TABLE: [LinkerDescriptor; 4] =
    gcc::driver_linkers(VendorKind::XlC, ["xlc", "xlC", "xlf"], "ar", XLC_LINK);

pub(super) const LINKERS: &[LinkerDescriptor] = &LINKER_TABLE;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{expand_library_sets, select_linker, TargetPlatform};
    use crate::core::capability::CapabilityModel;
    use crate::core::options::{LibrarySet, LibraryType};

    #[test]
    fn test_b_options_pass_through_the_driver() {
        let linker = select_linker(VendorKind::XlC, &CapabilityModel::executable());
        let sets = vec![
            LibrarySet::new(["a"], LibraryType::Static),
            LibrarySet::new(["b"], LibraryType::Shared),
        ];
        assert_eq!(
            expand_library_sets(linker, TargetPlatform::Aix, &sets),
            vec!["-bstatic", "-la", "-bdynamic", "-lb"]
        );
        assert_eq!(linker.strategy.forwarding.decorate("-brtl"), "-brtl");
        assert_eq!(linker.strategy.forwarding.decorate("-export-dynamic"), "-Wl,-export-dynamic");
    }
}

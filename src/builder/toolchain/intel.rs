//! Intel compilers (icc, icpc, ifort) on Linux and Darwin.
//!
//! Intel drivers accept the GCC command-line dialect; only warnings and the
//! static-runtime switch differ.

use crate::core::source::Language;

use super::gcc::{
    self, CXX_HEADERS, CXX_SOURCES, C_HEADERS, C_SOURCES, DRIVER_LINK, FORTRAN_HEADERS,
    FORTRAN_SOURCES, GCC_COMPAT,
};
use super::{
    CompilerStrategy, LinkContext, LinkerDescriptor, LinkerStrategy, ProcessorDescriptor,
    VendorKind,
};

const INTEL_WARNINGS: &[(u8, &[&str])] = &[
    (0, &["-w"]),
    (1, &["-w1"]),
    (2, &["-w2"]),
    (3, &["-Wall"]),
    (4, &["-Wall", "-Wcheck"]),
    (5, &["-Wall", "-Werror"]),
];

const INTEL_COMPILE: CompilerStrategy = CompilerStrategy {
    warnings: INTEL_WARNINGS,
    ..GCC_COMPAT
};

fn link_implied(ctx: &LinkContext<'_>) -> Vec<String> {
    let mut args = gcc::link_implied(ctx);
    if ctx.capability.is_static_runtime() {
        args.push("-static-intel".to_string());
    }
    args
}

const INTEL_LINK: LinkerStrategy = LinkerStrategy {
    implied_args: link_implied,
    ..DRIVER_LINK
};

pub(super) const PROCESSORS: &[ProcessorDescriptor] = &[
    ProcessorDescriptor {
        vendor: VendorKind::Intel,
        variant: "icc",
        program: "icc",
        language: Language::C,
        source_extensions: C_SOURCES,
        header_extensions: C_HEADERS,
        object_suffix: ".o",
        probe_args: &["-V"],
        strategy: INTEL_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Intel,
        variant: "icpc",
        program: "icpc",
        language: Language::Cxx,
        source_extensions: CXX_SOURCES,
        header_extensions: CXX_HEADERS,
        object_suffix: ".o",
        probe_args: &["-V"],
        strategy: INTEL_COMPILE,
    },
    ProcessorDescriptor {
        vendor: VendorKind::Intel,
        variant: "ifort",
        program: "ifort",
        language: Language::Fortran,
        source_extensions: FORTRAN_SOURCES,
        header_extensions: FORTRAN_HEADERS,
        object_suffix: ".o",
        probe_args: &["-V"],
        strategy: INTEL_COMPILE,
    },
];

const LINKER_TABLE: [LinkerDescriptor; 4] =
    gcc::driver_linkers(VendorKind::Intel, ["icc", "icpc", "ifort"], "xiar", INTEL_LINK);

pub(super) const LINKERS: &[LinkerDescriptor] = &LINKER_TABLE;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{select_linker, OutputNames, TargetPlatform};
    use crate::core::capability::{CapabilityModel, RuntimeLinkage};
    use crate::core::options::BuildOptions;
    use std::path::Path;

    #[test]
    fn test_static_runtime_adds_static_intel() {
        let cap = CapabilityModel::executable().with_runtime(RuntimeLinkage::Static);
        let linker = select_linker(VendorKind::Intel, &cap);
        let options = BuildOptions {
            multithreaded: false,
            ..Default::default()
        };
        let names = OutputNames {
            primary: "app".to_string(),
            ..Default::default()
        };
        let args = (linker.strategy.implied_args)(&LinkContext {
            capability: cap,
            options: &options,
            platform: TargetPlatform::Linux,
            output: Path::new("app"),
            names: &names,
            version: None,
        });
        assert_eq!(args, vec!["-static", "-static-intel"]);
        assert_eq!(linker.program, "icc");
    }

    #[test]
    fn test_librarian_is_xiar() {
        let linker = select_linker(VendorKind::Intel, &CapabilityModel::static_library());
        assert_eq!(linker.program, "xiar");
    }
}

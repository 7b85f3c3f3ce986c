//! Command line synthesis.
//!
//! Turns a capability model, build options and a file list into the exact
//! argument vector a vendor's compiler or linker expects. All vendor
//! knowledge lives in the descriptor tables under [`toolchain`]; this module
//! only fixes the order in which the pieces are assembled:
//!
//! compile: implied, warnings, defines, include dirs, extra args, files, output
//! link:    implied, output, objects, library sets, decorated extra args
//!
//! Requests a vendor cannot express are left out without error.
//!
//! [`toolchain`]: crate::builder::toolchain

use std::path::{Path, PathBuf};

use crate::builder::toolchain::{
    expand_library_sets, quote_path, select_linker, switch_arg, Classification, CommandSpec,
    CompileContext, CompilerStrategy, LibraryVersion, LinkContext, LinkerDescriptor,
    LinkerVariant, OutputNames, ProcessorDescriptor, ProcessorRegistry, TargetPlatform, Toolchain,
    VendorKind,
};
use crate::core::capability::CapabilityModel;
use crate::core::options::{BuildOptions, DefineKind, WarningLevel};
use crate::core::source::Language;

/// Flags for a warning level.
///
/// The level is clamped into `0..=5`, then mapped to the nearest level the
/// vendor defines. Equidistant levels resolve to the lower one.
pub fn warning_flags(strategy: &CompilerStrategy, level: WarningLevel) -> &'static [&'static str] {
    let wanted = level.clamped();
    let mut best: Option<(u8, &'static [&'static str])> = None;
    for &(defined, flags) in strategy.warnings {
        let closer = match best {
            None => true,
            Some((current, _)) => defined.abs_diff(wanted) < current.abs_diff(wanted),
        };
        if closer {
            best = Some((defined, flags));
        }
    }
    best.map(|(_, flags)| flags).unwrap_or(&[])
}

/// Builds vendor argument vectors.
#[derive(Debug, Clone, Copy)]
pub struct CommandSynthesizer {
    vendor: VendorKind,
    platform: TargetPlatform,
}

impl CommandSynthesizer {
    pub fn new(vendor: VendorKind, platform: TargetPlatform) -> Self {
        CommandSynthesizer { vendor, platform }
    }

    pub fn for_toolchain(toolchain: &Toolchain) -> Self {
        Self::new(toolchain.vendor, toolchain.platform)
    }

    pub fn vendor(&self) -> VendorKind {
        self.vendor
    }

    /// Argument vector for compiling `files` with `processor`.
    ///
    /// `output` names the object file; without it no output argument is
    /// emitted and the vendor's default naming applies.
    pub fn compile_args(
        &self,
        processor: &ProcessorDescriptor,
        capability: &CapabilityModel,
        options: &BuildOptions,
        files: &[PathBuf],
        output: Option<&Path>,
    ) -> Vec<String> {
        let strategy = &processor.strategy;
        let ctx = CompileContext {
            capability: *capability,
            options,
            platform: self.platform,
            language: processor.language,
        };

        let mut args = (strategy.implied_args)(&ctx);

        args.extend(
            warning_flags(strategy, options.warning_level)
                .iter()
                .map(|f| f.to_string()),
        );

        let style = strategy.define_style;
        for op in options.active_defines() {
            match op.kind {
                DefineKind::Define => {
                    let value = match &op.value {
                        Some(value) => format!("{}={}", op.name, value),
                        None => op.name.clone(),
                    };
                    switch_arg(&mut args, style.define, &value, style.separate);
                }
                DefineKind::Undefine => {
                    switch_arg(&mut args, style.undefine, &op.name, style.separate);
                }
            }
        }

        for dir in &options.include_dirs {
            args.push(format!("{}{}", strategy.include_switch, quote_path(dir)));
        }

        args.extend(options.compiler_args.iter().cloned());
        args.extend(files.iter().map(|f| quote_path(f)));

        if let Some(output) = output {
            args.extend((strategy.output_args)(output));
        }
        args
    }

    /// Argument vector for linking `objects` into `output` with `linker`.
    #[allow(clippy::too_many_arguments)]
    pub fn link_args(
        &self,
        linker: &LinkerDescriptor,
        capability: &CapabilityModel,
        options: &BuildOptions,
        objects: &[PathBuf],
        output: &Path,
        names: &OutputNames,
        version: Option<&LibraryVersion>,
    ) -> Vec<String> {
        let ctx = LinkContext {
            capability: *capability,
            options,
            platform: self.platform,
            output,
            names,
            version,
        };
        self.assemble_link(linker, &ctx, objects, Some(output))
    }

    fn assemble_link(
        &self,
        linker: &LinkerDescriptor,
        ctx: &LinkContext<'_>,
        objects: &[PathBuf],
        output: Option<&Path>,
    ) -> Vec<String> {
        let strategy = &linker.strategy;
        let mut args = (strategy.implied_args)(ctx);
        if let Some(output) = output {
            args.extend((strategy.output_args)(output));
        }
        args.extend(
            objects
                .iter()
                .map(|o| format!("{}{}", strategy.object_prefix, quote_path(o))),
        );

        // Archivers take no libraries or linker options.
        if linker.variant != LinkerVariant::Librarian {
            args.extend(expand_library_sets(linker, self.platform, &ctx.options.library_sets));
            args.extend(strategy.forwarding.decorate_all(&ctx.options.linker_args));
        }
        args
    }

    /// Argument vector for a file list, without program or output.
    ///
    /// Files one of the vendor's compilers bids on are compiled by the
    /// processor the first file selects; anything else is handed to the
    /// linker variant the capability model calls for.
    pub fn synthesize(
        &self,
        capability: &CapabilityModel,
        options: &BuildOptions,
        files: &[PathBuf],
    ) -> Vec<String> {
        let registry = ProcessorRegistry::for_vendor(self.vendor);
        let processor = files
            .first()
            .filter(|f| registry.classify(f) == Classification::Source)
            .and_then(|f| registry.select(f));

        if let Some(processor) = processor {
            return self.compile_args(processor, capability, options, files, None);
        }

        let linker = select_linker(self.vendor, capability);
        let names = OutputNames::default();
        let ctx = LinkContext {
            capability: *capability,
            options,
            platform: self.platform,
            output: Path::new(""),
            names: &names,
            version: None,
        };
        self.assemble_link(linker, &ctx, files, None)
    }

    /// Full compile command for one source file.
    pub fn compile_command(
        &self,
        toolchain: &Toolchain,
        processor: &ProcessorDescriptor,
        capability: &CapabilityModel,
        options: &BuildOptions,
        source: &Path,
        object: &Path,
    ) -> CommandSpec {
        let mut options = options.clone();
        options.compiler_args.splice(0..0, toolchain.cflags.iter().cloned());
        let args = self.compile_args(
            processor,
            capability,
            &options,
            &[source.to_path_buf()],
            Some(object),
        );
        CommandSpec::new(toolchain.compiler_program(processor)).args(args)
    }

    /// Full link command. `languages` picks the driver for driver-style
    /// linkers.
    #[allow(clippy::too_many_arguments)]
    pub fn link_command(
        &self,
        toolchain: &Toolchain,
        linker: &LinkerDescriptor,
        capability: &CapabilityModel,
        options: &BuildOptions,
        objects: &[PathBuf],
        languages: &[Language],
        output: &Path,
        names: &OutputNames,
        version: Option<&LibraryVersion>,
    ) -> CommandSpec {
        let mut options = options.clone();
        options.linker_args.splice(0..0, toolchain.ldflags.iter().cloned());
        let args = self.link_args(linker, capability, &options, objects, output, names, version);
        CommandSpec::new(toolchain.linker_program(linker, languages)).args(args)
    }
}

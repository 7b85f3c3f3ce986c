//! `keel flags` command
//!
//! Shows exactly what a vendor would be handed for a file list, without a
//! manifest or an installed compiler.

use anyhow::Result;

use crate::cli::FlagsArgs;
use keel::builder::toolchain::TargetPlatform;
use keel::builder::CommandSynthesizer;
use keel::core::capability::CapabilityModel;
use keel::core::options::{DefineOp, LibrarySet, LibraryType, WarningLevel};
use keel::core::BuildOptions;

pub fn execute(args: FlagsArgs) -> Result<()> {
    let platform = args.platform.unwrap_or_else(TargetPlatform::host);
    let capability = CapabilityModel::new(args.kind.into());

    let mut options = BuildOptions {
        debug: args.debug,
        optimization: args.optimize.map(Into::into),
        include_dirs: args.include,
        ..Default::default()
    };
    if let Some(level) = args.warnings {
        options.warning_level = WarningLevel(level);
    }

    for define in &args.define {
        let op = match define.split_once('=') {
            Some((name, value)) => DefineOp::define_value(name, value),
            None => DefineOp::define(define.as_str()),
        };
        options.defines.push(op);
    }
    options
        .defines
        .extend(args.undefine.iter().map(|name| DefineOp::undefine(name.as_str())));

    if !args.lib.is_empty() {
        let mut set = LibrarySet::new(args.lib, LibraryType::Unspecified);
        if let Some(dir) = args.lib_dir {
            set = set.in_dir(dir);
        }
        options.library_sets.push(set);
    }

    options.validate()?;

    let synth = CommandSynthesizer::new(args.vendor, platform);
    let argv = synth.synthesize(&capability, &options, &args.files);
    tracing::debug!("{} arguments for {} on {}", argv.len(), args.vendor, platform);

    println!("{}", argv.join(" "));

    Ok(())
}

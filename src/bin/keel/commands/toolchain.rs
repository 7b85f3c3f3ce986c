//! `keel toolchain` command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{ToolchainArgs, ToolchainCommands, ToolchainOverrideArgs};
use keel::builder::toolchain::{detect_toolchain, ProbeCache, Toolchain, VendorKind};
use keel::core::capability::CapabilityModel;
use keel::core::{find_manifest, Language};
use keel::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
    ToolchainConfig,
};
use keel::util::process::{CommandRunner, SystemRunner};

pub fn execute(args: ToolchainArgs) -> Result<()> {
    let root = project_root()?;
    match args.command {
        ToolchainCommands::Show => show_toolchain(root),
        ToolchainCommands::Override(override_args) => override_toolchain(root, override_args),
    }
}

/// Directory holding Keel.toml, or the current directory outside a project.
fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(find_manifest(&cwd)
        .ok()
        .and_then(|m| m.parent().map(PathBuf::from))
        .unwrap_or(cwd))
}

fn show_toolchain(root: PathBuf) -> Result<()> {
    let config = load_toolchain_config(
        global_toolchain_config_path().as_deref(),
        &project_toolchain_config_path(&root),
    );
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let probes = ProbeCache::new(runner);
    let toolchain = detect_toolchain(&config, &probes)?;

    println!("Toolchain:");
    println!();
    println!("  Vendor:   {}", toolchain.vendor);
    println!("  Platform: {}", toolchain.platform);
    println!();

    println!("Compilers:");
    for processor in toolchain.registry.processors() {
        let program = toolchain.compiler_program(processor);
        println!(
            "  {:<8} {}",
            processor.language.as_str(),
            program.display()
        );
        if reports_version(toolchain.vendor) {
            println!("           version {}", probes.version(&program));
        }
    }
    println!();

    println!("Linkers:");
    print_linker(&toolchain, "exe", CapabilityModel::executable());
    print_linker(&toolchain, "shared", CapabilityModel::shared_library());
    print_linker(&toolchain, "static", CapabilityModel::static_library());

    if !toolchain.cflags.is_empty() || !toolchain.ldflags.is_empty() {
        println!();
        println!("Flags:");
        if !toolchain.cflags.is_empty() {
            println!("  cflags:  {}", toolchain.cflags.join(" "));
        }
        if !toolchain.ldflags.is_empty() {
            println!("  ldflags: {}", toolchain.ldflags.join(" "));
        }
    }

    Ok(())
}

fn print_linker(toolchain: &Toolchain, label: &str, capability: CapabilityModel) {
    let linker = toolchain.linker(&capability);
    let program = toolchain.linker_program(linker, &[Language::C]);
    println!("  {:<8} {}", label, program.display());
}

/// Only GCC-style drivers answer `-dumpversion`.
fn reports_version(vendor: VendorKind) -> bool {
    matches!(vendor, VendorKind::Gcc | VendorKind::Clang | VendorKind::Intel)
}

fn override_toolchain(root: PathBuf, args: ToolchainOverrideArgs) -> Result<()> {
    let path = project_toolchain_config_path(&root);
    let mut config = ToolchainConfig::load_or_default(&path);

    let mut update = ToolchainConfig::default();
    update.toolchain.vendor = args.vendor;
    update.toolchain.platform = args.platform;
    update.toolchain.cc = args.cc;
    update.toolchain.cxx = args.cxx;
    update.toolchain.fc = args.fc;
    update.toolchain.ar = args.ar;

    if !update.has_overrides() {
        anyhow::bail!("nothing to override\nhelp: pass --vendor, --platform, --cc, --cxx, --fc or --ar");
    }

    config.merge(update);
    config.save(&path)?;
    eprintln!("     Updated {}", path.display());

    Ok(())
}

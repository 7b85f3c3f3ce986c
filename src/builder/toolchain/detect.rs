//! Toolchain detection functions.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::util::config::ToolchainConfig;

use super::probe::NO_MACHINE;
use super::{
    ProbeCache, ProbeKind, ProcessorRegistry, ProgramOverrides, TargetPlatform, Toolchain,
    VendorKind,
};

/// Detect the available toolchain.
///
/// Tries the following in order:
/// 1. An explicit `vendor` in the toolchain config
/// 2. A configured `cc`, identified by name and then by its banner
/// 3. The `CC` environment variable, identified the same way
/// 4. On Windows: `cl` on PATH
/// 5. `cc`, `gcc`, `clang` on PATH
pub fn detect_toolchain(config: &ToolchainConfig, probes: &ProbeCache) -> Result<Toolchain> {
    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    let lookup = |name: &str| which::which(name).ok();
    detect_with(config, probes, &env, &lookup)
}

fn detect_with(
    config: &ToolchainConfig,
    probes: &ProbeCache,
    env: &dyn Fn(&str) -> Option<String>,
    lookup: &dyn Fn(&str) -> Option<PathBuf>,
) -> Result<Toolchain> {
    let settings = &config.toolchain;

    if let Some(vendor) = settings.vendor {
        let platform = settings.platform.unwrap_or_else(TargetPlatform::host);
        tracing::debug!("using configured vendor {}", vendor);
        return Ok(toolchain_for_vendor(vendor, platform, config, env));
    }

    let candidate = settings
        .cc
        .clone()
        .map(|cc| (cc, "toolchain config"))
        .or_else(|| env("CC").map(|cc| (PathBuf::from(cc), "CC")));

    if let Some((cc, origin)) = candidate {
        let vendor = identify(&cc, probes);
        tracing::info!("using {} compiler {} from {}", vendor, cc.display(), origin);
        let platform = settings
            .platform
            .unwrap_or_else(|| probe_platform(vendor, &cc, probes));
        let mut toolchain = toolchain_for_vendor(vendor, platform, config, env);
        toolchain.programs.cc.get_or_insert(cc);
        return Ok(toolchain);
    }

    if cfg!(target_os = "windows") {
        if let Some(cl) = lookup("cl") {
            tracing::debug!("found {}", cl.display());
            let platform = settings.platform.unwrap_or(TargetPlatform::Windows);
            return Ok(toolchain_for_vendor(VendorKind::Msvc, platform, config, env));
        }
    }

    for name in ["cc", "gcc", "clang"] {
        let Some(cc) = lookup(name) else {
            continue;
        };
        let vendor = identify(&cc, probes);
        tracing::debug!("found {} ({})", cc.display(), vendor);
        let platform = settings
            .platform
            .unwrap_or_else(|| probe_platform(vendor, &cc, probes));
        let mut toolchain = toolchain_for_vendor(vendor, platform, config, env);
        toolchain.programs.cc.get_or_insert(cc);
        return Ok(toolchain);
    }

    bail!(
        "no C compiler found\n\
         \n\
         keel requires a C compiler (gcc, clang, cl, ...).\n\
         Set the CC environment variable, set `vendor` or `cc` in .keel/toolchain.toml,\n\
         or install a compiler."
    )
}

/// Build a toolchain for a known vendor, applying config and environment
/// program overrides.
pub fn toolchain_for_vendor(
    vendor: VendorKind,
    platform: TargetPlatform,
    config: &ToolchainConfig,
    env: &dyn Fn(&str) -> Option<String>,
) -> Toolchain {
    let settings = &config.toolchain;
    let from_env = |key: &str| env(key).map(PathBuf::from);

    let programs = ProgramOverrides {
        cc: settings.cc.clone().or_else(|| from_env("CC")),
        cxx: settings.cxx.clone().or_else(|| from_env("CXX")),
        fc: settings.fc.clone().or_else(|| from_env("FC")),
        ar: settings.ar.clone().or_else(|| from_env("AR")),
    };

    let registry = match &settings.variant {
        Some(variant) => ProcessorRegistry::for_vendor_variant(vendor, variant),
        None => ProcessorRegistry::for_vendor(vendor),
    };

    let mut toolchain = Toolchain::new(vendor, platform)
        .with_registry(registry)
        .with_programs(programs);
    toolchain.cflags = settings.cflags.clone();
    toolchain.ldflags = settings.ldflags.clone();
    toolchain
}

/// Recognize a vendor from a compiler's banner output.
pub fn detect_vendor_from_identity(lines: &[String]) -> Option<VendorKind> {
    let text = lines.join("\n").to_lowercase();

    // Order matters: clang banners often mention gcc compatibility and
    // Intel's newer drivers are clang based.
    let vendor = if text.contains("intel") || text.contains("(icc)") {
        VendorKind::Intel
    } else if text.contains("clang") {
        VendorKind::Clang
    } else if text.contains("microsoft") {
        VendorKind::Msvc
    } else if text.contains("borland") || text.contains("embarcadero") {
        VendorKind::Borland
    } else if text.contains("sun c") || text.contains("studio") {
        VendorKind::SunCc
    } else if text.contains("ibm xl") {
        VendorKind::XlC
    } else if text.contains("arm c/c++") || text.contains("armcc") || text.contains("realview") {
        VendorKind::Arm
    } else if text.contains("gcc") || text.contains("free software foundation") {
        VendorKind::Gcc
    } else {
        return None;
    };
    Some(vendor)
}

fn vendor_from_name(cc: &Path) -> Option<VendorKind> {
    let name = cc
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    let vendor = if name.contains("clang") {
        VendorKind::Clang
    } else if name.contains("gcc") || name.contains("g++") || name.contains("gfortran") {
        VendorKind::Gcc
    } else if matches!(name.as_str(), "icc" | "icpc" | "ifort" | "icx" | "icpx") {
        VendorKind::Intel
    } else if name == "cl" {
        VendorKind::Msvc
    } else if name.starts_with("bcc") {
        VendorKind::Borland
    } else if name.starts_with("xlc") || name.starts_with("xlf") {
        VendorKind::XlC
    } else if name.starts_with("armcc") || name.starts_with("armcpp") {
        VendorKind::Arm
    } else {
        return None;
    };
    Some(vendor)
}

/// Identify a compiler by its name, then by its `--version` banner, then by
/// each vendor's own identity flags.
fn identify(cc: &Path, probes: &ProbeCache) -> VendorKind {
    if let Some(vendor) = vendor_from_name(cc) {
        return vendor;
    }
    let from_banner = |args: &[&str]| {
        probes
            .probe_with(cc, ProbeKind::Identity, args)
            .available()
            .and_then(|lines| detect_vendor_from_identity(lines))
    };
    if let Some(vendor) = from_banner(ProbeKind::Identity.default_args()) {
        return vendor;
    }

    let mut tried: Vec<&[&str]> = vec![ProbeKind::Identity.default_args()];
    for processor in VendorKind::ALL.iter().flat_map(|v| v.processors()) {
        let args = processor.probe_args;
        if args.is_empty() || tried.contains(&args) {
            continue;
        }
        tried.push(args);
        if let Some(vendor) = from_banner(args) {
            return vendor;
        }
    }

    tracing::debug!("could not identify {}, assuming gcc", cc.display());
    VendorKind::Gcc
}

/// Platform from `-dumpmachine` for drivers that support it.
fn probe_platform(vendor: VendorKind, cc: &Path, probes: &ProbeCache) -> TargetPlatform {
    if !matches!(vendor, VendorKind::Gcc | VendorKind::Clang | VendorKind::Intel) {
        return TargetPlatform::host();
    }
    let machine = probes.machine(cc);
    if machine == NO_MACHINE {
        TargetPlatform::host()
    } else {
        TargetPlatform::from_triple(&machine)
    }
}

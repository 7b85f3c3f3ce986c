//! Linker argument decoration and library-set expansion.

use std::path::{Path, PathBuf};

use crate::core::options::{LibrarySet, LibraryType};
use crate::util::fs::FileSystem;

use super::{quote_path, LinkerDescriptor, TargetPlatform};

/// How a linker-level option reaches the real linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarding {
    /// The linker is invoked directly; every argument passes unchanged
    Direct,
    /// The link runs through a compiler driver. Options the driver already
    /// understands pass through; anything else is wrapped in `prefix`.
    Driver {
        prefix: &'static str,
        /// Second characters of options the driver consumes itself
        passthrough: &'static str,
        /// Options the driver consumes whatever their second character
        known: &'static [&'static str],
        /// Drop the option's own leading dash when wrapping
        strip_dash: bool,
    },
}

impl Forwarding {
    /// Classify and rewrite one linker argument.
    ///
    /// Every argument is either passed through or wrapped; there is no
    /// third outcome. Non-option arguments (file names, values following an
    /// option) always pass through.
    pub fn decorate(&self, arg: &str) -> String {
        match *self {
            Forwarding::Direct => arg.to_string(),
            Forwarding::Driver {
                prefix,
                passthrough,
                known,
                strip_dash,
            } => {
                let Some(rest) = arg.strip_prefix('-') else {
                    return arg.to_string();
                };
                let consumed = known.contains(&arg)
                    || rest.chars().next().is_some_and(|c| passthrough.contains(c));
                if consumed || rest.is_empty() {
                    arg.to_string()
                } else if strip_dash {
                    format!("{prefix}{rest}")
                } else {
                    format!("{prefix}{arg}")
                }
            }
        }
    }

    pub fn decorate_all<'a>(&self, args: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        args.into_iter().map(|a| self.decorate(a)).collect()
    }
}

/// How a vendor names library directories, libraries and link modes.
#[derive(Clone, Copy)]
pub struct LibraryStyle {
    pub dir_switch: &'static str,
    pub name: fn(&str) -> String,
    /// Linker options selecting static and dynamic search, if the vendor
    /// has them
    pub mode_switches: Option<(&'static str, &'static str)>,
    /// Darwin frameworks are understood (`-F`, `-framework`)
    pub frameworks: bool,
}

impl std::fmt::Debug for LibraryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryStyle")
            .field("dir_switch", &self.dir_switch)
            .field("mode_switches", &self.mode_switches)
            .field("frameworks", &self.frameworks)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkMode {
    Static,
    Dynamic,
}

/// Expand ordered library sets into linker arguments.
///
/// Linking starts in dynamic mode. A static set switches to static mode;
/// every other type switches back to dynamic. A mode switch is emitted only
/// on a transition, and only before a set that actually names libraries.
/// If the list ends in static mode, dynamic mode is restored so that
/// libraries the driver appends implicitly are unaffected. Vendors without
/// mode switches, and Darwin, get no switches at all.
pub fn expand_library_sets(
    linker: &LinkerDescriptor,
    platform: TargetPlatform,
    sets: &[LibrarySet],
) -> Vec<String> {
    let style = &linker.strategy.libraries;
    let forwarding = &linker.strategy.forwarding;
    let switches = style.mode_switches.filter(|_| !platform.is_darwin());
    let frameworks = style.frameworks && platform.is_darwin();

    let mut out = Vec::new();
    let mut mode = LinkMode::Dynamic;

    for set in sets {
        let framework = frameworks && set.kind == LibraryType::Framework;

        if let Some(dir) = &set.dir {
            let switch = if framework { "-F" } else { style.dir_switch };
            out.push(format!("{switch}{}", quote_path(dir)));
        }

        if set.names.is_empty() {
            continue;
        }

        if let Some((static_switch, dynamic_switch)) = switches {
            let wanted = if set.kind == LibraryType::Static {
                LinkMode::Static
            } else {
                LinkMode::Dynamic
            };
            if wanted != mode {
                let switch = match wanted {
                    LinkMode::Static => static_switch,
                    LinkMode::Dynamic => dynamic_switch,
                };
                out.push(forwarding.decorate(switch));
                mode = wanted;
            }
        }

        for name in &set.names {
            if framework {
                out.push("-framework".to_string());
                out.push(name.clone());
            } else {
                out.push((style.name)(name));
            }
        }
    }

    if let (LinkMode::Static, Some((_, dynamic_switch))) = (mode, switches) {
        out.push(forwarding.decorate(dynamic_switch));
    }

    out
}

/// Find the first file matching one of `patterns` in `dirs`.
///
/// Directories are searched in order, and within a directory the patterns
/// in order. Unreadable directories are skipped.
pub fn locate_library(fs: &dyn FileSystem, dirs: &[PathBuf], patterns: &[String]) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        let entries = fs.read_dir(dir).ok()?;
        patterns
            .iter()
            .find(|p| entries.contains(p))
            .map(|p| Path::new(dir).join(p))
    })
}

//! `keel clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use keel::core::find_manifest;
use keel::ops::{clean, CleanOptions};

pub fn execute(args: CleanArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest_path = find_manifest(&cwd)?;
    let root = manifest_path.parent().unwrap_or(cwd.as_path());

    let profile = if args.release {
        Some("release".to_string())
    } else if args.debug {
        Some("debug".to_string())
    } else {
        None
    };

    let opts = CleanOptions {
        profile,
        caches: args.caches,
    };

    for path in clean(root, &opts)? {
        eprintln!("     Removed {}", path.display());
    }

    Ok(())
}

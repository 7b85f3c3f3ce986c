//! `keel deps` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::DepsArgs;
use keel::deps::{DependencyCache, SearchPath};
use keel::util::fs::OsFileSystem;

pub fn execute(args: DepsArgs) -> Result<()> {
    if !args.file.is_file() {
        bail!("{} is not a file", args.file.display());
    }

    let cache = DependencyCache::new(Arc::new(OsFileSystem));
    let search = SearchPath::new(args.include);
    let record = cache.record(&args.file, &search);

    for path in &record.closure {
        println!("{}", path.display());
    }

    if args.unresolved {
        for missing in &record.unresolved {
            println!("unresolved {} (from {})", missing.include, missing.from.display());
        }
    } else if !record.unresolved.is_empty() {
        tracing::debug!("{} include(s) not found", record.unresolved.len());
    }

    Ok(())
}

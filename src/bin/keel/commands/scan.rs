//! `keel scan` command

use anyhow::{Context, Result};

use crate::cli::ScanArgs;
use keel::scanner::ScannerKind;

pub fn execute(args: ScanArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let scanner = ScannerKind::for_path(&args.file);
    tracing::debug!("scanning {} as {:?}", args.file.display(), scanner);

    for include in scanner.scan(&text) {
        println!("{}", include);
    }

    Ok(())
}

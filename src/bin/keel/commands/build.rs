//! `keel build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use keel::core::find_manifest;
use keel::ops::{build, dry_run_lines, BuildRequest};

pub fn execute(args: BuildArgs, verbose: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest_path = find_manifest(&cwd)?;

    let req = BuildRequest {
        manifest_path,
        release: args.release,
        dry_run: args.dry_run,
        targets: args.target,
        jobs: args.jobs,
        emit_compile_commands: args.emit_compile_commands,
        verbose,
    };

    let result = build(&req)?;

    if args.dry_run {
        if result.plan.is_up_to_date() {
            eprintln!("       Fresh all targets are up to date");
        }
        for line in dry_run_lines(&result.plan) {
            println!("{}", line);
        }
        return Ok(());
    }

    for artifact in &result.artifacts {
        let status = if artifact.rebuilt { "Built" } else { "Fresh" };
        eprintln!(
            "{:>12} `{}` -> {}",
            status,
            artifact.target,
            artifact.path.display()
        );
    }

    Ok(())
}

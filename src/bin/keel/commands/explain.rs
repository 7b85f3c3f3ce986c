//! `keel explain` command
//!
//! Plans a build without running it and reports, for every step, why it
//! would run.

use anyhow::Result;

use crate::cli::ExplainArgs;
use keel::core::find_manifest;
use keel::ops::{build, BuildRequest};

pub fn execute(args: ExplainArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest_path = find_manifest(&cwd)?;

    let req = BuildRequest {
        manifest_path,
        release: args.release,
        dry_run: true,
        targets: args.target,
        ..Default::default()
    };
    let plan = build(&req)?.plan;

    for target in &plan.targets {
        println!("{} ({})", target.name, target.capability.output);
        for step in &target.compiles {
            match &step.reason {
                Some(reason) => println!("  compile {}: {}", step.source.display(), reason),
                None => println!("  compile {}: up to date", step.source.display()),
            }
        }
        match &target.link.reason {
            Some(reason) => println!("  link {}: {}", target.link.output.display(), reason),
            None => println!("  link {}: up to date", target.link.output.display()),
        }
    }

    Ok(())
}

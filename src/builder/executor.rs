//! Build executor with progress reporting.

use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::context::BuildContext;
use crate::builder::history::BuildHistory;
use crate::builder::native::{Artifact, NativeBuilder};
use crate::builder::plan::BuildPlan;

/// Build executor with progress tracking.
pub struct BuildExecutor<'a> {
    ctx: &'a BuildContext,
    verbose: bool,
}

impl<'a> BuildExecutor<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        BuildExecutor {
            ctx,
            verbose: false,
        }
    }

    /// Verbose builds log every step instead of drawing a progress bar.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a build plan with progress reporting.
    pub fn execute(
        &self,
        plan: &BuildPlan,
        history: &mut BuildHistory,
        jobs: Option<usize>,
    ) -> Result<Vec<Artifact>> {
        let start = Instant::now();

        if self.verbose {
            eprintln!("   Compiling {} file(s)", plan.compile_count());
            eprintln!("     Linking {} target(s)", plan.link_count());
        }

        let total = plan.compile_count() + plan.link_count();
        let mut builder = NativeBuilder::new(self.ctx);
        let pb = if !self.verbose && total > 1 {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            builder = builder.with_progress(pb.clone());
            Some(pb)
        } else {
            None
        };

        let result = builder.execute(plan, history, jobs);

        if let Some(pb) = pb {
            match &result {
                Ok(_) => pb.finish_with_message("done"),
                Err(_) => pb.abandon(),
            }
        }
        let artifacts = result?;

        eprintln!(
            "    Finished {} target(s) in {:.2}s",
            artifacts.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(artifacts)
    }
}

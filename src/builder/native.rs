//! Native compiler driver.
//!
//! Runs the pending steps of a [`BuildPlan`]: compiles of a target fan out
//! over a rayon pool, the link runs once they all succeeded. After the
//! first failure no new compile is dispatched; compiles already running
//! finish and are reported.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::history::BuildHistory;
use crate::builder::plan::{BuildPlan, CompileStep, TargetPlan};
use crate::builder::toolchain::CommandSpec;
use crate::util::fs::{ensure_dir, replace_symlink};

/// A linked output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub target: String,
    pub path: PathBuf,
    /// Whether this build produced it, as opposed to finding it fresh
    pub rebuilt: bool,
}

/// Executes build plans with the context's command runner.
pub struct NativeBuilder<'a> {
    ctx: &'a BuildContext,
    progress: Option<ProgressBar>,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        NativeBuilder {
            ctx,
            progress: None,
        }
    }

    /// Advance `progress` by one per finished step.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Execute the plan, recording successful steps in `history`.
    ///
    /// Targets run in plan order. Successful compiles are recorded even
    /// when a sibling fails, so the next build resumes where this one
    /// stopped.
    pub fn execute(
        &self,
        plan: &BuildPlan,
        history: &mut BuildHistory,
        jobs: Option<usize>,
    ) -> Result<Vec<Artifact>> {
        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = jobs {
            pool = pool.num_threads(jobs);
        }
        let pool = pool.build().context("failed to start the compile pool")?;

        let mut artifacts = Vec::new();
        for target in &plan.targets {
            pool.install(|| self.compile_target(target, history))?;
            artifacts.push(self.link_target(target, history)?);
        }
        Ok(artifacts)
    }

    fn compile_target(&self, target: &TargetPlan, history: &mut BuildHistory) -> Result<()> {
        let pending: Vec<&CompileStep> = target.pending_compiles().collect();
        if pending.is_empty() {
            return Ok(());
        }
        tracing::info!("compiling {} file(s) of `{}`", pending.len(), target.name);

        let failed = AtomicBool::new(false);
        let done = Mutex::new(Vec::new());

        let results: Vec<Result<()>> = pending
            .par_iter()
            .map(|step| {
                if failed.load(Ordering::SeqCst) {
                    return Ok(());
                }
                let result = self.compile(step);
                match &result {
                    Ok(()) => done
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .push(*step),
                    Err(_) => failed.store(true, Ordering::SeqCst),
                }
                result
            })
            .collect();

        for step in done.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner) {
            history.record_compile(&step.object, step.fingerprint.clone());
        }

        // Report the first failure in plan order.
        results.into_iter().collect()
    }

    fn compile(&self, step: &CompileStep) -> Result<()> {
        if let Some(parent) = step.object.parent() {
            ensure_dir(parent)?;
        }
        tracing::debug!("compile: {}", step.command.display());
        self.run(&format!("compiling {}", step.source.display()), &step.command)?;
        self.tick(&step.source);
        Ok(())
    }

    fn link_target(&self, target: &TargetPlan, history: &mut BuildHistory) -> Result<Artifact> {
        let link = &target.link;
        let artifact = Artifact {
            target: target.name.clone(),
            path: link.output.clone(),
            rebuilt: link.reason.is_some(),
        };
        let Some(reason) = &link.reason else {
            tracing::debug!("`{}` is up to date", target.name);
            return Ok(artifact);
        };

        tracing::info!("linking `{}` ({})", target.name, reason);
        if let Some(parent) = link.output.parent() {
            ensure_dir(parent)?;
        }
        tracing::debug!("link: {}", link.command.display());
        self.run(&format!("linking {}", target.name), &link.command)?;

        // Aliases point at the primary by file name, so the output
        // directory stays relocatable.
        if let Some(file_name) = link.output.file_name() {
            for alias in &link.aliases {
                replace_symlink(Path::new(file_name), alias)?;
            }
        }

        history.record_link(&target.name, link.fingerprint.clone());
        self.tick(&link.output);
        Ok(artifact)
    }

    fn run(&self, what: &str, command: &CommandSpec) -> Result<(), BuildError> {
        let process = command.to_process_builder().cwd(&self.ctx.project_root);
        let output = self
            .ctx
            .runner
            .run(&process)
            .map_err(|source| BuildError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if !output.success() {
            return Err(BuildError::ProcessFailed {
                what: what.to_string(),
                command: command.display(),
                exit_code: output.exit_code,
                output: output.combined(),
            });
        }

        // Compiler warnings
        if !output.stderr.trim().is_empty() {
            match &self.progress {
                Some(pb) => pb.suspend(|| eprint!("{}", output.stderr)),
                None => eprint!("{}", output.stderr),
            }
        }
        Ok(())
    }

    fn tick(&self, path: &Path) {
        if let Some(pb) = &self.progress {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(name);
            pb.inc(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::plan::LinkStep;
    use crate::builder::staleness::StaleReason;
    use crate::builder::toolchain::{ProbeCache, TargetPlatform, Toolchain, VendorKind};
    use crate::core::capability::CapabilityModel;
    use crate::core::source::Language;
    use crate::test_support::{MockFileSystem, MockProcessOutput, MockRunner};
    use crate::util::fs::{FileSystem, OsFileSystem};
    use crate::util::process::CommandRunner;
    use tempfile::TempDir;

    fn context(root: &Path, runner: Arc<MockRunner>) -> BuildContext {
        let runner = runner as Arc<dyn CommandRunner>;
        BuildContext::new(
            root,
            false,
            Toolchain::new(VendorKind::Gcc, TargetPlatform::Linux),
            Arc::new(ProbeCache::new(Arc::clone(&runner))),
            Arc::new(MockFileSystem::new()) as Arc<dyn FileSystem>,
            runner,
        )
    }

    fn compile_step(root: &Path, name: &str) -> CompileStep {
        let object = root.join(format!("obj/{name}.o"));
        CompileStep {
            source: PathBuf::from(format!("src/{name}.c")),
            object: object.clone(),
            language: Language::C,
            command: CommandSpec::new("gcc").args([
                "-c".to_string(),
                format!("src/{name}.c"),
                "-o".to_string(),
                object.display().to_string(),
            ]),
            fingerprint: format!("fp-{name}"),
            reason: Some(StaleReason::MissingOutput),
        }
    }

    fn target(root: &Path, names: &[&str], aliases: &[&str]) -> TargetPlan {
        let output = root.join("bin/libdemo.so.1.0");
        TargetPlan {
            name: "demo".to_string(),
            capability: CapabilityModel::shared_library(),
            compiles: names.iter().map(|n| compile_step(root, n)).collect(),
            link: LinkStep {
                output: output.clone(),
                aliases: aliases.iter().map(|a| root.join("bin").join(a)).collect(),
                command: CommandSpec::new("gcc").args(["-shared", "-o", "libdemo.so.1.0"]),
                fingerprint: "fp-link".to_string(),
                inputs: Vec::new(),
                reason: Some(StaleReason::InputRebuilt),
            },
        }
    }

    #[test]
    fn test_compiles_then_links_and_creates_aliases() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner
            .expect_prefix("gcc -c", MockProcessOutput::success(""))
            .expect_prefix("gcc -shared", MockProcessOutput::success(""));
        let ctx = context(tmp.path(), Arc::clone(&runner));
        let plan = BuildPlan {
            targets: vec![target(tmp.path(), &["a", "b"], &["libdemo.so.1", "libdemo.so"])],
        };
        // The mock runner writes nothing; create the output by hand.
        std::fs::create_dir_all(tmp.path().join("bin")).unwrap();
        std::fs::write(tmp.path().join("bin/libdemo.so.1.0"), "").unwrap();

        let mut history = BuildHistory::default();
        let artifacts = NativeBuilder::new(&ctx)
            .execute(&plan, &mut history, Some(2))
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].rebuilt);
        assert_eq!(runner.count_containing("gcc -c"), 2);
        assert_eq!(runner.count_containing("-shared"), 1);
        assert!(!history.compile_changed(&tmp.path().join("obj/a.o"), "fp-a"));
        assert!(!history.link_changed("demo", "fp-link"));

        let alias = tmp.path().join("bin/libdemo.so");
        assert_eq!(std::fs::read_link(&alias).unwrap(), PathBuf::from("libdemo.so.1.0"));
        assert!(OsFileSystem.is_file(&alias));
    }

    #[test]
    fn test_failure_stops_before_link() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner
            .expect_contains("src/bad.c", MockProcessOutput::failure(1, "bad.c:1: error: boom"))
            .expect_prefix("gcc -c", MockProcessOutput::success(""));
        let ctx = context(tmp.path(), Arc::clone(&runner));
        let plan = BuildPlan {
            targets: vec![target(tmp.path(), &["bad"], &[])],
        };

        let mut history = BuildHistory::default();
        let err = NativeBuilder::new(&ctx)
            .execute(&plan, &mut history, Some(1))
            .unwrap_err();

        let build_err = err.downcast_ref::<BuildError>().unwrap();
        match build_err {
            BuildError::ProcessFailed {
                what,
                exit_code,
                output,
                ..
            } => {
                assert_eq!(what, "compiling src/bad.c");
                assert_eq!(*exit_code, Some(1));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.count_containing("-shared"), 0);
        assert!(history.compile.is_empty());
        assert!(history.link.is_empty());
    }

    #[test]
    fn test_no_dispatch_after_failure_with_one_job() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner
            .expect_contains("src/a.c", MockProcessOutput::failure(1, "error"))
            .expect_prefix("gcc -c", MockProcessOutput::success(""));
        let ctx = context(tmp.path(), Arc::clone(&runner));
        let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let plan = BuildPlan {
            targets: vec![target(tmp.path(), &names, &[])],
        };

        let mut history = BuildHistory::default();
        assert!(NativeBuilder::new(&ctx)
            .execute(&plan, &mut history, Some(1))
            .is_err());
        // A single worker runs the failing first compile before any other.
        assert_eq!(runner.count_containing("gcc -c"), 1);
    }

    #[test]
    fn test_fresh_target_runs_nothing() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let ctx = context(tmp.path(), Arc::clone(&runner));
        let mut fresh = target(tmp.path(), &["a"], &[]);
        fresh.compiles[0].reason = None;
        fresh.link.reason = None;
        let plan = BuildPlan {
            targets: vec![fresh],
        };

        let mut history = BuildHistory::default();
        let artifacts = NativeBuilder::new(&ctx)
            .execute(&plan, &mut history, None)
            .unwrap();
        assert!(!artifacts[0].rebuilt);
        assert!(runner.calls().is_empty());
    }
}

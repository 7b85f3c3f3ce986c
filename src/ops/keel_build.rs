//! Implementation of `keel build`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::toolchain::{detect_toolchain, ProbeCache};
use crate::builder::{Artifact, BuildContext, BuildExecutor, BuildHistory, BuildPlan, Planner};
use crate::core::errors::ConfigError;
use crate::core::manifest::Manifest;
use crate::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
};
use crate::util::fs::{FileSystem, OsFileSystem};
use crate::util::process::{CommandRunner, SystemRunner};

/// Where the compilation database is written, relative to the project root.
pub const COMPILE_COMMANDS_FILE: &str = ".keel/compile_commands.json";

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Path to Keel.toml
    pub manifest_path: PathBuf,

    /// Build in release mode
    pub release: bool,

    /// Plan only; report the commands that would run
    pub dry_run: bool,

    /// Specific targets to build (empty = all)
    pub targets: Vec<String>,

    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Emit compile_commands.json
    pub emit_compile_commands: bool,

    /// Verbose output
    pub verbose: bool,
}

/// Result of a build.
#[derive(Debug)]
pub struct BuildResult {
    /// Linked outputs; empty for a dry run
    pub artifacts: Vec<Artifact>,

    pub plan: BuildPlan,
}

/// Create a build context for the project at `root`, detecting the
/// toolchain from configuration, environment and PATH.
pub fn create_context(root: &Path, release: bool) -> Result<BuildContext> {
    let config = load_toolchain_config(
        global_toolchain_config_path().as_deref(),
        &project_toolchain_config_path(root),
    );
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let probes = Arc::new(ProbeCache::new(Arc::clone(&runner)));
    let toolchain = detect_toolchain(&config, &probes)?;
    tracing::debug!("toolchain: {} targeting {}", toolchain.vendor, toolchain.platform);

    let fs: Arc<dyn FileSystem> = Arc::new(OsFileSystem);
    Ok(BuildContext::new(root, release, toolchain, probes, fs, runner))
}

/// Build the project described by `req.manifest_path`.
pub fn build(req: &BuildRequest) -> Result<BuildResult> {
    let manifest = Manifest::load(&req.manifest_path)?;
    let ctx = create_context(&manifest.manifest_dir, req.release)?;
    build_with(&manifest, &ctx, req)
}

/// Build with an explicit context.
pub fn build_with(manifest: &Manifest, ctx: &BuildContext, req: &BuildRequest) -> Result<BuildResult> {
    validate_target_filter(manifest, &req.targets)?;

    let mut history = BuildHistory::load(&ctx.history_path());
    let plan = plan_build(manifest, ctx, &history, &req.targets)?;

    if req.emit_compile_commands {
        let path = ctx.project_root.join(COMPILE_COMMANDS_FILE);
        plan.emit_compile_commands(&ctx.project_root, &path)?;
        tracing::info!("wrote {}", path.display());
    }

    if req.dry_run {
        return Ok(BuildResult {
            artifacts: Vec::new(),
            plan,
        });
    }

    let result = BuildExecutor::new(ctx)
        .verbose(req.verbose)
        .execute(&plan, &mut history, req.jobs);

    // Keep what succeeded even when the build failed.
    if let Err(e) = persist(ctx, &history) {
        tracing::warn!("{:#}", e);
    }

    Ok(BuildResult {
        artifacts: result?,
        plan,
    })
}

/// Plan the selected targets (all when `filter` is empty).
pub fn plan_build(
    manifest: &Manifest,
    ctx: &BuildContext,
    history: &BuildHistory,
    filter: &[String],
) -> Result<BuildPlan> {
    let profile = manifest.profile(ctx.release);
    let version = manifest.version();
    let planner = Planner::new(ctx, history);

    let mut plan = BuildPlan::default();
    for target in &manifest.targets {
        if !filter.is_empty() && !filter.contains(&target.name) {
            continue;
        }
        let target_plan = planner
            .plan_target(target, &profile, version.as_ref())
            .with_context(|| format!("failed to plan target `{}`", target.name))?;
        plan.targets.push(target_plan);
    }
    Ok(plan)
}

/// Command lines of the steps that would run, in execution order.
pub fn dry_run_lines(plan: &BuildPlan) -> Vec<String> {
    let mut lines = Vec::new();
    for target in &plan.targets {
        lines.extend(target.pending_compiles().map(|c| c.command.display()));
        if target.needs_link() {
            lines.push(target.link.command.display());
        }
    }
    lines
}

fn persist(ctx: &BuildContext, history: &BuildHistory) -> Result<()> {
    history.save(&ctx.history_path())?;
    ctx.deps.save(&ctx.deps_path())
}

/// Validate that all requested targets exist.
///
/// This prevents silent no-ops when the user specifies a nonexistent target.
fn validate_target_filter(manifest: &Manifest, targets: &[String]) -> Result<(), ConfigError> {
    let valid = manifest.target_names();
    for requested in targets {
        if !valid.contains(&requested.as_str()) {
            return Err(ConfigError::UnknownTarget {
                name: requested.clone(),
                available: if valid.is_empty() {
                    "(none)".to_string()
                } else {
                    valid.join(", ")
                },
            });
        }
    }
    Ok(())
}

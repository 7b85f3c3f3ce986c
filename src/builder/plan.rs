//! Build plan generation.
//!
//! A [`BuildPlan`] lists, per target, one compile step for every source and
//! one link step. Each step carries its synthesized command and, when it
//! has to run, the reason why. Fresh steps stay in the plan so that tools
//! like `compile_commands.json` see the full picture.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::context::BuildContext;
use crate::builder::history::BuildHistory;
use crate::builder::staleness::{StaleReason, StalenessEngine};
use crate::builder::synth::CommandSynthesizer;
use crate::builder::toolchain::{
    locate_library, Classification, CommandSpec, LinkerDescriptor, LinkerVariant, SOURCE_BID,
};
use crate::core::capability::CapabilityModel;
use crate::core::errors::ConfigError;
use crate::core::manifest::{Profile, Target};
use crate::core::options::LibrarySet;
use crate::core::source::Language;
use crate::deps::SearchPath;
use crate::util::fs::{glob_files, normalize_lexical, relative_path, write_string};

/// Compile one source into one object.
#[derive(Debug, Clone)]
pub struct CompileStep {
    pub source: PathBuf,
    pub object: PathBuf,
    pub language: Language,
    pub command: CommandSpec,
    pub fingerprint: String,
    /// `None` when the object is up to date
    pub reason: Option<StaleReason>,
}

/// Link (or archive) a target's objects.
#[derive(Debug, Clone)]
pub struct LinkStep {
    pub output: PathBuf,
    /// Symlinks to create next to the output after linking
    pub aliases: Vec<PathBuf>,
    pub command: CommandSpec,
    pub fingerprint: String,
    /// Objects and located libraries
    pub inputs: Vec<PathBuf>,
    pub reason: Option<StaleReason>,
}

/// Everything needed to bring one target up to date.
#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub name: String,
    pub capability: CapabilityModel,
    pub compiles: Vec<CompileStep>,
    pub link: LinkStep,
}

impl TargetPlan {
    pub fn pending_compiles(&self) -> impl Iterator<Item = &CompileStep> {
        self.compiles.iter().filter(|c| c.reason.is_some())
    }

    pub fn needs_link(&self) -> bool {
        self.link.reason.is_some()
    }
}

/// A complete build plan.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub targets: Vec<TargetPlan>,
}

impl BuildPlan {
    /// Compile steps that have to run.
    pub fn compile_count(&self) -> usize {
        self.targets.iter().map(|t| t.pending_compiles().count()).sum()
    }

    /// Link steps that have to run.
    pub fn link_count(&self) -> usize {
        self.targets.iter().filter(|t| t.needs_link()).count()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.compile_count() == 0 && self.link_count() == 0
    }

    /// Write every compile command as a JSON compilation database.
    pub fn emit_compile_commands(&self, root: &Path, path: &Path) -> Result<()> {
        let commands: Vec<CompileCommand> = self
            .targets
            .iter()
            .flat_map(|t| &t.compiles)
            .map(|step| {
                let pb = step.command.to_process_builder();
                let mut arguments = vec![pb.get_program().display().to_string()];
                arguments.extend(pb.get_args().iter().cloned());
                CompileCommand {
                    directory: root.display().to_string(),
                    file: step.source.display().to_string(),
                    arguments,
                    output: step.object.display().to_string(),
                }
            })
            .collect();

        let json = serde_json::to_string_pretty(&commands)?;
        write_string(path, &json)
    }
}

#[derive(Serialize)]
struct CompileCommand {
    directory: String,
    file: String,
    arguments: Vec<String>,
    output: String,
}

/// Plans targets against one build context.
pub struct Planner<'a> {
    ctx: &'a BuildContext,
    history: &'a BuildHistory,
    synth: CommandSynthesizer,
}

impl<'a> Planner<'a> {
    pub fn new(ctx: &'a BuildContext, history: &'a BuildHistory) -> Self {
        Planner {
            ctx,
            history,
            synth: CommandSynthesizer::for_toolchain(&ctx.toolchain),
        }
    }

    /// Plan one target.
    pub fn plan_target(
        &self,
        target: &Target,
        profile: &Profile,
        project_version: Option<&semver::Version>,
    ) -> Result<TargetPlan> {
        let ctx = self.ctx;
        let toolchain = ctx.toolchain.as_ref();
        let root = &ctx.project_root;

        let capability = target.capability();
        let options = target.options(profile, &ctx.properties(), root);
        options.validate()?;

        let sources = glob_files(root, &target.sources)
            .with_context(|| format!("failed to expand sources of `{}`", target.name))?;
        if sources.is_empty() {
            return Err(ConfigError::NoSources(target.name.clone()).into());
        }

        let linker = toolchain.linker(&capability);
        let engine = StalenessEngine::new(
            Arc::clone(&ctx.fs),
            Arc::clone(&ctx.deps),
            SearchPath::new(options.include_dirs.iter().cloned()),
        );
        let obj_dir = ctx.obj_dir(&target.name);

        let mut compiles = Vec::new();
        let mut objects = Vec::new();
        let mut languages = Vec::new();

        for source in &sources {
            match toolchain.registry.classify(source) {
                Classification::Source => {}
                Classification::Header => continue,
                Classification::Unknown => {
                    let ext = source
                        .extension()
                        .map(|e| e.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if linker.bid(&ext) == SOURCE_BID {
                        tracing::debug!("{} goes straight to the link", source.display());
                        objects.push(source.clone());
                    } else {
                        tracing::debug!("nothing bids on {}, skipping", source.display());
                    }
                    continue;
                }
            }
            let Some(processor) = toolchain.registry.select(source) else {
                continue;
            };

            let mut name = object_name(root, source);
            name.push(processor.object_suffix);
            let object = obj_dir.join(name);

            let command =
                self.synth
                    .compile_command(toolchain, processor, &capability, &options, source, &object);
            let fingerprint = BuildHistory::fingerprint(&command);
            let reason = engine.explain(source, &object).or_else(|| {
                self.history
                    .compile_changed(&object, &fingerprint)
                    .then_some(StaleReason::OptionsChanged)
            });
            if let Some(reason) = &reason {
                tracing::debug!("{}: {}", source.display(), reason);
            }

            if !languages.contains(&processor.language) {
                languages.push(processor.language);
            }
            objects.push(object.clone());
            compiles.push(CompileStep {
                source: source.clone(),
                object,
                language: processor.language,
                command,
                fingerprint,
                reason,
            });
        }

        let version = target.library_version(project_version);
        let names = linker.output_names(toolchain.platform, &target.name, version.as_ref());
        let bin_dir = ctx.bin_dir();
        let output = bin_dir.join(&names.primary);
        let aliases = names.aliases.iter().map(|a| bin_dir.join(a)).collect();

        let command = self.synth.link_command(
            toolchain,
            linker,
            &capability,
            &options,
            &objects,
            &languages,
            &output,
            &names,
            version.as_ref(),
        );
        let fingerprint = BuildHistory::fingerprint(&command);

        let mut inputs = objects.clone();
        if linker.variant != LinkerVariant::Librarian {
            inputs.extend(self.locate_libraries(linker, &options.library_sets));
        }

        let reason = if compiles.iter().any(|c| c.reason.is_some()) {
            Some(StaleReason::InputRebuilt)
        } else {
            engine.explain_link(&output, &inputs)
        }
        .or_else(|| {
            self.history
                .link_changed(&target.name, &fingerprint)
                .then_some(StaleReason::OptionsChanged)
        });

        Ok(TargetPlan {
            name: target.name.clone(),
            capability,
            compiles,
            link: LinkStep {
                output,
                aliases,
                command,
                fingerprint,
                inputs,
                reason,
            },
        })
    }

    /// Library files the link will read, where they can be found.
    fn locate_libraries(
        &self,
        linker: &LinkerDescriptor,
        sets: &[LibrarySet],
    ) -> Vec<PathBuf> {
        let platform = self.ctx.toolchain.platform;
        let mut defaults: Option<Vec<PathBuf>> = None;
        let mut found = Vec::new();

        for set in sets {
            let dirs = match &set.dir {
                Some(dir) => vec![dir.clone()],
                None => defaults
                    .get_or_insert_with(|| self.ctx.default_library_dirs())
                    .clone(),
            };
            for name in &set.names {
                let patterns = linker.library_patterns(name, set.kind, platform);
                match locate_library(self.ctx.fs.as_ref(), &dirs, &patterns) {
                    Some(path) => found.push(path),
                    None => tracing::debug!("library `{}` not found, left to the linker", name),
                }
            }
        }
        found
    }
}

/// Object file name for a source, relative to the object directory.
///
/// Mirrors the source's normalized path under `root`. Parent steps left
/// over become `__` and root or drive prefixes are dropped, so every object stays inside the
/// object directory.
fn object_name(root: &Path, source: &Path) -> OsString {
    let mut name = PathBuf::new();
    for comp in relative_path(root, &normalize_lexical(source)).components() {
        match comp {
            Component::Normal(part) => name.push(part),
            Component::ParentDir => name.push("__"),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    name.into_os_string()
}

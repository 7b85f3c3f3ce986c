//! CLI argument definitions using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use keel::builder::toolchain::{TargetPlatform, VendorKind};
use keel::core::capability::OutputKind;
use keel::core::options::Optimization;

/// Keel - a build driver for C, C++ and Fortran
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile and link the targets in Keel.toml
    Build(BuildArgs),

    /// Explain why each target would be rebuilt
    Explain(ExplainArgs),

    /// List the include directives of a source file
    Scan(ScanArgs),

    /// Show the transitive include closure of a source file
    Deps(DepsArgs),

    /// Print the arguments a vendor would be given for a file list
    Flags(FlagsArgs),

    /// Show or override the detected toolchain
    Toolchain(ToolchainArgs),

    /// Remove build outputs
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build in release mode
    #[arg(short, long)]
    pub release: bool,

    /// Build only the specified target(s)
    #[arg(long)]
    pub target: Vec<String>,

    /// Print the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write .keel/compile_commands.json
    #[arg(long)]
    pub emit_compile_commands: bool,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Explain the release profile
    #[arg(short, long)]
    pub release: bool,

    /// Only the specified target(s)
    #[arg(long)]
    pub target: Vec<String>,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Source or header file to scan
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Source file whose closure to compute
    pub file: PathBuf,

    /// Include search directory, searched in order
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,

    /// Also list includes that could not be found
    #[arg(long)]
    pub unresolved: bool,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Files to synthesize arguments for
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Compiler vendor (gcc, clang, msvc, intel, ...)
    #[arg(long, default_value = "gcc")]
    pub vendor: VendorKind,

    /// Target platform (defaults to the host)
    #[arg(long)]
    pub platform: Option<TargetPlatform>,

    /// Kind of output the files end up in
    #[arg(long, value_enum, default_value_t = KindArg::Exe)]
    pub kind: KindArg,

    /// Define a macro (NAME or NAME=VALUE)
    #[arg(short = 'D', long = "define")]
    pub define: Vec<String>,

    /// Undefine a macro
    #[arg(short = 'U', long = "undefine")]
    pub undefine: Vec<String>,

    /// Include directory
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,

    /// Library to link
    #[arg(short = 'l', long = "lib")]
    pub lib: Vec<String>,

    /// Directory of the libraries given with -l
    #[arg(short = 'L', long = "lib-dir")]
    pub lib_dir: Option<PathBuf>,

    /// Warning level, 0 to 5; out-of-range levels are clamped
    #[arg(long, allow_negative_numbers = true)]
    pub warnings: Option<i32>,

    /// Optimization goal
    #[arg(long, value_enum)]
    pub optimize: Option<OptArg>,

    /// Emit debug information
    #[arg(short = 'g', long)]
    pub debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Exe,
    Shared,
    Static,
    Plugin,
}

impl From<KindArg> for OutputKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Exe => OutputKind::Executable,
            KindArg::Shared => OutputKind::Shared,
            KindArg::Static => OutputKind::Static,
            KindArg::Plugin => OutputKind::Plugin,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OptArg {
    Size,
    Speed,
    Full,
    Extreme,
}

impl From<OptArg> for Optimization {
    fn from(opt: OptArg) -> Self {
        match opt {
            OptArg::Size => Optimization::Size,
            OptArg::Speed => Optimization::Speed,
            OptArg::Full => Optimization::Full,
            OptArg::Extreme => Optimization::Extreme,
        }
    }
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: ToolchainCommands,
}

#[derive(Subcommand)]
pub enum ToolchainCommands {
    /// Show the toolchain a build would use
    Show,

    /// Pin toolchain settings in .keel/toolchain.toml
    Override(ToolchainOverrideArgs),
}

#[derive(Args)]
pub struct ToolchainOverrideArgs {
    /// Vendor to use without detection
    #[arg(long)]
    pub vendor: Option<VendorKind>,

    /// Target platform
    #[arg(long)]
    pub platform: Option<TargetPlatform>,

    /// C compiler path
    #[arg(long)]
    pub cc: Option<PathBuf>,

    /// C++ compiler path
    #[arg(long)]
    pub cxx: Option<PathBuf>,

    /// Fortran compiler path
    #[arg(long)]
    pub fc: Option<PathBuf>,

    /// Archiver path
    #[arg(long)]
    pub ar: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Only remove release outputs
    #[arg(long, conflicts_with = "debug")]
    pub release: bool,

    /// Only remove debug outputs
    #[arg(long)]
    pub debug: bool,

    /// Also remove the dependency cache and build history
    #[arg(long)]
    pub caches: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

//! Native build engine.
//!
//! Toolchain tables and command synthesis, staleness decisions, build
//! planning and execution.

pub mod context;
pub mod errors;
pub mod executor;
pub mod history;
pub mod native;
pub mod plan;
pub mod staleness;
pub mod synth;
pub mod toolchain;

pub use context::BuildContext;
pub use errors::BuildError;
pub use executor::BuildExecutor;
pub use history::BuildHistory;
pub use native::{Artifact, NativeBuilder};
pub use plan::{BuildPlan, Planner};
pub use staleness::{StaleReason, StalenessEngine};
pub use synth::CommandSynthesizer;
pub use toolchain::{detect_toolchain, CommandSpec, Toolchain, VendorKind};

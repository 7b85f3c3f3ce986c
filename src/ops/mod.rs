//! High-level operations.
//!
//! This module contains the implementation of keel commands.

pub mod keel_build;
pub mod keel_clean;

pub use keel_build::{build, dry_run_lines, BuildRequest, BuildResult};
pub use keel_clean::{clean, CleanOptions};

//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod deps;
pub mod explain;
pub mod flags;
pub mod scan;
pub mod toolchain;

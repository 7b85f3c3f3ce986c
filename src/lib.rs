//! keel - a native build driver for C, C++ and Fortran
//!
//! This crate provides the library behind the `keel` binary: include
//! scanning, dependency caching, staleness decisions and per-vendor
//! command synthesis.

pub mod builder;
pub mod core;
pub mod deps;
pub mod ops;
pub mod scanner;
pub mod util;

/// Test utilities and mocks for keel unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for filesystem access
/// and process execution.
#[cfg(test)]
pub mod test_support;

pub use crate::builder::toolchain::Toolchain;
pub use crate::core::manifest::Manifest;
pub use crate::deps::DependencyCache;

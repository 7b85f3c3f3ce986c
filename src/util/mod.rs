//! Shared utilities

pub mod config;
pub mod fs;
pub mod hash;
pub mod process;

pub use config::ToolchainConfig;
pub use fs::{FileSystem, OsFileSystem};
pub use process::{CommandRunner, ProcessBuilder, SystemRunner};

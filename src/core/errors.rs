//! Configuration errors.
//!
//! These are raised while a target's capability model and build options are
//! checked, before anything is scanned or synthesized. They are fatal to the
//! target being configured and to nothing else.

use thiserror::Error;

/// A malformed or contradictory target configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("define operation has an empty macro name")]
    EmptyDefineName,

    #[error("invalid macro name `{0}`: macro names cannot contain whitespace or `=`")]
    InvalidDefineName(String),

    #[error("undefine of `{0}` cannot carry a value")]
    UndefineWithValue(String),

    #[error("include directory list contains an empty entry")]
    EmptyIncludeDir,

    #[error("library set contains an empty library name")]
    EmptyLibraryName,

    #[error("invalid library version `{0}`: expected dot-separated numbers such as 1.2.3")]
    InvalidVersion(String),

    #[error("target `{0}` has no sources")]
    NoSources(String),

    #[error("unknown target `{name}`, available targets: {available}")]
    UnknownTarget { name: String, available: String },
}

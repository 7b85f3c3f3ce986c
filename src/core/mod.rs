//! Core data structures for keel.
//!
//! Target descriptions as the build engine sees them: the capability
//! model, build options, source files and the Keel.toml manifest.

pub mod capability;
pub mod errors;
pub mod manifest;
pub mod options;
pub mod source;

pub use capability::{CapabilityModel, OutputKind};
pub use errors::ConfigError;
pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
pub use options::BuildOptions;
pub use source::{Language, SourceFile};

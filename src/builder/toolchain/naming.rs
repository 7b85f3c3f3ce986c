//! Output file naming and library versioning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;

/// A library version such as `1.2.3`: dot-separated non-negative integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryVersion {
    parts: Vec<u32>,
}

impl LibraryVersion {
    pub fn major(&self) -> u32 {
        self.parts[0]
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts
    }
}

impl FromStr for LibraryVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Option<Vec<u32>> = s.split('.').map(|p| p.parse().ok()).collect();
        match parts {
            Some(parts) if !parts.is_empty() => Ok(LibraryVersion { parts }),
            _ => Err(ConfigError::InvalidVersion(s.to_string())),
        }
    }
}

impl TryFrom<String> for LibraryVersion {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LibraryVersion> for String {
    fn from(v: LibraryVersion) -> Self {
        v.to_string()
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.parts.iter().map(u32::to_string).collect();
        f.write_str(&text.join("."))
    }
}

/// Where a version goes in a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Versioning {
    /// Version is ignored
    Unversioned,
    /// Appended after the suffix: `libfoo.so.1.2.3`
    Elf,
    /// Inserted before the suffix: `libfoo.1.2.3.dylib`
    Darwin,
}

/// Prefix, suffix and versioning rule of one output kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputNaming {
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub versioning: Versioning,
}

/// File names produced by one link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputNames {
    /// The file the linker writes
    pub primary: String,
    /// Links to create next to the primary, pointing at it
    pub aliases: Vec<String>,
    /// Name embedded in the library for the runtime loader
    pub soname: Option<String>,
}

impl OutputNaming {
    pub const fn new(prefix: &'static str, suffix: &'static str) -> Self {
        OutputNaming {
            prefix,
            suffix,
            versioning: Versioning::Unversioned,
        }
    }

    pub const fn versioned(mut self, versioning: Versioning) -> Self {
        self.versioning = versioning;
        self
    }

    pub fn names(&self, base: &str, version: Option<&LibraryVersion>) -> OutputNames {
        let plain = format!("{}{}{}", self.prefix, base, self.suffix);
        let Some(version) = version else {
            return OutputNames {
                primary: plain,
                ..Default::default()
            };
        };

        match self.versioning {
            Versioning::Unversioned => OutputNames {
                primary: plain,
                ..Default::default()
            },
            Versioning::Elf => {
                let primary = format!("{plain}.{version}");
                let soname = format!("{plain}.{}", version.major());
                let mut aliases = Vec::new();
                if soname != primary {
                    aliases.push(soname.clone());
                }
                aliases.push(plain);
                OutputNames {
                    primary,
                    aliases,
                    soname: Some(soname),
                }
            }
            Versioning::Darwin => OutputNames {
                primary: format!("{}{}.{}{}", self.prefix, base, version, self.suffix),
                aliases: vec![plain],
                soname: None,
            },
        }
    }
}

//! Fingerprints of command lines and search paths.

use std::path::Path;

use sha2::{Digest, Sha256};

/// A hasher for building fingerprints from multiple components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Create a new fingerprint builder.
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component to the fingerprint.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0"); // Separator
        self
    }

    /// Add multiple strings to the fingerprint.
    pub fn update_strs<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for s in items {
            self.update_str(s);
        }
        self
    }

    /// Add a path component (lossy on non-UTF-8 platforms).
    pub fn update_path(&mut self, path: &Path) -> &mut Self {
        self.update_str(&path.to_string_lossy())
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    /// Finalize and return a short fingerprint (first 16 chars).
    pub fn finish_short(self) -> String {
        self.finish()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let mut fp = Fingerprint::new();
        fp.update_str("hello");
        let digest = fp.finish();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_separates_components() {
        let joined = {
            let mut fp = Fingerprint::new();
            fp.update_str("ab");
            fp.finish()
        };
        let split = {
            let mut fp = Fingerprint::new();
            fp.update_str("a").update_str("b");
            fp.finish()
        };
        assert_ne!(joined, split);
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let fp1 = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["-g", "-Wall"]);
            fp.finish_short()
        };
        let fp2 = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["-Wall", "-g"]);
            fp.finish_short()
        };
        assert_eq!(fp1.len(), 16);
        assert_ne!(fp1, fp2);
    }
}

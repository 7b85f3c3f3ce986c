//! Processor bid registry.
//!
//! Maps a file to the processor that should handle it. Every registered
//! processor bids on the file's extension and the highest bid wins. On a
//! tie the processor registered first wins, so registration order is part
//! of a toolchain's definition.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use super::{ProcessorDescriptor, VendorKind, HEADER_BID, NO_BID, SOURCE_BID};

/// What the registry makes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Compiled by some processor
    Source,
    /// Understood, but only as a dependency
    Header,
    /// No processor wants it
    Unknown,
}

/// Ordered set of processors plus an extension lookup cache.
#[derive(Debug)]
pub struct ProcessorRegistry {
    processors: Vec<ProcessorDescriptor>,
    /// Lowercased extension to winning index (`None`: nobody bid)
    cache: RwLock<HashMap<String, Option<usize>>>,
}

impl ProcessorRegistry {
    pub fn new(processors: Vec<ProcessorDescriptor>) -> Self {
        ProcessorRegistry {
            processors,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// All processors of one vendor, in the vendor's registration order.
    pub fn for_vendor(vendor: VendorKind) -> Self {
        Self::new(vendor.processors().to_vec())
    }

    /// A vendor's processors with those of `variant` moved to the front, so
    /// they win ties.
    pub fn for_vendor_variant(vendor: VendorKind, variant: &str) -> Self {
        let mut processors = vendor.processors().to_vec();
        processors.sort_by_key(|p| p.variant != variant);
        Self::new(processors)
    }

    pub fn processors(&self) -> &[ProcessorDescriptor] {
        &self.processors
    }

    /// The highest-bidding processor for `path`, or `None` if nobody bids.
    pub fn select(&self, path: &Path) -> Option<&ProcessorDescriptor> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ext)
        {
            return hit.map(|i| &self.processors[i]);
        }

        let winner = self.auction(&ext);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ext, winner);
        winner.map(|i| &self.processors[i])
    }

    /// Linear scan; a later processor must strictly outbid to win.
    fn auction(&self, ext: &str) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, processor) in self.processors.iter().enumerate() {
            let bid = processor.bid(ext);
            if bid > best.map_or(NO_BID, |(_, b)| b) {
                best = Some((i, bid));
            }
        }
        best.map(|(i, _)| i)
    }

    /// The winning bid for `path`.
    pub fn bid(&self, path: &Path) -> u32 {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        self.select(path).map_or(NO_BID, |p| p.bid(&ext))
    }

    pub fn classify(&self, path: &Path) -> Classification {
        match self.bid(path) {
            b if b >= SOURCE_BID => Classification::Source,
            b if b >= HEADER_BID => Classification::Header,
            _ => Classification::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::Language;

    #[test]
    fn test_gcc_selects_by_extension() {
        let reg = ProcessorRegistry::for_vendor(VendorKind::Gcc);
        assert_eq!(reg.select(Path::new("a.c")).unwrap().language, Language::C);
        assert_eq!(reg.select(Path::new("a.cpp")).unwrap().language, Language::Cxx);
        assert_eq!(reg.select(Path::new("a.f90")).unwrap().language, Language::Fortran);
        assert!(reg.select(Path::new("README.md")).is_none());
        assert!(reg.select(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let reg = ProcessorRegistry::for_vendor(VendorKind::Gcc);
        assert_eq!(reg.select(Path::new("A.CPP")).unwrap().language, Language::Cxx);
        assert_eq!(reg.select(Path::new("solve.F90")).unwrap().language, Language::Fortran);
    }

    #[test]
    fn test_classification() {
        let reg = ProcessorRegistry::for_vendor(VendorKind::Gcc);
        assert_eq!(reg.classify(Path::new("x.c")), Classification::Source);
        assert_eq!(reg.classify(Path::new("x.hpp")), Classification::Header);
        assert_eq!(reg.classify(Path::new("x.txt")), Classification::Unknown);
        assert_eq!(reg.bid(Path::new("x.c")), SOURCE_BID);
        assert_eq!(reg.bid(Path::new("x.h")), HEADER_BID);
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        // Both C and C++ processors bid HEADER_BID on ".h".
        let reg = ProcessorRegistry::for_vendor(VendorKind::Gcc);
        let first_header_bidder = reg
            .processors()
            .iter()
            .find(|p| p.bid("h") == HEADER_BID)
            .unwrap();
        assert_eq!(
            reg.select(Path::new("x.h")).unwrap().program,
            first_header_bidder.program
        );

        let mut reversed = VendorKind::Gcc.processors().to_vec();
        reversed.reverse();
        let reg = ProcessorRegistry::new(reversed);
        let expected = reg
            .processors()
            .iter()
            .find(|p| p.bid("h") == HEADER_BID)
            .unwrap()
            .program;
        assert_eq!(reg.select(Path::new("x.h")).unwrap().program, expected);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let reg = ProcessorRegistry::for_vendor(VendorKind::Gcc);
        let first = reg.select(Path::new("x.cc")).map(|p| p.program);
        for _ in 0..10 {
            assert_eq!(reg.select(Path::new("y.cc")).map(|p| p.program), first);
        }
    }

    #[test]
    fn test_arm_variant_order() {
        let reg = ProcessorRegistry::for_vendor(VendorKind::Arm);
        assert_eq!(reg.select(Path::new("m.c")).unwrap().variant, "arm32");

        let reg = ProcessorRegistry::for_vendor_variant(VendorKind::Arm, "thumb");
        assert_eq!(reg.select(Path::new("m.c")).unwrap().variant, "thumb");
    }
}

//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the model's feature schema.**
//!
//! Adding, removing or reordering a feature requires bumping
//! `FEATURE_VERSION`: persisted bundles carry the version and layout hash,
//! and are rejected when they no longer match.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact column order of the feature matrix
pub const FEATURE_LAYOUT: &[&str] = &[
    "dur",      // 0: flow duration (seconds)
    "spkts",    // 1: source packets
    "dpkts",    // 2: destination packets
    "sbytes",   // 3: source bytes
    "dbytes",   // 4: destination bytes
    "rate",     // 5: flow rate
    "sttl",     // 6: source TTL
    "dttl",     // 7: destination TTL
];

/// Total number of features
/// Must match FEATURE_LAYOUT.len()
pub const FEATURE_COUNT: usize = 8;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the version and the ordered feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout stamp written into persisted model artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Same version and same hash as the running build
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION && self.hash == layout_hash()
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_layout_info_compatibility() {
        let mut info = LayoutInfo::current();
        assert!(info.is_compatible());
        assert_eq!(info.feature_names.len(), FEATURE_COUNT);

        info.version += 1;
        assert!(!info.is_compatible());

        let mut info = LayoutInfo::current();
        info.hash = !info.hash;
        assert!(!info.is_compatible());
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("dur"), Some(0));
        assert_eq!(feature_index("rate"), Some(5));
        assert_eq!(feature_index("dttl"), Some(7));
        assert_eq!(feature_index("label"), None);
    }
}

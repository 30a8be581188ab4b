//! Seed management for map generation.
//!
//! A single master seed drives the whole build. Sub-seeds for independent
//! systems (noise fields, speculative cache copies) are derived from it by
//! hashing, so varying one system never perturbs another and a map id alone
//! reproduces a build.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash a map id string into a master seed.
///
/// The same id always yields the same seed, so builds addressed by id are
/// reproducible without carrying the numeric seed around.
pub fn stable_seed(map_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    map_id.hash(&mut hasher);
    hasher.finish()
}

/// Derive a sub-seed from a master seed and a system label.
pub fn derive_seed(master: u64, system: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    system.hash(&mut hasher);
    hasher.finish()
}

/// Derive a sub-seed from a master seed and a numeric offset.
///
/// Used by speculative cache copies: each copy branches its RNG stream on
/// `(seed, offset)` so retries with different offsets diverge deterministically.
pub fn derive_seed_offset(master: u64, offset: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    offset.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_seed_deterministic() {
        assert_eq!(stable_seed("village_01"), stable_seed("village_01"));
        assert_ne!(stable_seed("village_01"), stable_seed("village_02"));
    }

    #[test]
    fn test_derive_seed_varies_by_label() {
        let master = 12345;
        assert_ne!(derive_seed(master, "noise"), derive_seed(master, "copy"));
        assert_eq!(derive_seed(master, "noise"), derive_seed(master, "noise"));
    }

    #[test]
    fn test_offset_derivation_diverges() {
        let master = 42;
        assert_ne!(derive_seed_offset(master, 0), derive_seed_offset(master, 1));
        assert_eq!(derive_seed_offset(master, 3), derive_seed_offset(master, 3));
    }
}

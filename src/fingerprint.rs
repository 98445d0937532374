//! Fingerprint derivation
//!
//! Splits a mixed 64-bit hash into a primary bucket index (low bits) and an
//! `f`-bit fingerprint (high half). The alternate bucket is derived from the
//! fingerprint alone (partial-key cuckoo hashing), which is what lets the
//! engine relocate and delete entries without knowing their keys.

use crate::config::Geometry;
use crate::hash::hash_fingerprint;

/// Slot value reserved for "empty"
pub const EMPTY: u32 = 0;

/// Candidate buckets and fingerprint for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidates {
    pub primary: usize,
    pub alternate: usize,
    pub fingerprint: u32,
}

/// Truncate a hash to an `f`-bit fingerprint, never [`EMPTY`]
#[inline]
pub fn fingerprint_from_hash(hash: u64, geometry: &Geometry) -> u32 {
    let fingerprint = (hash >> 32) as u32 & geometry.fingerprint_mask();
    // 0 marks an empty slot, so it cannot be a fingerprint
    fingerprint.max(1)
}

/// The other candidate bucket of `fingerprint` when it sits in `index`
///
/// An involution: `alternate_index(alternate_index(i, fp), fp) == i`.
#[inline]
pub fn alternate_index(index: usize, fingerprint: u32, geometry: &Geometry) -> usize {
    ((index as u64 ^ hash_fingerprint(fingerprint)) & geometry.index_mask()) as usize
}

/// Derive `(i1, i2, fp)` from an already mixed key hash
#[inline]
pub fn derive(hash: u64, geometry: &Geometry) -> Candidates {
    let fingerprint = fingerprint_from_hash(hash, geometry);
    let primary = (hash & geometry.index_mask()) as usize;
    Candidates {
        primary,
        alternate: alternate_index(primary, fingerprint, geometry),
        fingerprint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_never_empty() {
        let geometry = Geometry::new(16, 4, 8).unwrap();

        // High half truncates to 0 -> forced to 1
        assert_eq!(fingerprint_from_hash(0, &geometry), 1);
        assert_eq!(fingerprint_from_hash(0x0000_0100_0000_0000, &geometry), 1);
        assert_eq!(fingerprint_from_hash(0x0000_00ab_0000_0000, &geometry), 0xab);

        let wide = Geometry::new(16, 4, 32).unwrap();
        assert_eq!(fingerprint_from_hash(u64::MAX, &wide), u32::MAX);
    }

    #[test]
    fn test_alternate_index_is_involution() {
        let geometry = Geometry::new(1024, 4, 12).unwrap();
        for index in [0usize, 1, 17, 511, 1023] {
            for fingerprint in [1u32, 2, 0x7ff, 0xfff] {
                let other = alternate_index(index, fingerprint, &geometry);
                assert!(other < 1024);
                assert_eq!(alternate_index(other, fingerprint, &geometry), index);
            }
        }
    }

    #[test]
    fn test_derive_uses_low_bits_for_primary() {
        let geometry = Geometry::new(8, 4, 16).unwrap();
        let hash = 0x1234_5678_9abc_def5;
        let candidates = derive(hash, &geometry);

        assert_eq!(candidates.primary, 5);
        assert_eq!(candidates.fingerprint, 0x5678);
        assert_eq!(
            candidates.alternate,
            alternate_index(5, 0x5678, &geometry)
        );
    }

    #[test]
    fn test_single_bucket_geometry() {
        let geometry = Geometry::new(1, 4, 8).unwrap();
        let candidates = derive(u64::MAX, &geometry);
        assert_eq!(candidates.primary, 0);
        assert_eq!(candidates.alternate, 0);
    }
}

//! Hash functions for cuckoo filters
//!
//! Keys arrive as caller-hashed `u64` values. Before they are split into a
//! bucket index and a fingerprint they are passed through a [`HashFunction`]
//! so that sequential or low-entropy keys still spread over the table.

use crate::{CuckooError, Result};
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

/// Trait for the key mixers used by cuckoo filters
pub trait HashFunction: Send + Sync {
    /// Mix a 64-bit key into a 64-bit hash
    fn hash(&self, key: u64) -> u64;

    /// Get a name/identifier for this hash function
    fn name(&self) -> String;
}

/// The 64-bit finalizer of MurmurHash3 (`fmix64`)
///
/// A bijection on `u64` with full avalanche, which makes it a good default
/// for keys that were hashed by something weak (or not hashed at all).
#[derive(Debug, Clone, Copy, Default)]
pub struct Fmix64;

impl HashFunction for Fmix64 {
    fn hash(&self, key: u64) -> u64 {
        let mut k = key;
        k ^= k >> 33;
        k = k.wrapping_mul(0xff51afd7ed558ccd);
        k ^= k >> 33;
        k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
        k ^= k >> 33;
        k
    }

    fn name(&self) -> String {
        "fmix64".to_string()
    }
}

/// Linear hash function: h(x) = a * x, folded so the high half reaches the low bits
/// Where 'a' must be odd for the function to be bijective
#[derive(Debug, Clone)]
pub struct LinearHash {
    multiplier: u64,
}

impl LinearHash {
    /// Create a new linear hash function with the given multiplier
    /// The multiplier must be odd to ensure bijectivity
    pub fn new(multiplier: u64) -> Result<Self> {
        if multiplier % 2 == 0 {
            return Err(CuckooError::InvalidParameter(
                "Linear hash multiplier must be odd".to_string(),
            ));
        }
        Ok(LinearHash { multiplier })
    }

    /// Create a linear hash with a random odd multiplier
    pub fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let multiplier = rng.gen_range(3..=u64::MAX) | 1; // Ensure odd
        LinearHash { multiplier }
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }
}

impl HashFunction for LinearHash {
    fn hash(&self, key: u64) -> u64 {
        let product = self.multiplier.wrapping_mul(key);
        product ^ (product >> 32)
    }

    fn name(&self) -> String {
        format!("linear{}", self.multiplier)
    }
}

/// Hash a fingerprint for the partial-key alternate bucket computation
///
/// FNV-1a over the little-endian bytes of the fingerprint. Only the
/// fingerprint goes in, never the key, so an evicted fingerprint can always
/// find its other bucket.
#[inline]
pub fn hash_fingerprint(fingerprint: u32) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(&fingerprint.to_le_bytes());
    hasher.finish()
}

/// Hash an arbitrary item into a `u64` key suitable for a cuckoo filter
pub fn hash_item<T: Hash + ?Sized>(item: &T) -> u64 {
    let mut hasher = FnvHasher::default();
    item.hash(&mut hasher);
    hasher.finish()
}

//! Filter configuration and table geometry
//!
//! A [`CuckooConfig`] carries the tunables (slot count per bucket,
//! fingerprint width, target load factor, kick bound, PRNG seed). A
//! [`Geometry`] is the concrete table shape resolved from a capacity hint
//! and a config; two identical inputs always resolve to the same geometry.

use crate::{CuckooError, Result};

/// Each bucket holds 4 fingerprints unless configured otherwise
pub const DEFAULT_SLOTS_PER_BUCKET: usize = 4;
pub const DEFAULT_FINGERPRINT_BITS: u32 = 16;
/// A (2, 4) cuckoo filter reliably reaches ~95% occupancy
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.95;
pub const DEFAULT_MAX_KICKS: usize = 500;
pub const DEFAULT_SEED: u64 = 0x2545_f491_4f6c_dd1d;

pub const MAX_SLOTS_PER_BUCKET: usize = 16;
/// Fingerprints are stored in a `u32`
pub const MAX_FINGERPRINT_BITS: u32 = 32;

/// Tunables for a cuckoo filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuckooConfig {
    /// Slots per bucket (`b`)
    pub slots_per_bucket: usize,
    /// Fingerprint width in bits (`f`)
    pub fingerprint_bits: u32,
    /// Fraction of slots the capacity hint is allowed to fill
    pub max_load_factor: f64,
    /// Upper bound on the eviction chain length (`K`)
    pub max_kicks: usize,
    /// Seed for the eviction PRNG
    pub seed: u64,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        CuckooConfig {
            slots_per_bucket: DEFAULT_SLOTS_PER_BUCKET,
            fingerprint_bits: DEFAULT_FINGERPRINT_BITS,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            max_kicks: DEFAULT_MAX_KICKS,
            seed: DEFAULT_SEED,
        }
    }
}

impl CuckooConfig {
    /// 8-bit fingerprints, ~3% false positive rate at full load
    pub fn fp8() -> Self {
        CuckooConfig::default().with_fingerprint_bits(8)
    }

    /// 16-bit fingerprints, ~0.01% false positive rate at full load
    pub fn fp16() -> Self {
        CuckooConfig::default().with_fingerprint_bits(16)
    }

    /// 32-bit fingerprints
    pub fn fp32() -> Self {
        CuckooConfig::default().with_fingerprint_bits(32)
    }

    pub fn with_slots_per_bucket(mut self, slots_per_bucket: usize) -> Self {
        self.slots_per_bucket = slots_per_bucket;
        self
    }

    pub fn with_fingerprint_bits(mut self, fingerprint_bits: u32) -> Self {
        self.fingerprint_bits = fingerprint_bits;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn with_max_kicks(mut self, max_kicks: usize) -> Self {
        self.max_kicks = max_kicks;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every tunable against its allowed range
    pub fn validate(&self) -> Result<()> {
        validate_slots_per_bucket(self.slots_per_bucket)?;
        validate_fingerprint_bits(self.fingerprint_bits)?;
        if !self.max_load_factor.is_finite()
            || self.max_load_factor <= 0.0
            || self.max_load_factor > 1.0
        {
            return Err(CuckooError::InvalidParameter(format!(
                "Max load factor must be in (0, 1], got {}",
                self.max_load_factor
            )));
        }
        if self.max_kicks == 0 {
            return Err(CuckooError::InvalidParameter(
                "Max kicks must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_slots_per_bucket(slots_per_bucket: usize) -> Result<()> {
    if slots_per_bucket == 0 || slots_per_bucket > MAX_SLOTS_PER_BUCKET {
        return Err(CuckooError::InvalidParameter(format!(
            "Slots per bucket must be 1-{}",
            MAX_SLOTS_PER_BUCKET
        )));
    }
    Ok(())
}

fn validate_fingerprint_bits(fingerprint_bits: u32) -> Result<()> {
    if fingerprint_bits == 0 || fingerprint_bits > MAX_FINGERPRINT_BITS {
        return Err(CuckooError::InvalidParameter(format!(
            "Fingerprint bits must be 1-{}",
            MAX_FINGERPRINT_BITS
        )));
    }
    Ok(())
}

/// Concrete shape of a cuckoo filter table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    num_buckets: usize,
    slots_per_bucket: usize,
    fingerprint_bits: u32,
}

impl Geometry {
    /// Create a geometry from explicit parameters
    ///
    /// `num_buckets` must be a non-zero power of two so that bucket indices
    /// can be reduced with a mask instead of a modulo.
    pub fn new(num_buckets: usize, slots_per_bucket: usize, fingerprint_bits: u32) -> Result<Self> {
        if num_buckets == 0 {
            return Err(CuckooError::InvalidCapacity(
                "Number of buckets must be > 0".to_string(),
            ));
        }
        if !num_buckets.is_power_of_two() {
            return Err(CuckooError::InvalidParameter(format!(
                "Number of buckets must be a power of two, got {}",
                num_buckets
            )));
        }
        validate_slots_per_bucket(slots_per_bucket)?;
        validate_fingerprint_bits(fingerprint_bits)?;

        let geometry = Geometry {
            num_buckets,
            slots_per_bucket,
            fingerprint_bits,
        };
        if geometry.checked_storage_bits().is_none() {
            return Err(CuckooError::InvalidCapacity(format!(
                "{} buckets of {} x {}-bit slots overflow the address space",
                num_buckets, slots_per_bucket, fingerprint_bits
            )));
        }
        Ok(geometry)
    }

    /// Resolve the geometry for `capacity_hint` items at the configured load factor
    pub fn for_capacity(capacity_hint: usize, config: &CuckooConfig) -> Result<Self> {
        config.validate()?;
        if capacity_hint == 0 {
            return Err(CuckooError::InvalidCapacity(
                "Capacity must be > 0".to_string(),
            ));
        }

        // Headroom so the table is never asked to run above its load factor
        let slots_needed = (capacity_hint as f64 / config.max_load_factor).ceil();
        if !slots_needed.is_finite() || slots_needed >= usize::MAX as f64 {
            return Err(CuckooError::InvalidCapacity(format!(
                "Capacity {} overflows the address space",
                capacity_hint
            )));
        }

        Self::exact(slots_needed as usize, config)
    }

    /// Resolve the smallest geometry with at least `capacity` slots, no headroom
    pub fn exact(capacity: usize, config: &CuckooConfig) -> Result<Self> {
        config.validate()?;
        if capacity == 0 {
            return Err(CuckooError::InvalidCapacity(
                "Capacity must be > 0".to_string(),
            ));
        }

        let buckets_exact = capacity.div_ceil(config.slots_per_bucket);
        let num_buckets = buckets_exact.checked_next_power_of_two().ok_or_else(|| {
            CuckooError::InvalidCapacity(format!(
                "Capacity {} needs more buckets than the address space allows",
                capacity
            ))
        })?;

        Self::new(num_buckets, config.slots_per_bucket, config.fingerprint_bits)
    }

    pub fn num_buckets(&self) -> usize {
        self.num_buckets
    }

    pub fn slots_per_bucket(&self) -> usize {
        self.slots_per_bucket
    }

    pub fn fingerprint_bits(&self) -> u32 {
        self.fingerprint_bits
    }

    /// Total number of fingerprint slots (`m * b`)
    pub fn total_slots(&self) -> usize {
        self.num_buckets * self.slots_per_bucket
    }

    /// Size of the bit-packed slot region in bits
    pub fn storage_bits(&self) -> usize {
        self.total_slots() * self.fingerprint_bits as usize
    }

    /// Size of the bit-packed slot region in bytes, rounded up
    pub fn storage_bytes(&self) -> usize {
        self.storage_bits().div_ceil(8)
    }

    /// Mask that reduces a hash to a bucket index (`m - 1`)
    pub fn index_mask(&self) -> u64 {
        self.num_buckets as u64 - 1
    }

    /// Mask that truncates a hash to a fingerprint (`2^f - 1`)
    pub fn fingerprint_mask(&self) -> u32 {
        if self.fingerprint_bits == 32 {
            u32::MAX
        } else {
            (1u32 << self.fingerprint_bits) - 1
        }
    }

    fn checked_storage_bits(&self) -> Option<usize> {
        self.num_buckets
            .checked_mul(self.slots_per_bucket)?
            .checked_mul(self.fingerprint_bits as usize)
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} buckets × {} slots × {} bits",
            self.num_buckets, self.slots_per_bucket, self.fingerprint_bits
        )
    }
}

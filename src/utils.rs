//! Utility functions for sizing cuckoo filters

use crate::config::{CuckooConfig, Geometry, MAX_FINGERPRINT_BITS};
use crate::{CuckooError, Result};

/// Calculated cuckoo filter parameters
#[derive(Debug, Clone)]
pub struct CuckooParameters {
    pub config: CuckooConfig,
    pub geometry: Geometry,
    pub memory_bytes: usize,
    pub expected_fpr: f64,
}

/// Smallest fingerprint width whose full-table bound `2b / 2^f` is at most `desired_fpr`
pub fn optimal_fingerprint_bits(desired_fpr: f64, slots_per_bucket: usize) -> u32 {
    if !(desired_fpr > 0.0) {
        return MAX_FINGERPRINT_BITS;
    }
    // f >= log2(2b / p)
    let bits = (2.0 * slots_per_bucket as f64 / desired_fpr).log2().ceil();
    (bits.max(1.0) as u32).min(MAX_FINGERPRINT_BITS)
}

/// Calculate cuckoo filter parameters for given constraints
pub fn optimal_cuckoo_parameters(
    expected_elements: usize,
    desired_fpr: f64,
) -> Result<CuckooParameters> {
    if !(desired_fpr > 0.0 && desired_fpr < 1.0) {
        return Err(CuckooError::InvalidParameter(format!(
            "Desired FPR must be in (0, 1), got {}",
            desired_fpr
        )));
    }

    let defaults = CuckooConfig::default();
    let config = defaults.with_fingerprint_bits(optimal_fingerprint_bits(
        desired_fpr,
        defaults.slots_per_bucket,
    ));
    let geometry = Geometry::for_capacity(expected_elements, &config)?;

    let expected_fpr = (2.0 * geometry.slots_per_bucket() as f64
        / 2f64.powi(geometry.fingerprint_bits() as i32))
    .min(1.0);

    Ok(CuckooParameters {
        config,
        memory_bytes: geometry.storage_bytes(),
        geometry,
        expected_fpr,
    })
}

/// Bytes of slot memory a filter for `min_capacity` items needs, load-factor headroom included
pub fn size_for(min_capacity: usize, config: &CuckooConfig) -> Result<usize> {
    Ok(Geometry::for_capacity(min_capacity, config)?.storage_bytes())
}

/// Bytes of slot memory holding at least `min_capacity` slots, no headroom
pub fn size_for_exactly(min_capacity: usize, config: &CuckooConfig) -> Result<usize> {
    Ok(Geometry::exact(min_capacity, config)?.storage_bytes())
}

/// Number of slots the largest filter fitting in `memory_bytes` provides
///
/// Multiply by the config's max load factor for a safe item count.
pub fn capacity_for(memory_bytes: usize, config: &CuckooConfig) -> Result<usize> {
    config.validate()?;
    let bucket_bits = config.slots_per_bucket * config.fingerprint_bits as usize;
    let buckets = memory_bytes.saturating_mul(8) / bucket_bits;
    if buckets == 0 {
        return Ok(0);
    }

    // Largest power of two not above `buckets`
    let num_buckets = 1usize << (usize::BITS - 1 - buckets.leading_zeros());
    Ok(num_buckets * config.slots_per_bucket)
}

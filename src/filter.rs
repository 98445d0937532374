//! # Cuckoo Filter
//!
//! The filter engine: insert, lookup and delete over a [`BucketTable`],
//! following _Cuckoo Filter: Practically Better Than Bloom_ (Fan et al.).
//!
//! Every key has two candidate buckets. When both are full, insertion runs a
//! bounded eviction chain: a random resident fingerprint is kicked out and
//! moved to its own alternate bucket, which may kick out another, and so on
//! for at most `max_kicks` steps. A chain that runs out of kicks is undone
//! swap by swap, so a failed insert leaves the table exactly as it found it.
//!
//! The filter is single-writer. `insert` and `delete` need `&mut self`;
//! `contains` only needs `&self`, so any number of readers may share a
//! filter that nobody is mutating.

use crate::bucket::BucketTable;
use crate::config::{CuckooConfig, Geometry};
use crate::fingerprint::{self, alternate_index, Candidates};
use crate::hash::{Fmix64, HashFunction};
use crate::{CuckooError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Outcome of a successful insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// Length of the eviction chain that made room (0 if a slot was free)
    pub kicks: usize,
}

/// A cuckoo filter over caller-hashed `u64` keys
pub struct CuckooFilter {
    /// Bit-packed fingerprint buckets
    table: BucketTable,
    /// Mixes keys before they are split into index and fingerprint
    hasher: Box<dyn HashFunction>,
    config: CuckooConfig,
    /// Picks the eviction start bucket and victim slots
    rng: StdRng,
    /// Occupied slots
    count: usize,
    /// Set when a delete found nothing to remove
    broken: bool,
    /// (bucket, slot) of every swap in the running chain, sized `max_kicks`
    eviction_path: Vec<(usize, usize)>,
}

impl CuckooFilter {
    /// Create a filter for `capacity_hint` items with the default configuration
    pub fn new(capacity_hint: usize) -> Result<Self> {
        Self::with_config(capacity_hint, CuckooConfig::default())
    }

    /// Create a filter for `capacity_hint` items
    ///
    /// The bucket count is rounded up to a power of two, so the real
    /// capacity is usually larger than the hint.
    ///
    /// # Errors
    /// [`CuckooError::InvalidCapacity`] when the hint is zero or the table
    /// would overflow the address space, [`CuckooError::InvalidParameter`]
    /// for a bad config.
    pub fn with_config(capacity_hint: usize, config: CuckooConfig) -> Result<Self> {
        let geometry = Geometry::for_capacity(capacity_hint, &config)?;
        Self::with_geometry(geometry, config)
    }

    /// Create a filter with an explicit table shape
    ///
    /// `slots_per_bucket` and `fingerprint_bits` come from `geometry`; the
    /// rest of `config` (kick bound, seed) still applies.
    pub fn with_geometry(geometry: Geometry, config: CuckooConfig) -> Result<Self> {
        Self::from_table(BucketTable::new(geometry), config)
    }

    /// Rebuild a filter from a raw block produced by [`CuckooFilter::to_bytes`]
    ///
    /// The geometry must be the one the block was written with, and the
    /// filter that wrote it must have used the default key hash.
    pub fn restore(geometry: Geometry, config: CuckooConfig, bytes: &[u8]) -> Result<Self> {
        let table = BucketTable::from_bytes(geometry, bytes)?;
        let mut filter = Self::from_table(table, config)?;
        filter.count = filter.table.occupied_slots();
        Ok(filter)
    }

    fn from_table(table: BucketTable, config: CuckooConfig) -> Result<Self> {
        let geometry = *table.geometry();
        let config = CuckooConfig {
            slots_per_bucket: geometry.slots_per_bucket(),
            fingerprint_bits: geometry.fingerprint_bits(),
            ..config
        };
        config.validate()?;

        debug!(
            num_buckets = geometry.num_buckets(),
            slots_per_bucket = geometry.slots_per_bucket(),
            fingerprint_bits = geometry.fingerprint_bits(),
            max_kicks = config.max_kicks,
            memory_bytes = geometry.storage_bytes(),
            "created cuckoo filter"
        );

        Ok(CuckooFilter {
            table,
            hasher: Box::new(Fmix64),
            rng: StdRng::seed_from_u64(config.seed),
            eviction_path: Vec::with_capacity(config.max_kicks),
            config,
            count: 0,
            broken: false,
        })
    }

    /// Replace the key mixer; only allowed before anything is inserted
    pub fn with_key_hash(mut self, hasher: Box<dyn HashFunction>) -> Result<Self> {
        if !self.is_empty() {
            return Err(CuckooError::InvalidParameter(
                "Key hash can only be changed on an empty filter".to_string(),
            ));
        }
        self.hasher = hasher;
        Ok(self)
    }

    fn candidates(&self, key: u64) -> Candidates {
        fingerprint::derive(self.hasher.hash(key), self.table.geometry())
    }

    /// Add a key to the filter
    ///
    /// # Errors
    /// [`CuckooError::Full`] when no room was found within `max_kicks`
    /// evictions. The filter is left unchanged; the caller should rebuild
    /// a larger filter or drop the key.
    pub fn insert(&mut self, key: u64) -> Result<Inserted> {
        let Candidates {
            primary,
            alternate,
            fingerprint,
        } = self.candidates(key);

        // Primary first keeps placement reproducible
        if self.table.try_insert(primary, fingerprint)
            || self.table.try_insert(alternate, fingerprint)
        {
            self.count += 1;
            return Ok(Inserted { kicks: 0 });
        }

        let start = if self.rng.gen::<bool>() {
            primary
        } else {
            alternate
        };
        self.relocate(start, fingerprint)
    }

    /// Run the eviction chain starting at a full bucket
    fn relocate(&mut self, start: usize, fingerprint: u32) -> Result<Inserted> {
        let geometry = *self.table.geometry();
        let mut bucket = start;
        let mut homeless = fingerprint;
        self.eviction_path.clear();

        for kick in 1..=self.config.max_kicks {
            let eviction = self.table.swap_random(bucket, homeless, &mut self.rng);
            self.eviction_path.push((bucket, eviction.slot));

            homeless = eviction.fingerprint;
            bucket = alternate_index(bucket, homeless, &geometry);
            if self.table.try_insert(bucket, homeless) {
                self.count += 1;
                return Ok(Inserted { kicks: kick });
            }
        }

        // Walk the chain backwards; each swap hands back what it displaced
        for &(bucket, slot) in self.eviction_path.iter().rev() {
            homeless = self.table.swap_at(bucket, slot, homeless);
        }
        debug_assert_eq!(homeless, fingerprint);

        debug!(
            kicks = self.config.max_kicks,
            len = self.count,
            load_factor = self.load_factor(),
            "cuckoo filter insert failed, table too full"
        );
        Err(CuckooError::Full {
            kicks: self.config.max_kicks,
        })
    }

    /// Check if a key might be in the filter
    /// Returns true if the key might be present (with possible false positives)
    /// Returns false if the key is definitely not present
    pub fn contains(&self, key: u64) -> bool {
        let candidates = self.candidates(key);
        self.table.contains(candidates.primary, candidates.fingerprint)
            || self.table.contains(candidates.alternate, candidates.fingerprint)
    }

    /// Remove one copy of a key's fingerprint
    ///
    /// Returns false when neither candidate bucket holds the fingerprint.
    /// Deleting a key that was never inserted may instead remove a colliding
    /// fingerprint of some other key; the filter cannot tell them apart.
    pub fn delete(&mut self, key: u64) -> bool {
        let candidates = self.candidates(key);
        if self.table.remove(candidates.primary, candidates.fingerprint)
            || self.table.remove(candidates.alternate, candidates.fingerprint)
        {
            self.count -= 1;
            return true;
        }

        trace!(key, "delete of a key that is not in the cuckoo filter");
        self.broken = true;
        false
    }

    /// Release the filter and its backing memory
    ///
    /// Consuming `self` makes use-after-release a compile error.
    pub fn release(self) {
        debug!(memory_bytes = self.memory_bytes(), "released cuckoo filter");
    }

    /// Get the number of occupied slots (successful inserts minus deletes)
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the filter is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Has a delete ever missed?
    ///
    /// A missed delete means the caller removed something it never added,
    /// so `len()` and the caller's own bookkeeping may have drifted apart.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Total number of slots (`m * b`)
    pub fn capacity(&self) -> usize {
        self.table.geometry().total_slots()
    }

    pub fn geometry(&self) -> &Geometry {
        self.table.geometry()
    }

    pub fn config(&self) -> &CuckooConfig {
        &self.config
    }

    /// Bytes held by the slot region
    pub fn memory_bytes(&self) -> usize {
        self.table.memory_bytes()
    }

    /// Get the current load factor (fraction of slots occupied)
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.capacity() as f64
    }

    /// Worst-case false positive rate of a full table, `2b / 2^f`
    pub fn false_positive_bound(&self) -> f64 {
        let geometry = self.table.geometry();
        let fingerprints = 2f64.powi(geometry.fingerprint_bits() as i32);
        (2.0 * geometry.slots_per_bucket() as f64 / fingerprints).min(1.0)
    }

    /// Expected false positive rate at the current load
    pub fn estimated_fpr(&self) -> f64 {
        let geometry = self.table.geometry();
        let nonzero_fingerprints = geometry.fingerprint_mask() as f64;
        let probed = 2.0 * geometry.slots_per_bucket() as f64 * self.load_factor();
        1.0 - (1.0 - 1.0 / nonzero_fingerprints).powf(probed)
    }

    /// Occupied slots per bucket
    pub fn bucket_loads(&self) -> Vec<usize> {
        (0..self.table.geometry().num_buckets())
            .map(|bucket| self.table.occupancy(bucket))
            .collect()
    }

    /// The raw slot region; feed it back to [`CuckooFilter::restore`]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.table.to_bytes()
    }

    /// Empty every slot and reset the counters
    pub fn clear(&mut self) {
        self.table.clear();
        self.count = 0;
        self.broken = false;
    }

    /// Get statistics about the filter
    pub fn stats(&self) -> CuckooStats {
        let loads = self.bucket_loads();
        CuckooStats {
            num_buckets: self.geometry().num_buckets(),
            slots_per_bucket: self.geometry().slots_per_bucket(),
            fingerprint_bits: self.geometry().fingerprint_bits(),
            key_hash: self.hasher.name(),
            elements: self.count,
            load_factor: self.load_factor(),
            estimated_fpr: self.estimated_fpr(),
            false_positive_bound: self.false_positive_bound(),
            memory_bytes: self.memory_bytes(),
            full_buckets: loads
                .iter()
                .filter(|&&load| load == self.geometry().slots_per_bucket())
                .count(),
            empty_buckets: loads.iter().filter(|&&load| load == 0).count(),
            broken: self.broken,
        }
    }
}

impl std::fmt::Debug for CuckooFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CuckooFilter")
            .field("geometry", self.table.geometry())
            .field("key_hash", &self.hasher.name())
            .field("max_kicks", &self.config.max_kicks)
            .field("len", &self.count)
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

/// Statistics about a cuckoo filter
#[derive(Debug, Clone)]
pub struct CuckooStats {
    pub num_buckets: usize,
    pub slots_per_bucket: usize,
    pub fingerprint_bits: u32,
    pub key_hash: String,
    pub elements: usize,
    pub load_factor: f64,
    pub estimated_fpr: f64,
    pub false_positive_bound: f64,
    pub memory_bytes: usize,
    pub full_buckets: usize,
    pub empty_buckets: usize,
    pub broken: bool,
}

impl std::fmt::Display for CuckooStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "CuckooFilter Stats:\n\
             - Buckets: {} × {} slots × {} bits ({} bytes)\n\
             - Key hash: {}\n\
             - Elements: {}\n\
             - Load factor: {:.3}\n\
             - Estimated FPR: {:.6} (bound {:.6})\n\
             - Buckets full: {}, empty: {}\n\
             - Broken: {}",
            self.num_buckets,
            self.slots_per_bucket,
            self.fingerprint_bits,
            self.memory_bytes,
            self.key_hash,
            self.elements,
            self.load_factor,
            self.estimated_fpr,
            self.false_positive_bound,
            self.full_buckets,
            self.empty_buckets,
            self.broken
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn prop_no_false_negatives(
            keys in prop::collection::hash_set(any::<u64>(), 1..400),
            remove_every in 2usize..5
        ) {
            let mut cf = CuckooFilter::new(1000).unwrap();
            for &key in &keys {
                prop_assert!(cf.insert(key).is_ok());
            }
            prop_assert_eq!(cf.len(), keys.len());

            let removed: HashSet<u64> = keys.iter().copied().step_by(remove_every).collect();
            for &key in &removed {
                prop_assert!(cf.delete(key));
            }
            prop_assert_eq!(cf.len(), keys.len() - removed.len());

            for key in keys.difference(&removed) {
                prop_assert!(cf.contains(*key));
            }
            prop_assert!(!cf.is_broken());
        }

        #[test]
        fn prop_failed_insert_leaves_filter_unchanged(
            keys in prop::collection::vec(any::<u64>(), 10..40),
            seed in any::<u64>()
        ) {
            let geometry = Geometry::new(2, 2, 12).unwrap();
            let config = CuckooConfig::default().with_max_kicks(8).with_seed(seed);
            let mut cf = CuckooFilter::with_geometry(geometry, config).unwrap();

            for key in keys {
                let before = cf.to_bytes();
                let len = cf.len();
                match cf.insert(key) {
                    Ok(inserted) => {
                        prop_assert!(inserted.kicks <= 8);
                        prop_assert_eq!(cf.len(), len + 1);
                    }
                    Err(err) => {
                        prop_assert_eq!(err, CuckooError::Full { kicks: 8 });
                        prop_assert_eq!(cf.to_bytes(), before);
                        prop_assert_eq!(cf.len(), len);
                    }
                }
                prop_assert!(cf.len() <= 4);
            }
        }
    }
}

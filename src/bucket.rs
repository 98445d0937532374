//! Bucket storage
//!
//! One contiguous bit-packed region holds `m * b` fingerprint slots of `f`
//! bits each. A bucket is not a separate allocation, just the run of `b`
//! consecutive slots at `bucket * b`. A slot holding [`EMPTY`] is free.

use crate::config::Geometry;
use crate::fingerprint::EMPTY;
use crate::{CuckooError, Result};
use bit_vec::BitVec;
use rand::Rng;

/// A fingerprint displaced by [`BucketTable::swap_random`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    /// Slot the new fingerprint was written to
    pub slot: usize,
    /// Fingerprint that used to occupy it
    pub fingerprint: u32,
}

/// Fixed-size table of bit-packed fingerprint buckets
///
/// Bucket and slot indices outside the geometry are contract violations
/// and panic.
pub struct BucketTable {
    /// Slot region, `f` bits per slot, slot-major
    bits: BitVec,
    geometry: Geometry,
}

impl BucketTable {
    /// Allocate a zeroed (all empty) table
    pub fn new(geometry: Geometry) -> Self {
        BucketTable {
            bits: BitVec::from_elem(geometry.storage_bits(), false),
            geometry,
        }
    }

    /// Rebuild a table from a block produced by [`BucketTable::to_bytes`]
    pub fn from_bytes(geometry: Geometry, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != geometry.storage_bytes() {
            return Err(CuckooError::InvalidMemory(format!(
                "expected {} bytes for {}, got {}",
                geometry.storage_bytes(),
                geometry,
                bytes.len()
            )));
        }

        let mut bits = BitVec::from_bytes(bytes);
        if bits.iter().skip(geometry.storage_bits()).any(|bit| bit) {
            return Err(CuckooError::InvalidMemory(
                "padding bits after the last slot must be zero".to_string(),
            ));
        }
        bits.truncate(geometry.storage_bits());

        Ok(BucketTable { bits, geometry })
    }

    /// The raw slot region, padded with zero bits to a whole byte
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Bytes held by the slot region
    pub fn memory_bytes(&self) -> usize {
        self.geometry.storage_bytes()
    }

    /// Read the fingerprint in one slot ([`EMPTY`] when free)
    pub fn get(&self, bucket: usize, slot: usize) -> u32 {
        let start = self.bit_offset(bucket, slot);
        (0..self.geometry.fingerprint_bits() as usize).fold(0u32, |acc, bit| {
            acc | ((self.bits[start + bit] as u32) << bit)
        })
    }

    fn set(&mut self, bucket: usize, slot: usize, fingerprint: u32) {
        debug_assert!(fingerprint <= self.geometry.fingerprint_mask());
        let start = self.bit_offset(bucket, slot);
        for bit in 0..self.geometry.fingerprint_bits() as usize {
            self.bits.set(start + bit, (fingerprint >> bit) & 1 == 1);
        }
    }

    /// Overwrite one slot and return what it held
    pub fn swap_at(&mut self, bucket: usize, slot: usize, fingerprint: u32) -> u32 {
        let previous = self.get(bucket, slot);
        self.set(bucket, slot, fingerprint);
        previous
    }

    /// Does the bucket have at least one empty slot?
    pub fn has_free_slot(&self, bucket: usize) -> bool {
        self.slots(bucket).any(|slot| self.get(bucket, slot) == EMPTY)
    }

    /// Store `fingerprint` in the first empty slot of `bucket`
    ///
    /// True means success, false means the bucket was full
    pub fn try_insert(&mut self, bucket: usize, fingerprint: u32) -> bool {
        match self.slots(bucket).find(|&slot| self.get(bucket, slot) == EMPTY) {
            Some(slot) => {
                self.set(bucket, slot, fingerprint);
                true
            }
            None => false,
        }
    }

    /// Does any slot of `bucket` hold `fingerprint`?
    pub fn contains(&self, bucket: usize, fingerprint: u32) -> bool {
        self.slots(bucket)
            .any(|slot| self.get(bucket, slot) == fingerprint)
    }

    /// Clear exactly one slot of `bucket` holding `fingerprint`
    pub fn remove(&mut self, bucket: usize, fingerprint: u32) -> bool {
        match self.slots(bucket).find(|&slot| self.get(bucket, slot) == fingerprint) {
            Some(slot) => {
                self.set(bucket, slot, EMPTY);
                true
            }
            None => false,
        }
    }

    /// Swap `fingerprint` into a uniformly chosen slot of `bucket`
    pub fn swap_random<R: Rng + ?Sized>(
        &mut self,
        bucket: usize,
        fingerprint: u32,
        rng: &mut R,
    ) -> Eviction {
        let slot = rng.gen_range(0..self.geometry.slots_per_bucket());
        Eviction {
            slot,
            fingerprint: self.swap_at(bucket, slot, fingerprint),
        }
    }

    /// Number of occupied slots in one bucket
    pub fn occupancy(&self, bucket: usize) -> usize {
        self.slots(bucket)
            .filter(|&slot| self.get(bucket, slot) != EMPTY)
            .count()
    }

    /// Number of occupied slots in the whole table
    pub fn occupied_slots(&self) -> usize {
        (0..self.geometry.num_buckets())
            .map(|bucket| self.occupancy(bucket))
            .sum()
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    fn slots(&self, bucket: usize) -> std::ops::Range<usize> {
        assert!(
            bucket < self.geometry.num_buckets(),
            "bucket index {} out of range ({} buckets)",
            bucket,
            self.geometry.num_buckets()
        );
        0..self.geometry.slots_per_bucket()
    }

    fn bit_offset(&self, bucket: usize, slot: usize) -> usize {
        assert!(
            bucket < self.geometry.num_buckets() && slot < self.geometry.slots_per_bucket(),
            "slot ({}, {}) out of range for {}",
            bucket,
            slot,
            self.geometry
        );
        (bucket * self.geometry.slots_per_bucket() + slot) * self.geometry.fingerprint_bits() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(num_buckets: usize, slots: usize, bits: u32) -> BucketTable {
        BucketTable::new(Geometry::new(num_buckets, slots, bits).unwrap())
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = table(8, 4, 12);
        assert_eq!(table.occupied_slots(), 0);
        assert_eq!(table.memory_bytes(), 8 * 4 * 12 / 8);
        for bucket in 0..8 {
            assert!(table.has_free_slot(bucket));
            assert_eq!(table.occupancy(bucket), 0);
        }
    }

    #[test]
    fn test_bit_packing_keeps_neighbours_intact() {
        // 5-bit slots straddle byte boundaries
        let mut table = table(4, 3, 5);
        table.swap_at(1, 0, 0b10101);
        table.swap_at(1, 1, 0b11111);
        table.swap_at(1, 2, 0b00001);

        assert_eq!(table.get(1, 0), 0b10101);
        assert_eq!(table.get(1, 1), 0b11111);
        assert_eq!(table.get(1, 2), 0b00001);
        assert_eq!(table.get(0, 2), EMPTY);
        assert_eq!(table.get(2, 0), EMPTY);

        table.swap_at(1, 1, EMPTY);
        assert_eq!(table.get(1, 0), 0b10101);
        assert_eq!(table.get(1, 2), 0b00001);
    }

    #[test]
    fn test_full_width_fingerprints() {
        let mut table = table(2, 2, 32);
        assert!(table.try_insert(1, u32::MAX));
        assert!(table.try_insert(1, 0x8000_0001));
        assert!(table.contains(1, u32::MAX));
        assert!(table.contains(1, 0x8000_0001));
        assert!(!table.contains(0, u32::MAX));
    }

    #[test]
    fn test_try_insert_until_full() {
        let mut table = table(2, 4, 8);
        for fingerprint in 1..=4 {
            assert!(table.try_insert(0, fingerprint));
        }
        assert!(!table.has_free_slot(0));
        assert!(!table.try_insert(0, 5));
        assert_eq!(table.occupancy(0), 4);
        assert!(table.has_free_slot(1));
    }

    #[test]
    fn test_remove_clears_exactly_one_duplicate() {
        let mut table = table(2, 4, 8);
        assert!(table.try_insert(0, 7));
        assert!(table.try_insert(0, 7));

        assert!(table.remove(0, 7));
        assert!(table.contains(0, 7));
        assert!(table.remove(0, 7));
        assert!(!table.contains(0, 7));
        assert!(!table.remove(0, 7));
    }

    #[test]
    fn test_swap_random_returns_displaced_fingerprint() {
        let mut table = table(1, 4, 8);
        for fingerprint in 1..=4 {
            assert!(table.try_insert(0, fingerprint));
        }

        let mut rng = StdRng::seed_from_u64(7);
        let eviction = table.swap_random(0, 99, &mut rng);
        assert!(eviction.slot < 4);
        assert_eq!(eviction.fingerprint, eviction.slot as u32 + 1);
        assert_eq!(table.get(0, eviction.slot), 99);
        assert_eq!(table.occupancy(0), 4);
    }

    #[test]
    fn test_swap_random_is_roughly_uniform() {
        let mut table = table(1, 4, 8);
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = [0usize; 4];
        for _ in 0..4000 {
            hits[table.swap_random(0, 1, &mut rng).slot] += 1;
        }
        for count in hits {
            assert!(count > 800 && count < 1200, "hits={:?}", hits);
        }
    }

    #[test]
    fn test_bytes_roundtrip_and_validation() {
        let geometry = Geometry::new(4, 3, 5).unwrap();
        let mut table = BucketTable::new(geometry);
        table.try_insert(3, 0b10011);
        table.try_insert(0, 0b00110);

        let bytes = table.to_bytes();
        assert_eq!(bytes.len(), geometry.storage_bytes());
        let restored = BucketTable::from_bytes(geometry, &bytes).unwrap();
        assert_eq!(restored.get(3, 0), 0b10011);
        assert_eq!(restored.get(0, 0), 0b00110);
        assert_eq!(restored.occupied_slots(), 2);

        assert!(BucketTable::from_bytes(geometry, &bytes[1..]).is_err());

        // 60 bits of slots in 8 bytes: the low 4 bits of the last byte are padding
        let mut dirty = bytes.clone();
        *dirty.last_mut().unwrap() |= 0x01;
        assert!(matches!(
            BucketTable::from_bytes(geometry, &dirty),
            Err(CuckooError::InvalidMemory(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut table = table(4, 4, 8);
        table.try_insert(2, 9);
        table.clear();
        assert_eq!(table.occupied_slots(), 0);
        assert_eq!(table.geometry().storage_bits(), 4 * 4 * 8);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_bucket_panics() {
        let table = table(4, 4, 8);
        table.contains(4, 1);
    }
}

//! # Ferric Cuckoo
//!
//! A compact cuckoo filter: approximate set membership with deletion.
//! Keys are caller-hashed `u64` values, fingerprints are bit-packed at a
//! configurable width, and insertion uses bounded partial-key cuckoo
//! eviction chains.
//!
//! ```
//! use ferric_cuckoo::CuckooFilter;
//!
//! let mut filter = CuckooFilter::new(10_000).unwrap();
//! filter.insert(42).unwrap();
//! assert!(filter.contains(42));
//! assert!(filter.delete(42));
//! assert!(!filter.contains(42));
//! ```

pub mod bucket;
pub mod config;
pub mod filter;
pub mod fingerprint;
pub mod hash;
pub mod utils;

pub use bucket::BucketTable;
pub use config::{CuckooConfig, Geometry};
pub use filter::{CuckooFilter, CuckooStats, Inserted};
pub use hash::{hash_item, Fmix64, HashFunction, LinearHash};

// Python bindings
#[cfg(feature = "python")]
pub mod python_module;

/// Common error types for the library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CuckooError {
    /// The capacity hint rounds to zero buckets or overflows the address space
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The eviction chain gave up; the filter is past its safe load factor
    #[error("Filter is full: no free slot found after {kicks} kicks")]
    Full { kicks: usize },
    /// A raw memory block does not match the filter geometry
    #[error("Invalid memory block: {0}")]
    InvalidMemory(String),
}

pub type Result<T> = std::result::Result<T, CuckooError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cuckoo_filter() {
        let mut filter = CuckooFilter::new(1000).unwrap();

        // Insert some keys
        filter.insert(42).unwrap();
        filter.insert(1337).unwrap();
        filter.insert(9999).unwrap();

        // Test membership
        assert!(filter.contains(42));
        assert!(filter.contains(1337));
        assert!(filter.contains(9999));
        assert_eq!(filter.len(), 3);

        // Deletion is the whole point
        assert!(filter.delete(1337));
        assert!(!filter.contains(1337));
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_error_display() {
        let err = CuckooError::Full { kicks: 500 };
        assert_eq!(
            err.to_string(),
            "Filter is full: no free slot found after 500 kicks"
        );
        let err = CuckooError::InvalidCapacity("zero".to_string());
        assert_eq!(err.to_string(), "Invalid capacity: zero");
    }
}

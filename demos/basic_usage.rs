//! Basic usage examples for ferric-cuckoo

use ferric_cuckoo::utils::{capacity_for, optimal_cuckoo_parameters, size_for};
use ferric_cuckoo::{hash_item, CuckooConfig, CuckooError, CuckooFilter, Geometry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Ferric Cuckoo Filter Examples ===\n");

    // Example 1: Insert, query, delete
    println!("1. Basic Cuckoo Filter:");
    let mut filter = CuckooFilter::new(1000)?;

    let test_data = [42u64, 1337, 9999, 12345, 67890];
    for &item in &test_data {
        filter.insert(item)?;
    }

    for &item in &test_data {
        println!("  {} in filter: {}", item, filter.contains(item));
    }
    for &item in &[1u64, 2, 3, 4, 5] {
        println!("  {} in filter: {}", item, filter.contains(item));
    }

    println!("  delete 1337: {}", filter.delete(1337));
    println!("  1337 in filter: {}", filter.contains(1337));
    println!("  delete 1337 again: {}", filter.delete(1337));
    println!("  broken: {}", filter.is_broken());
    println!("  {}", filter.stats());
    println!();

    // Example 2: Sizing
    println!("2. Sizing:");
    let params = optimal_cuckoo_parameters(1_000_000, 0.001)?;
    println!(
        "  1M items at 0.1% FPR: {} ({} bytes, bound {:.5})",
        params.geometry, params.memory_bytes, params.expected_fpr
    );
    let config = CuckooConfig::fp8();
    println!(
        "  8-bit filter for 10k items needs {} bytes",
        size_for(10_000, &config)?
    );
    println!(
        "  64 KiB of 8-bit slots holds {} fingerprints",
        capacity_for(64 * 1024, &config)?
    );
    println!();

    // Example 3: Filling a tiny filter until it refuses
    println!("3. Filling a tiny filter:");
    let geometry = Geometry::new(4, 4, 8)?;
    let mut tiny = CuckooFilter::with_geometry(geometry, CuckooConfig::default().with_max_kicks(50))?;
    let mut key = 0u64;
    loop {
        match tiny.insert(key) {
            Ok(inserted) if inserted.kicks > 0 => {
                println!("  key {} placed after {} kicks", key, inserted.kicks)
            }
            Ok(_) => {}
            Err(CuckooError::Full { kicks }) => {
                println!(
                    "  key {} refused after {} kicks at load {:.2}",
                    key,
                    kicks,
                    tiny.load_factor()
                );
                break;
            }
            Err(err) => return Err(err.into()),
        }
        key += 1;
    }
    println!("  bucket loads: {:?}", tiny.bucket_loads());
    println!();

    // Example 4: Performance
    println!("4. Performance:");
    let num_items = 100_000;
    let mut large = CuckooFilter::new(num_items)?;

    let start = std::time::Instant::now();
    for i in 0..num_items {
        large.insert(i as u64)?;
    }
    let insert_time = start.elapsed();

    let start = std::time::Instant::now();
    let found = (0..num_items).filter(|&i| large.contains(i as u64)).count();
    let query_time = start.elapsed();

    println!(
        "    Insert: {:?} ({:.2} M ops/sec)",
        insert_time,
        num_items as f64 / insert_time.as_secs_f64() / 1_000_000.0
    );
    println!(
        "    Query:  {:?} ({:.2} M ops/sec)",
        query_time,
        num_items as f64 / query_time.as_secs_f64() / 1_000_000.0
    );
    println!("    Found: {}/{}", found, num_items);
    println!();

    // Example 5: Hashing strings into keys
    println!("5. String keys:");
    let mut words = CuckooFilter::with_config(100, CuckooConfig::fp16())?;
    for word in ["apple", "banana", "cherry"] {
        words.insert(hash_item(word))?;
    }
    for word in ["apple", "cherry", "durian"] {
        println!("    {} -> {}", word, words.contains(hash_item(word)));
    }

    // Example 6: Raw memory block
    println!("\n6. Raw memory block:");
    let bytes = words.to_bytes();
    let restored = CuckooFilter::restore(*words.geometry(), *words.config(), &bytes)?;
    println!(
        "    {} bytes restored, {} items, banana -> {}",
        bytes.len(),
        restored.len(),
        restored.contains(hash_item("banana"))
    );
    words.release();

    Ok(())
}

use ferric_cuckoo::{CuckooConfig, CuckooFilter, Geometry};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    println!("🦀 Rust Micro Benchmark - Cuckoo Filter");
    println!("{}", "=".repeat(55));

    // Fill targets as a percentage of total slots
    let load_targets: Vec<usize> = (0..=95).step_by(5).collect();
    let num_buckets = 1 << 14;

    println!("Testing load targets (%): {:?}", load_targets);
    println!();

    let mut results = Vec::new();

    for fingerprint_bits in [8u32, 16, 32] {
        for &load in &load_targets {
            let geometry = match Geometry::new(num_buckets, 4, fingerprint_bits) {
                Ok(geometry) => geometry,
                Err(err) => {
                    eprintln!("bad geometry: {}", err);
                    return;
                }
            };
            let n_elements = geometry.total_slots() * load / 100;

            let start = Instant::now();
            let mut filter = match CuckooFilter::with_geometry(geometry, CuckooConfig::default()) {
                Ok(filter) => filter,
                Err(err) => {
                    eprintln!("cannot create filter: {}", err);
                    return;
                }
            };
            let creation_time = start.elapsed().as_secs_f64();

            // Insert benchmark
            let start = Instant::now();
            let mut failures = 0;
            let mut total_kicks = 0;
            for key in 0..n_elements as u64 {
                match filter.insert(key) {
                    Ok(inserted) => total_kicks += inserted.kicks,
                    Err(_) => failures += 1,
                }
            }
            let insert_time = start.elapsed().as_secs_f64();

            // Query benchmark (keys never inserted)
            let queries = 100_000u64;
            let start = Instant::now();
            let false_positives = (u64::MAX - queries..u64::MAX)
                .filter(|&key| filter.contains(key))
                .count();
            let query_time = start.elapsed().as_secs_f64();

            let insert_rate = if insert_time > 0.0 {
                n_elements as f64 / insert_time
            } else {
                f64::INFINITY
            };
            let query_rate = if query_time > 0.0 {
                queries as f64 / query_time
            } else {
                f64::INFINITY
            };
            let false_positive_rate = false_positives as f64 / queries as f64;

            info!(
                fingerprint_bits,
                load,
                failures,
                total_kicks,
                "benchmark point done"
            );

            results.push((
                fingerprint_bits,
                load,
                creation_time,
                insert_rate,
                query_rate,
                failures,
                total_kicks,
                false_positive_rate,
                filter.false_positive_bound(),
            ));
        }
    }

    // Print results in CSV format
    println!("\n📊 Results (CSV format):");
    println!("fingerprint_bits,load_pct,creation_time,insert_rate,query_rate,failures,kicks,false_positive_rate,fpr_bound");

    for (bits, load, creation_time, insert_rate, query_rate, failures, kicks, fpr, bound) in
        &results
    {
        println!(
            "{},{},{:.6},{:.0},{:.0},{},{},{:.6},{:.6}",
            bits, load, creation_time, insert_rate, query_rate, failures, kicks, fpr, bound
        );
    }
}

//! Test command implementation.
//!
//! Runs collection passes and displays the results.

use herakles_process_collector::ProcessStatsCollector;
use prometheus::Registry;
use std::time::Instant;

use crate::config::Config;
use crate::handlers::metrics::encode_registry;

/// Runs `iterations` collection passes against the configured root.
pub fn command_test(
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 Herakles Process Collector - Test Mode");
    println!("=========================================");

    let collector = ProcessStatsCollector::new(config.collector_options()?)?;
    if !collector.is_available() {
        println!("\n⚠️  Boot time unavailable - the collector will export nothing");
    }

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let totals = collector.scan();
        let duration = start.elapsed();

        println!(
            "   ⏱️  Scan duration: {:.2}ms",
            duration.as_secs_f64() * 1000.0
        );
        println!("   📊 Successfully scanned: {} processes", totals.processes);
        println!("   📈 Totals:");
        println!(
            "      ├─ Virtual: {} MB",
            totals.virtual_memory_bytes / 1024 / 1024
        );
        println!(
            "      ├─ Resident: {} MB",
            totals.resident_memory_bytes / 1024 / 1024
        );
        println!("      └─ CPU: {:.2} s", totals.cpu_seconds);
    }

    if verbose {
        let registry = Registry::new();
        collector.register(&registry)?;
        let body = encode_registry(&registry).map_err(|_| "failed to encode metrics")?;
        println!("\n📝 Exposition:\n{}", body);
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}

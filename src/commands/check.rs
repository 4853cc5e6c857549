//! Check command implementation.
//!
//! Validates configuration and access to the process-information filesystem.

use herakles_process_collector::ProcessStatsCollector;

use crate::config::{validate_effective_config, Config};

/// Validates configuration and /proc access.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Process Collector - System Check");
    println!("============================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            println!("\n📋 Summary:");
            println!("   ❌ Some checks failed - please review warnings");
            std::process::exit(1);
        }
    }

    let collector = ProcessStatsCollector::new(config.collector_options()?)?;
    let root = collector.proc_root().display().to_string();

    println!("\n📁 Checking {}...", root);
    match collector.boot_time() {
        Some(btime) => println!("   ✅ Boot time readable: {}", btime),
        None => {
            println!("   ❌ Cannot read btime from {}/stat - metrics will be empty", root);
            all_ok = false;
        }
    }

    let constants = collector.constants();
    println!(
        "   ℹ️  Clock ticks: {}/s, page size: {} bytes",
        constants.ticks, constants.pagesize
    );

    println!("\n🎯 Checking selected process ({})...", collector.pid_selector());
    match collector.probe_selected() {
        Ok(stat) => println!(
            "   ✅ Stat readable: vsize={} bytes, rss={} pages",
            stat.vsize_bytes, stat.rss_pages
        ),
        Err(e) => {
            println!("   ❌ Cannot read stat: {}", e);
            all_ok = false;
        }
    }

    let totals = collector.scan();
    if totals.processes == 0 {
        println!("   ❌ No readable process entries under {}", root);
        all_ok = false;
    } else {
        println!("   ✅ Can read {} process entries", totals.processes);
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}

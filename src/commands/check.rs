//! Check command implementation.
//!
//! Validates configuration and pressure file availability.

use crate::config::{validate_effective_config, Config};
use crate::startup_checks::{validate_requirements, PRESSURE_RESOURCES};

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Node Pressure Exporter - System Check");
    println!("========================================");

    let mut all_ok = true;

    println!("\n📁 Checking procfs at {}...", config.procfs_path().display());
    match validate_requirements(config.procfs_path()) {
        Ok(available) => {
            println!("   ✅ procfs accessible");
            for resource in PRESSURE_RESOURCES {
                if available.contains(&resource) {
                    println!("   ✅ {} pressure available", resource);
                } else {
                    println!("   ⚠️  {} pressure not reported by this kernel", resource);
                }
            }
        }
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📊 Checking collectors...");
    match config.build_node_collector() {
        Ok(node) => {
            let names: Vec<&str> = node.collector_names().collect();
            if names.is_empty() {
                println!("   ⚠️  No collectors enabled");
            } else {
                println!("   ✅ Enabled: {}", names.join(", "));
            }
        }
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
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

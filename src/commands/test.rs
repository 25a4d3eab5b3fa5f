//! Test command implementation.
//!
//! Runs the enabled collectors and displays the samples they emit.

use crate::config::Config;

/// Tests metrics collection.
pub fn command_test(
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 Node Pressure Exporter - Test Mode");
    println!("=====================================");
    println!("procfs: {}", config.procfs_path().display());

    let node = config.build_node_collector()?;
    let mut failures = 0usize;

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        for outcome in node.collect_once() {
            let ms = outcome.duration.as_secs_f64() * 1000.0;
            match outcome.result {
                Ok(samples) => {
                    println!(
                        "   ✅ {} ({} samples, {:.2}ms)",
                        outcome.name,
                        samples.len(),
                        ms
                    );
                    for sample in &samples {
                        println!("   ├─ {} = {}", sample.desc.fq_name(), sample.value);
                        if verbose {
                            println!("   │  └─ counter: {}", sample.desc.help());
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    println!("   ❌ {} failed after {:.2}ms: {}", outcome.name, ms, e);
                }
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} collector run(s) failed", failures).into());
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}

//! Startup requirement validation for node-pressure-exporter.
//!
//! This module validates that procfs is mounted and reports which pressure
//! files the running kernel provides.

use node_pressure_exporter::ProcFs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Resources read by the pressure collector.
pub const PRESSURE_RESOURCES: [&str; 3] = ["cpu", "memory", "io"];

/// Validate all runtime requirements.
///
/// Returns the resources whose pressure files could be read.
pub fn validate_requirements(procfs_path: &Path) -> Result<Vec<&'static str>, ValidationError> {
    info!("🔍 Validating runtime requirements...");

    let procfs = ProcFs::new(procfs_path).map_err(|e| {
        error!("❌ Cannot open procfs at {}: {}", procfs_path.display(), e);
        ValidationError::ProcfsUnavailable(e.to_string())
    })?;
    info!("✅ procfs accessible at {}", procfs.mount_point().display());

    let mut available = Vec::new();
    for resource in PRESSURE_RESOURCES {
        match procfs.resource_pressure(resource) {
            Ok(stats) => {
                debug!("{} pressure: {:?}", resource, stats);
                info!("✅ {} pressure available", resource);
                available.push(resource);
            }
            Err(e) if e.is_not_found() => {
                warn!("⚠️  {} pressure not available: {}", resource, e);
                warn!("   PSI needs kernel >= 4.20 with CONFIG_PSI=y (and no psi=0 boot flag)");
            }
            Err(e) => {
                error!("❌ Cannot read {} pressure: {}", resource, e);
                return Err(ValidationError::PressureUnreadable {
                    resource,
                    reason: e.to_string(),
                });
            }
        }
    }

    if available.is_empty() {
        warn!("⚠️  No pressure files found - pressure series will be absent");
    } else {
        info!("✅ All runtime requirements validated");
    }
    Ok(available)
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("procfs unavailable: {0}")]
    ProcfsUnavailable(String),

    #[error("cannot read {resource} pressure: {reason}")]
    PressureUnreadable {
        resource: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reports_available_resources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pressure")).unwrap();
        fs::write(
            dir.path().join("pressure/cpu"),
            "some avg10=0.00 avg60=0.00 avg300=0.00 total=1\n",
        )
        .unwrap();

        let available = validate_requirements(dir.path()).unwrap();
        assert_eq!(available, vec!["cpu"]);
    }

    #[test]
    fn test_missing_procfs_fails() {
        let dir = TempDir::new().unwrap();
        let err = validate_requirements(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ValidationError::ProcfsUnavailable(_)));
    }

    #[test]
    fn test_malformed_pressure_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pressure")).unwrap();
        fs::write(dir.path().join("pressure/memory"), "bogus\n").unwrap();

        let err = validate_requirements(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::PressureUnreadable { resource: "memory", .. }
        ));
    }
}

//! Collectors for system metrics.
//!
//! Each collector lives in its own module and is added to the bootstrap's
//! [`CollectorRegistry`] by [`register_defaults`].

pub mod pressure;

use crate::collector::{CollectorError, CollectorRegistry};

pub use pressure::PressureCollector;

/// Registers every built-in collector.
pub fn register_defaults(registry: &mut CollectorRegistry) -> Result<(), CollectorError> {
    registry.register(pressure::COLLECTOR_NAME, true, PressureCollector::factory)?;
    Ok(())
}

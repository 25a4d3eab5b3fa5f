//! Node Pressure Exporter Library
//!
//! Collects Linux pressure stall information (PSI) and exposes it as
//! Prometheus counters. The library is framework-agnostic: collectors produce
//! constant samples, and [`NodeCollector`] bridges them into a
//! `prometheus::Registry` that any HTTP stack can gather from.
//!
//! # Usage
//!
//! ```rust,no_run
//! use node_pressure_exporter::{collectors, CollectorContext, CollectorRegistry};
//! use std::collections::BTreeMap;
//!
//! let mut collectors_registry = CollectorRegistry::new();
//! collectors::register_defaults(&mut collectors_registry).unwrap();
//!
//! let ctx = CollectorContext {
//!     namespace: "node".to_string(),
//!     procfs_path: "/proc".into(),
//! };
//! let node = collectors_registry.build(&ctx, &BTreeMap::new()).unwrap();
//!
//! let registry = prometheus::Registry::new();
//! registry.register(Box::new(node)).unwrap();
//!
//! for family in registry.gather() {
//!     println!("{}", family.name());
//! }
//! ```

pub mod collector;
pub mod collectors;
pub mod health_stats;
pub mod procfs;

// Re-export main types for convenience
pub use collector::{
    Collector, CollectorContext, CollectorError, CollectorRegistry, ConstMetric,
    MetricDescriptor, NodeCollector,
};
pub use collectors::PressureCollector;
pub use health_stats::HealthStats;
pub use procfs::{PressureRecord, PressureStats, ProcFs, ProcfsError};

//! Collector abstraction and registry.
//!
//! A [`Collector`] produces constant samples on every scrape. Collectors are
//! registered by name into a [`CollectorRegistry`] owned by the process
//! bootstrap, which builds the enabled ones into a [`NodeCollector`]. The
//! `NodeCollector` implements `prometheus::core::Collector`, so it can be
//! registered into a regular `prometheus::Registry` and gathered by the
//! `/metrics` handler.

use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Counter, GaugeVec, Opts};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::health_stats::HealthStats;
use crate::procfs::ProcfsError;

/// Errors raised by collectors and by the registry.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("failed to open procfs: {0}")]
    SourceUnavailable(#[source] ProcfsError),

    #[error("failed to read {resource} pressure: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: ProcfsError,
    },

    #[error("invalid metric descriptor: {0}")]
    InvalidDescriptor(#[from] prometheus::Error),

    #[error("collector '{0}' is already registered")]
    DuplicateCollector(String),

    #[error("unknown collector '{0}'")]
    UnknownCollector(String),
}

/// Joins non-empty name components with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Immutable name and help text of one exposed series.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    desc: Desc,
}

impl MetricDescriptor {
    /// Builds a descriptor without variable or constant labels.
    pub fn new(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
    ) -> Result<Self, CollectorError> {
        let desc = Desc::new(
            build_fq_name(namespace, subsystem, name),
            help.to_string(),
            Vec::new(),
            HashMap::new(),
        )?;
        Ok(Self { desc })
    }

    pub fn fq_name(&self) -> &str {
        &self.desc.fq_name
    }

    pub fn help(&self) -> &str {
        &self.desc.help
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }
}

/// A single counter sample emitted by a collector during one scrape.
#[derive(Debug, Clone, Copy)]
pub struct ConstMetric<'a> {
    pub desc: &'a MetricDescriptor,
    pub value: f64,
}

impl<'a> ConstMetric<'a> {
    pub fn counter(desc: &'a MetricDescriptor, value: f64) -> Self {
        Self { desc, value }
    }

    /// Converts the sample into a Prometheus counter family.
    pub fn to_metric_families(&self) -> Result<Vec<MetricFamily>, prometheus::Error> {
        let counter = Counter::with_opts(Opts::new(self.desc.fq_name(), self.desc.help()))?;
        counter.inc_by(self.value);
        Ok(counter.collect())
    }
}

/// A source of metrics, updated once per scrape.
pub trait Collector: Send + Sync {
    /// Descriptors of every series this collector may emit.
    fn descriptors(&self) -> Vec<&MetricDescriptor>;

    /// Reads current values and pushes them into `sink`.
    ///
    /// On error the caller discards whatever was pushed during this call.
    fn update<'a>(&'a self, sink: &mut Vec<ConstMetric<'a>>) -> Result<(), CollectorError>;
}

/// Process-wide settings handed to collector factories.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    pub namespace: String,
    pub procfs_path: PathBuf,
}

/// Constructor registered for a collector.
pub type CollectorFactory = fn(&CollectorContext) -> Result<Box<dyn Collector>, CollectorError>;

struct Registration {
    default_enabled: bool,
    factory: CollectorFactory,
}

/// Table of known collectors, owned by the bootstrap.
#[derive(Default)]
pub struct CollectorRegistry {
    entries: BTreeMap<&'static str, Registration>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &'static str,
        default_enabled: bool,
        factory: CollectorFactory,
    ) -> Result<(), CollectorError> {
        if self.entries.contains_key(name) {
            return Err(CollectorError::DuplicateCollector(name.to_string()));
        }
        self.entries.insert(
            name,
            Registration {
                default_enabled,
                factory,
            },
        );
        Ok(())
    }

    /// Registered collector names with their default state, sorted by name.
    pub fn names(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.entries
            .iter()
            .map(|(name, reg)| (*name, reg.default_enabled))
    }

    /// Instantiates every enabled collector.
    ///
    /// `overrides` maps collector names to an explicit enabled flag; names
    /// that were never registered are rejected.
    pub fn build(
        &self,
        ctx: &CollectorContext,
        overrides: &BTreeMap<String, bool>,
    ) -> Result<NodeCollector, CollectorError> {
        if let Some(unknown) = overrides
            .keys()
            .find(|name| !self.entries.contains_key(name.as_str()))
        {
            return Err(CollectorError::UnknownCollector(unknown.clone()));
        }

        let mut collectors = Vec::new();
        for (name, reg) in &self.entries {
            let enabled = overrides.get(*name).copied().unwrap_or(reg.default_enabled);
            if !enabled {
                debug!("Collector '{}' disabled", name);
                continue;
            }
            collectors.push((name.to_string(), (reg.factory)(ctx)?));
        }

        info!(
            "Enabled collectors: [{}]",
            collectors
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        NodeCollector::new(&ctx.namespace, collectors)
    }
}

/// Result of running a single collector once.
pub struct CollectorOutcome<'a> {
    pub name: &'a str,
    pub duration: Duration,
    pub result: Result<Vec<ConstMetric<'a>>, CollectorError>,
}

/// Runs all enabled collectors on each gather.
pub struct NodeCollector {
    collectors: Vec<(String, Box<dyn Collector>)>,
    scrape_duration: GaugeVec,
    scrape_success: GaugeVec,
    health_stats: Option<Arc<HealthStats>>,
}

impl NodeCollector {
    pub fn new(
        namespace: &str,
        collectors: Vec<(String, Box<dyn Collector>)>,
    ) -> Result<Self, CollectorError> {
        let scrape_duration = GaugeVec::new(
            Opts::new(
                build_fq_name(namespace, "scrape", "collector_duration_seconds"),
                "Duration of a collector scrape.",
            ),
            &["collector"],
        )?;
        let scrape_success = GaugeVec::new(
            Opts::new(
                build_fq_name(namespace, "scrape", "collector_success"),
                "Whether a collector succeeded.",
            ),
            &["collector"],
        )?;

        Ok(Self {
            collectors,
            scrape_duration,
            scrape_success,
            health_stats: None,
        })
    }

    /// Reports every collector run to `stats`.
    pub fn with_health_stats(mut self, stats: Arc<HealthStats>) -> Self {
        self.health_stats = Some(stats);
        self
    }

    pub fn collector_names(&self) -> impl Iterator<Item = &str> {
        self.collectors.iter().map(|(name, _)| name.as_str())
    }

    /// Runs every collector once, in name order.
    pub fn collect_once(&self) -> Vec<CollectorOutcome<'_>> {
        self.collectors
            .iter()
            .map(|(name, collector)| {
                let start = Instant::now();
                let mut samples = Vec::new();
                let result = collector.update(&mut samples).map(|()| samples);
                CollectorOutcome {
                    name: name.as_str(),
                    duration: start.elapsed(),
                    result,
                }
            })
            .collect()
    }
}

impl PromCollector for NodeCollector {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs: Vec<&Desc> = self
            .collectors
            .iter()
            .flat_map(|(_, c)| c.descriptors())
            .map(MetricDescriptor::desc)
            .collect();
        descs.extend(self.scrape_duration.desc());
        descs.extend(self.scrape_success.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = Vec::new();

        for outcome in self.collect_once() {
            let seconds = outcome.duration.as_secs_f64();
            let success = match outcome.result {
                Ok(samples) => {
                    debug!(
                        "collector {} succeeded after {:.6}s with {} samples",
                        outcome.name,
                        seconds,
                        samples.len()
                    );
                    for sample in &samples {
                        match sample.to_metric_families() {
                            Ok(mfs) => families.extend(mfs),
                            Err(e) => {
                                error!("Failed to encode {}: {}", sample.desc.fq_name(), e)
                            }
                        }
                    }
                    true
                }
                Err(e) => {
                    error!(
                        "collector {} failed after {:.6}s: {}",
                        outcome.name, seconds, e
                    );
                    false
                }
            };

            if let Some(stats) = &self.health_stats {
                stats.record_collector_run(success, seconds);
            }
            self.scrape_duration
                .with_label_values(&[outcome.name])
                .set(seconds);
            self.scrape_success
                .with_label_values(&[outcome.name])
                .set(if success { 1.0 } else { 0.0 });
        }

        families.extend(self.scrape_duration.collect());
        families.extend(self.scrape_success.collect());
        families
    }
}

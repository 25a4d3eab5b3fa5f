//! Pressure stall information collector.
//!
//! Exposes the cumulative `total` stall times from
//! `/proc/pressure/{cpu,memory,io}` as counters in seconds.

use std::path::PathBuf;
use tracing::debug;

use crate::collector::{
    Collector, CollectorContext, CollectorError, ConstMetric, MetricDescriptor,
};
use crate::procfs::{PressureStats, ProcFs};

/// Name under which this collector is registered.
pub const COLLECTOR_NAME: &str = "pressure";

const SUBSYSTEM: &str = "pressure";

/// Collector for CPU, memory and I/O pressure.
#[derive(Debug)]
pub struct PressureCollector {
    procfs_path: PathBuf,
    cpu: MetricDescriptor,
    io: MetricDescriptor,
    io_full: MetricDescriptor,
    mem: MetricDescriptor,
    mem_full: MetricDescriptor,
}

impl PressureCollector {
    pub fn new(namespace: &str, procfs_path: impl Into<PathBuf>) -> Result<Self, CollectorError> {
        Ok(Self {
            procfs_path: procfs_path.into(),
            cpu: MetricDescriptor::new(
                namespace,
                SUBSYSTEM,
                "wait_for_cpu_seconds_total",
                "Total time in seconds that processes have waited for CPU time",
            )?,
            io: MetricDescriptor::new(
                namespace,
                SUBSYSTEM,
                "wait_for_io_seconds_total",
                "Total time in seconds that processes have waited due to IO congestion",
            )?,
            io_full: MetricDescriptor::new(
                namespace,
                SUBSYSTEM,
                "pause_for_io_seconds_total",
                "Total time in seconds no process could make progress due to IO congestion",
            )?,
            mem: MetricDescriptor::new(
                namespace,
                SUBSYSTEM,
                "wait_for_memory_seconds_total",
                "Total time in seconds that processes have waited for memory",
            )?,
            mem_full: MetricDescriptor::new(
                namespace,
                SUBSYSTEM,
                "pause_for_memory_seconds_total",
                "Total time in seconds no process could make progress due to memory congestion",
            )?,
        })
    }

    /// Factory used by the collector registry.
    pub fn factory(ctx: &CollectorContext) -> Result<Box<dyn Collector>, CollectorError> {
        Ok(Box::new(Self::new(&ctx.namespace, ctx.procfs_path.clone())?))
    }
}

/// Reads one resource. A missing file yields `Ok(None)`.
fn fetch(procfs: &ProcFs, resource: &'static str) -> Result<Option<PressureStats>, CollectorError> {
    match procfs.resource_pressure(resource) {
        Ok(stats) => Ok(Some(stats)),
        Err(e) if e.is_not_found() => {
            debug!("could not find {} pressure file: {}", resource, e);
            Ok(None)
        }
        Err(source) => Err(CollectorError::Fetch { resource, source }),
    }
}

impl Collector for PressureCollector {
    fn descriptors(&self) -> Vec<&MetricDescriptor> {
        vec![&self.cpu, &self.io, &self.io_full, &self.mem, &self.mem_full]
    }

    fn update<'a>(&'a self, sink: &mut Vec<ConstMetric<'a>>) -> Result<(), CollectorError> {
        let procfs = ProcFs::new(&self.procfs_path).map_err(CollectorError::SourceUnavailable)?;

        // All reads happen before anything is emitted, so a failure leaves
        // the sink untouched.
        let mem = fetch(&procfs, "memory")?;
        let io = fetch(&procfs, "io")?;
        let cpu = fetch(&procfs, "cpu")?;

        let some = |stats: Option<PressureStats>| stats.and_then(|s| s.some);
        let full = |stats: Option<PressureStats>| stats.and_then(|s| s.full);

        let samples = [
            (&self.cpu, some(cpu)),
            (&self.mem, some(mem)),
            (&self.io, some(io)),
            (&self.mem_full, full(mem)),
            (&self.io_full, full(io)),
        ];

        for (desc, record) in samples {
            if let Some(record) = record {
                sink.push(ConstMetric::counter(desc, record.total_seconds()));
            }
        }

        Ok(())
    }
}

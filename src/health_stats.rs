//! Health statistics and monitoring for the exporter.
//!
//! This module provides types for tracking exporter health: collector runs,
//! scrape performance and HTTP request metrics. Values are rendered as a
//! plain-text table by the `/health` endpoint.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Instant, SystemTime};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(last, avg, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only last 10 minutes of timestamps
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t).as_secs() > 600)
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            let now = Instant::now();
            guard
                .iter()
                .filter(|&&t| now.duration_since(t).as_secs() < 60)
                .count() as u64
        } else {
            0
        }
    }
}

/// Health statistics for the exporter.
pub struct HealthStats {
    // Collector runs
    pub collector_success_count: AtomicU64,
    pub collector_failure_count: AtomicU64,
    pub collector_duration_seconds: Stat,
    last_run_failed: AtomicBool,

    // Scrapes
    pub total_scrapes: AtomicU64,
    pub scrape_duration_seconds: Stat,
    pub total_time_series: Stat,
    pub metrics_response_size_kb: Stat,

    // HTTP server stats
    pub http_request_timestamps: RequestTimestamps,
    pub request_duration_ms: Stat,

    // Timing
    pub start_time: Instant,
    pub last_scrape_time: StdRwLock<Option<Instant>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            collector_success_count: AtomicU64::new(0),
            collector_failure_count: AtomicU64::new(0),
            collector_duration_seconds: Stat::default(),
            last_run_failed: AtomicBool::new(false),
            total_scrapes: AtomicU64::new(0),
            scrape_duration_seconds: Stat::default(),
            total_time_series: Stat::default(),
            metrics_response_size_kb: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            request_duration_ms: Stat::default(),
            start_time: Instant::now(),
            last_scrape_time: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records one collector run.
    pub fn record_collector_run(&self, success: bool, duration_seconds: f64) {
        if success {
            self.collector_success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.collector_failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.last_run_failed.store(!success, Ordering::Relaxed);
        self.collector_duration_seconds.add_sample(duration_seconds);
    }

    /// Records a completed `/metrics` scrape.
    pub fn record_scrape(&self, duration_seconds: f64, time_series: u64, response_size_kb: f64) {
        self.total_scrapes.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_seconds.add_sample(duration_seconds);
        self.total_time_series.add_sample(time_series as f64);
        self.metrics_response_size_kb.add_sample(response_size_kb);
        if let Ok(mut guard) = self.last_scrape_time.write() {
            *guard = Some(Instant::now());
        }
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_request_duration(&self, duration_ms: f64) {
        self.request_duration_ms.add_sample(duration_ms);
    }

    pub fn collector_successes(&self) -> u64 {
        self.collector_success_count.load(Ordering::Relaxed)
    }

    pub fn collector_failures(&self) -> u64 {
        self.collector_failure_count.load(Ordering::Relaxed)
    }

    /// False once the most recent collector run failed.
    pub fn last_run_succeeded(&self) -> bool {
        !self.last_run_failed.load(Ordering::Relaxed)
    }

    pub fn get_success_rate(&self) -> f64 {
        let success = self.collector_successes();
        let failure = self.collector_failures();
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_hours(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() / 3600.0
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Wall-clock time (UTC, HH:MM:SS) of the last scrape.
    pub fn get_last_scrape_time_str(&self) -> String {
        const SECS_PER_DAY: u64 = 86400;
        const SECS_PER_HOUR: u64 = 3600;
        const SECS_PER_MINUTE: u64 = 60;

        if let Ok(guard) = self.last_scrape_time.read() {
            if let Some(last_scrape) = *guard {
                let elapsed = last_scrape.elapsed();
                if let Ok(duration) = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
                    let secs = duration.as_secs().saturating_sub(elapsed.as_secs());
                    let hours = (secs % SECS_PER_DAY) / SECS_PER_HOUR;
                    let minutes = (secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
                    let seconds = secs % SECS_PER_MINUTE;
                    return format!("{:02}:{:02}:{:02}", hours, minutes, seconds);
                }
            }
        }
        "N/A".to_string()
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.collector_duration_seconds.snapshot();
        let (sd_cur, sd_avg, sd_max, sd_min, _) = self.scrape_duration_seconds.snapshot();
        let (ts_cur, ts_avg, ts_max, ts_min, _) = self.total_time_series.snapshot();
        let (rs_cur, rs_avg, rs_max, rs_min, _) = self.metrics_response_size_kb.snapshot();
        let (rd_cur, rd_avg, rd_max, rd_min, _) = self.request_duration_ms.snapshot();

        let success_rate = self.get_success_rate();
        let total_scrapes = self.total_scrapes.load(Ordering::Relaxed);
        let http_requests_last_minute = self.http_request_timestamps.count_last_minute();

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();
        row(&mut out, "", "current", "average", "max", "min");

        writeln!(out).ok();
        writeln!(out, "COLLECTORS").ok();
        writeln!(out, "----------").ok();
        stat_row(&mut out, "collector_duration (s)", 3, (cd_cur, cd_avg, cd_max, cd_min));
        let rate = format!("{:.1}", success_rate);
        row(&mut out, "collector_success_rate (%)", &rate, &rate, &rate, &rate);
        count_row(&mut out, "collector_successes", self.collector_successes());
        count_row(&mut out, "collector_failures", self.collector_failures());

        writeln!(out).ok();
        writeln!(out, "SCRAPES").ok();
        writeln!(out, "-------").ok();
        stat_row(&mut out, "scrape_duration (s)", 3, (sd_cur, sd_avg, sd_max, sd_min));
        stat_row(&mut out, "time_series", 0, (ts_cur, ts_avg, ts_max, ts_min));
        stat_row(&mut out, "response_size (KB)", 1, (rs_cur, rs_avg, rs_max, rs_min));
        count_row(&mut out, "total_scrapes", total_scrapes);

        writeln!(out).ok();
        writeln!(out, "HTTP SERVER").ok();
        writeln!(out, "-----------").ok();
        count_row(&mut out, "http_requests_last_minute", http_requests_last_minute);
        stat_row(&mut out, "request_duration (ms)", 1, (rd_cur, rd_avg, rd_max, rd_min));

        writeln!(out).ok();
        writeln!(out, "uptime (h):         {:.2}", self.get_uptime_hours()).ok();
        writeln!(out, "last scrape (UTC):  {}", self.get_last_scrape_time_str()).ok();
        out
    }
}

const LEFT_COL: usize = 26;
const COL_W: usize = 12;

fn row(out: &mut String, name: &str, cur: &str, avg: &str, max: &str, min: &str) {
    writeln!(
        out,
        "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
        name,
        cur,
        avg,
        max,
        min,
        left = LEFT_COL,
        col = COL_W
    )
    .ok();
}

fn stat_row(out: &mut String, name: &str, precision: usize, values: (f64, f64, f64, f64)) {
    let (cur, avg, max, min) = values;
    row(
        out,
        name,
        &format!("{:.*}", precision, cur),
        &format!("{:.*}", precision.max(1), avg),
        &format!("{:.*}", precision, max),
        &format!("{:.*}", precision, min),
    );
}

fn count_row(out: &mut String, name: &str, value: u64) {
    row(out, name, &value.to_string(), "N/A", "N/A", "N/A");
}

//! Parser for `/proc/pressure/{cpu,memory,io}`.
//!
//! Each file has up to two lines:
//!
//! ```text
//! some avg10=0.00 avg60=0.00 avg300=0.00 total=123456789
//! full avg10=0.00 avg60=0.00 avg300=0.00 total=12345678
//! ```
//!
//! `total` is the cumulative stall time in microseconds since boot.

use std::str::FromStr;

/// One `some` or `full` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureRecord {
    pub avg10: f64,
    pub avg60: f64,
    pub avg300: f64,
    /// Cumulative stall time in microseconds.
    pub total: u64,
}

impl PressureRecord {
    /// Cumulative stall time in seconds.
    pub fn total_seconds(&self) -> f64 {
        self.total as f64 / 1_000_000.0
    }
}

/// Parsed pressure file for a single resource.
///
/// A record is `None` when the kernel does not report that dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PressureStats {
    pub some: Option<PressureRecord>,
    pub full: Option<PressureRecord>,
}

impl FromStr for PressureStats {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_pressure(s)
    }
}

/// Parses the contents of a pressure file.
pub fn parse_pressure(content: &str) -> Result<PressureStats, String> {
    let mut stats = PressureStats::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let kind = parts.next().unwrap_or_default();
        let record = parse_record(parts)
            .map_err(|e| format!("invalid '{}' line '{}': {}", kind, line, e))?;

        let slot = match kind {
            "some" => &mut stats.some,
            "full" => &mut stats.full,
            other => return Err(format!("unknown pressure line prefix '{}'", other)),
        };
        if slot.replace(record).is_some() {
            return Err(format!("duplicate '{}' line", kind));
        }
    }

    Ok(stats)
}

fn parse_record<'a>(fields: impl Iterator<Item = &'a str>) -> Result<PressureRecord, String> {
    let mut avg10 = None;
    let mut avg60 = None;
    let mut avg300 = None;
    let mut total = None;

    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| format!("field '{}' is not key=value", field))?;

        let duplicate = match key {
            "avg10" => avg10.replace(parse_avg(key, value)?).is_some(),
            "avg60" => avg60.replace(parse_avg(key, value)?).is_some(),
            "avg300" => avg300.replace(parse_avg(key, value)?).is_some(),
            "total" => total
                .replace(
                    value
                        .parse::<u64>()
                        .map_err(|e| format!("failed to parse total '{}': {}", value, e))?,
                )
                .is_some(),
            other => return Err(format!("unexpected key '{}'", other)),
        };
        if duplicate {
            return Err(format!("duplicate key '{}'", key));
        }
    }

    match (avg10, avg60, avg300, total) {
        (Some(avg10), Some(avg60), Some(avg300), Some(total)) => Ok(PressureRecord {
            avg10,
            avg60,
            avg300,
            total,
        }),
        _ => Err("expected avg10, avg60, avg300 and total".to_string()),
    }
}

fn parse_avg(key: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|e| format!("failed to parse {} '{}': {}", key, value, e))
}

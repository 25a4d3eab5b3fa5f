//! Integration tests for health stats module.
//!
//! These tests verify that HealthStats tracks collector runs and scrapes
//! and renders them in the /health table.

use node_pressure_exporter::health_stats::HealthStats;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[test]
fn test_health_stats_initialize_empty() {
    let stats = HealthStats::new();

    assert_eq!(stats.collector_successes(), 0);
    assert_eq!(stats.collector_failures(), 0);
    assert_eq!(stats.total_scrapes.load(Ordering::Relaxed), 0);
    assert!(stats.last_run_succeeded());
    assert_eq!(stats.get_success_rate(), 100.0);
    assert_eq!(stats.get_last_scrape_time_str(), "N/A");

    let (cur, avg, _, _, count) = stats.scrape_duration_seconds.snapshot();
    assert_eq!(count, 0);
    assert_eq!(cur, 0.0);
    assert_eq!(avg, 0.0);
}

#[test]
fn test_collector_runs_update_success_rate() {
    let stats = HealthStats::new();

    stats.record_collector_run(true, 0.001);
    stats.record_collector_run(true, 0.002);
    stats.record_collector_run(true, 0.003);
    stats.record_collector_run(false, 0.004);

    assert_eq!(stats.collector_successes(), 3);
    assert_eq!(stats.collector_failures(), 1);
    assert!(!stats.last_run_succeeded());
    assert!((stats.get_success_rate() - 75.0).abs() < f64::EPSILON);

    let (cur, _, max, min, count) = stats.collector_duration_seconds.snapshot();
    assert_eq!(count, 4);
    assert!((cur - 0.004).abs() < 1e-12);
    assert!((max - 0.004).abs() < 1e-12);
    assert!((min - 0.001).abs() < 1e-12);

    // A later success clears the failed flag
    stats.record_collector_run(true, 0.001);
    assert!(stats.last_run_succeeded());
}

#[test]
fn test_record_scrape() {
    let stats = HealthStats::new();

    stats.record_scrape(0.010, 7, 1.5);
    stats.record_scrape(0.030, 7, 1.5);

    assert_eq!(stats.total_scrapes.load(Ordering::Relaxed), 2);
    let (cur, avg, _, _, count) = stats.scrape_duration_seconds.snapshot();
    assert_eq!(count, 2);
    assert!((cur - 0.030).abs() < 1e-12);
    assert!((avg - 0.020).abs() < 1e-12);
    assert_ne!(stats.get_last_scrape_time_str(), "N/A");
}

#[test]
fn test_http_requests_counted() {
    let stats = HealthStats::new();

    for _ in 0..5 {
        stats.record_http_request();
    }
    stats.record_request_duration(2.5);

    assert_eq!(stats.http_request_timestamps.count_last_minute(), 5);
    let (cur, _, _, _, count) = stats.request_duration_ms.snapshot();
    assert_eq!(count, 1);
    assert_eq!(cur, 2.5);
}

#[test]
fn test_render_table_sections() {
    let stats = HealthStats::new();
    stats.record_collector_run(true, 0.001);
    stats.record_scrape(0.01, 12, 2.0);

    let table = stats.render_table();

    assert!(table.contains("HEALTH ENDPOINT - EXPORTER INTERNAL STATS"));
    assert!(table.contains("COLLECTORS"));
    assert!(table.contains("SCRAPES"));
    assert!(table.contains("HTTP SERVER"));
    assert!(table.contains("collector_successes"));
    assert!(table.contains("total_scrapes"));
    assert!(table.contains("uptime (h):"));
}

#[test]
fn test_thread_safety() {
    use std::thread;

    let stats = Arc::new(HealthStats::new());
    let mut handles = vec![];

    for i in 0..10 {
        let stats_clone = Arc::clone(&stats);
        let handle = thread::spawn(move || {
            for j in 0..100 {
                stats_clone.record_collector_run((i + j) % 4 != 0, 0.001);
                stats_clone.record_http_request();
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stats.collector_successes() + stats.collector_failures(), 1000);
    assert_eq!(stats.http_request_timestamps.count_last_minute(), 1000);
    let (_, _, _, _, count) = stats.collector_duration_seconds.snapshot();
    assert_eq!(count, 1000);
}

//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler. Every request runs
//! the enabled collectors against procfs and returns the result in
//! Prometheus text format.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    GatherFailed,
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            MetricsError::GatherFailed => "Failed to gather metrics",
            MetricsError::EncodingFailed => "Failed to encode metrics",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    // Collectors read procfs synchronously
    let registry = state.registry.clone();
    let families = tokio::task::spawn_blocking(move || registry.gather())
        .await
        .map_err(|e| {
            error!("Metrics gathering task failed: {}", e);
            MetricsError::GatherFailed
        })?;

    let encoder = TextEncoder::new();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        error!("Failed to encode Prometheus metrics: {}", e);
        return Err(MetricsError::EncodingFailed);
    }

    let time_series = families.iter().map(|f| f.get_metric().len()).sum::<usize>() as u64;
    let duration = start.elapsed();
    state.health_stats.record_scrape(
        duration.as_secs_f64(),
        time_series,
        buffer.len() as f64 / 1024.0,
    );
    state
        .health_stats
        .record_request_duration(duration.as_secs_f64() * 1000.0);

    debug!(
        "Metrics request completed: {} series, {} bytes, {:.3}ms",
        time_series,
        buffer.len(),
        duration.as_secs_f64() * 1000.0
    );

    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    ))
}

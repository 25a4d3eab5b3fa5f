//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the current exporter configuration.

use axum::{extract::State, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");
    state.health_stats.record_http_request();

    let cfg = &state.config;

    let mut out = String::new();

    writeln!(out, "NODE PRESSURE EXPORTER - CONFIGURATION").ok();
    writeln!(out, "======================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(
        out,
        "bind:                       {}",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    )
    .ok();
    writeln!(
        out,
        "port:                       {}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    )
    .ok();
    writeln!(
        out,
        "enable_health:              {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "TLS/SSL CONFIGURATION").ok();
    writeln!(out, "---------------------").ok();
    writeln!(
        out,
        "enable_tls:                 {}",
        cfg.enable_tls.unwrap_or(false)
    )
    .ok();
    writeln!(
        out,
        "tls_cert_path:              {}",
        cfg.tls_cert_path.as_deref().unwrap_or("not set")
    )
    .ok();
    writeln!(
        out,
        "tls_key_path:               {}",
        cfg.tls_key_path.as_deref().unwrap_or("not set")
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "METRICS COLLECTION").ok();
    writeln!(out, "------------------").ok();
    writeln!(out, "namespace:                  {}", cfg.namespace()).ok();
    writeln!(
        out,
        "procfs_path:                {}",
        cfg.procfs_path().display()
    )
    .ok();
    match &cfg.collectors {
        Some(collectors) if !collectors.is_empty() => {
            for (name, enabled) in collectors {
                writeln!(out, "collector.{:<17} {}", format!("{name}:"), enabled).ok();
            }
        }
        _ => {
            writeln!(out, "collectors:                 defaults").ok();
        }
    }
    writeln!(out).ok();

    writeln!(out, "{FOOTER_TEXT}").ok();

    ([("Content-Type", "text/plain; charset=utf-8")], out)
}

//! Configuration management for node-pressure-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use node_pressure_exporter::collectors::{self, pressure};
use node_pressure_exporter::{CollectorContext, CollectorError, CollectorRegistry, NodeCollector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9100;
pub const DEFAULT_NAMESPACE: &str = "node";
pub const DEFAULT_PROCFS_PATH: &str = node_pressure_exporter::procfs::DEFAULT_MOUNT_POINT;

/// Exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Metrics collection
    pub namespace: Option<String>,
    #[serde(alias = "procfs-path")]
    pub procfs_path: Option<PathBuf>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// Per-collector enable overrides, keyed by collector name
    pub collectors: Option<BTreeMap<String, bool>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            namespace: Some(DEFAULT_NAMESPACE.to_string()),
            procfs_path: Some(PathBuf::from(DEFAULT_PROCFS_PATH)),
            collectors: Some(BTreeMap::from([(pressure::COLLECTOR_NAME.to_string(), true)])),
            enable_health: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn procfs_path(&self) -> &Path {
        self.procfs_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROCFS_PATH))
    }

    /// Builds the enabled collectors from the built-in set.
    pub fn build_node_collector(&self) -> Result<NodeCollector, CollectorError> {
        let mut registry = CollectorRegistry::new();
        collectors::register_defaults(&mut registry)?;

        let ctx = CollectorContext {
            namespace: self.namespace().to_string(),
            procfs_path: self.procfs_path().to_path_buf(),
        };
        let overrides = self.collectors.clone().unwrap_or_default();
        registry.build(&ctx, &overrides)
    }
}

fn is_valid_metric_prefix(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let namespace = cfg.namespace();
    if !is_valid_metric_prefix(namespace) {
        return Err(format!(
            "Invalid namespace '{}': must match [a-zA-Z_:][a-zA-Z0-9_:]*",
            namespace
        )
        .into());
    }

    let procfs_path = cfg.procfs_path();
    if !procfs_path.is_absolute() {
        return Err(format!(
            "procfs_path must be an absolute path, got '{}'",
            procfs_path.display()
        )
        .into());
    }

    if let Some(overrides) = &cfg.collectors {
        let mut registry = CollectorRegistry::new();
        collectors::register_defaults(&mut registry)?;
        for name in overrides.keys() {
            if !registry.names().any(|(known, _)| known == name.as_str()) {
                return Err(format!("Unknown collector '{}' in collectors", name).into());
            }
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file("TLS certificate", cert)?;
                check_pem_file("TLS private key", key)?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(what: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("{} file is empty: {}", what, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("{} file not found: {}", what, path).into())
        }
        Err(e) => Err(format!("{} file is not readable: {} ({})", what, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(namespace) = &args.namespace {
        config.namespace = Some(namespace.clone());
    }
    if let Some(path) = &args.procfs_path {
        config.procfs_path = Some(path.clone());
    }

    // Collector toggles
    if args.collector_pressure || args.no_collector_pressure {
        config
            .collectors
            .get_or_insert_with(BTreeMap::new)
            .insert(
                pressure::COLLECTOR_NAME.to_string(),
                args.collector_pressure,
            );
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            let defaults = [
                "/etc/node-pressure-exporter/config.yaml",
                "/etc/node-pressure-exporter/config.yml",
                "/etc/node-pressure-exporter/config.json",
                "./node-pressure-exporter.yaml",
                "./node-pressure-exporter.yml",
                "./node-pressure-exporter.json",
            ];

            match defaults.iter().map(Path::new).find(|p| p.exists()) {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders a configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

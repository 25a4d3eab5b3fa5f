//! Integration tests for the command-line surface.
//!
//! These run the built binary with `--no-config` so that no config file on
//! the host influences the result.

use std::fs;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

fn binary_path() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_node-pressure-exporter"))
}

fn run(args: &[&str]) -> Output {
    Command::new(binary_path())
        .arg("--no-config")
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn fake_procfs() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pressure = dir.path().join("pressure");
    fs::create_dir(&pressure).unwrap();
    fs::write(
        pressure.join("cpu"),
        "some avg10=0.00 avg60=0.00 avg300=0.00 total=5000000\n",
    )
    .unwrap();
    fs::write(
        pressure.join("memory"),
        "some avg10=0.00 avg60=0.00 avg300=0.00 total=2000000\n\
         full avg10=0.00 avg60=0.00 avg300=0.00 total=1000000\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_invalid_namespace_rejected() {
    let output = run(&["--namespace", "node-pressure", "--check-config"]);
    let text = combined(&output);

    assert!(!output.status.success());
    assert!(text.contains("Invalid namespace"), "got: {text}");
}

#[test]
fn test_empty_namespace_rejected() {
    let output = run(&["--namespace", "", "--check-config"]);
    let text = combined(&output);

    assert!(!output.status.success());
    assert!(text.contains("Invalid namespace ''"), "got: {text}");
}

#[test]
fn test_relative_procfs_path_rejected() {
    let output = run(&["--procfs-path", "proc", "--check-config"]);
    let text = combined(&output);

    assert!(!output.status.success());
    assert!(text.contains("procfs_path must be an absolute path"), "got: {text}");
}

#[test]
fn test_default_config_is_valid() {
    let output = run(&["--check-config"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Configuration is valid"));
}

#[test]
fn test_show_config_reflects_cli_overrides() {
    let output = run(&[
        "--namespace",
        "host",
        "--procfs-path",
        "/host/proc",
        "--no-collector-pressure",
        "--show-config",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("namespace: host"), "got: {stdout}");
    assert!(stdout.contains("procfs_path: /host/proc"), "got: {stdout}");
    assert!(stdout.contains("pressure: false"), "got: {stdout}");
}

#[test]
fn test_collector_flags_conflict() {
    let output = run(&["--collector-pressure", "--no-collector-pressure", "--check-config"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exporter.json");
    fs::write(&path, r#"{"namespace": "fromfile"}"#).unwrap();

    let output = Command::new(binary_path())
        .args(["--config", path.to_str().unwrap(), "--show-config"])
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", combined(&output));
    assert!(stdout.contains("namespace: fromfile"), "got: {stdout}");
}

#[test]
fn test_unknown_collector_in_config_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exporter.yaml");
    fs::write(&path, "collectors:\n  pressure: true\n  diskstats: true\n").unwrap();

    let output = Command::new(binary_path())
        .args(["--config", path.to_str().unwrap(), "--check-config"])
        .output()
        .expect("Failed to execute command");
    let text = combined(&output);

    assert!(!output.status.success());
    assert!(text.contains("Unknown collector 'diskstats'"), "got: {text}");
}

#[test]
fn test_missing_explicit_config_file_fails() {
    let output = Command::new(binary_path())
        .args(["--config", "/nonexistent/exporter.yaml", "--show-config"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(combined(&output).contains("Config file not found"));
}

#[test]
fn test_test_command_prints_samples() {
    let procfs = fake_procfs();
    let output = run(&[
        "--log-level",
        "off",
        "--procfs-path",
        procfs.path().to_str().unwrap(),
        "test",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", combined(&output));
    assert!(stdout.contains("node_pressure_wait_for_cpu_seconds_total = 5"));
    assert!(stdout.contains("node_pressure_wait_for_memory_seconds_total = 2"));
    assert!(stdout.contains("node_pressure_pause_for_memory_seconds_total = 1"));
    assert!(!stdout.contains("node_pressure_wait_for_io_seconds_total"));
}

#[test]
fn test_test_command_fails_on_malformed_file() {
    let procfs = fake_procfs();
    fs::write(procfs.path().join("pressure").join("io"), "garbage\n").unwrap();

    let output = run(&[
        "--log-level",
        "off",
        "--procfs-path",
        procfs.path().to_str().unwrap(),
        "test",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pressure failed"));
}

#[test]
fn test_check_command_reports_resources() {
    let procfs = fake_procfs();
    let output = run(&[
        "--log-level",
        "off",
        "--procfs-path",
        procfs.path().to_str().unwrap(),
        "check",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", combined(&output));
    assert!(stdout.contains("cpu pressure available"));
    assert!(stdout.contains("io pressure not reported"));
    assert!(stdout.contains("Enabled: pressure"));
}

fn pem_file(label: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "-----BEGIN {label}-----\nDUMMY\n-----END {label}-----").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_tls_pairing_rules() {
    let cases: [(&[&str], &str); 3] = [
        (
            &[],
            "TLS is enabled but neither tls_cert_path nor tls_key_path are set",
        ),
        (
            &["--tls-cert", "/some/cert.pem"],
            "TLS is enabled but tls_key_path is not set",
        ),
        (
            &["--tls-key", "/some/key.pem"],
            "TLS is enabled but tls_cert_path is not set",
        ),
    ];

    for (extra, expected) in cases {
        let mut args = vec!["--enable-tls"];
        args.extend_from_slice(extra);
        args.push("--check-config");

        let output = run(&args);
        let text = combined(&output);

        assert!(!output.status.success(), "args {args:?} should fail");
        assert!(text.contains(expected), "args {args:?}, got: {text}");
    }
}

#[test]
fn test_tls_missing_and_empty_files_rejected() {
    let output = run(&[
        "--enable-tls",
        "--tls-cert",
        "/nonexistent/cert.pem",
        "--tls-key",
        "/nonexistent/key.pem",
        "--check-config",
    ]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("TLS certificate file not found"));

    let cert = pem_file("CERTIFICATE");
    let empty_key = NamedTempFile::new().unwrap();
    let output = run(&[
        "--enable-tls",
        "--tls-cert",
        cert.path().to_str().unwrap(),
        "--tls-key",
        empty_key.path().to_str().unwrap(),
        "--check-config",
    ]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("TLS private key file is empty"));
}

#[test]
fn test_tls_with_both_files_is_valid() {
    let cert = pem_file("CERTIFICATE");
    let key = pem_file("PRIVATE KEY");

    let output = run(&[
        "--enable-tls",
        "--tls-cert",
        cert.path().to_str().unwrap(),
        "--tls-key",
        key.path().to_str().unwrap(),
        "--check-config",
    ]);

    assert!(output.status.success(), "{}", combined(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));
}

#[test]
fn test_tls_disabled_by_default() {
    let output = run(&["--show-config"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("enable_tls: false"), "got: {stdout}");
    assert!(stdout.contains("tls_cert_path: null"), "got: {stdout}");
}

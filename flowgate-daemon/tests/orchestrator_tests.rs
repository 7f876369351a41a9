//! Orchestrator integration tests.
//!
//! Tests the flow: config -> engine build -> start -> health check -> shutdown.
//! Attaching XDP needs a compiled object and privileges, so the enabled-engine
//! cases only cover the failure path.

use std::io::Write;

use flowgate_core::config::FlowgateConfig;
use flowgate_core::pipeline::HealthStatus;
use flowgate_daemon::orchestrator::Orchestrator;

fn disabled_filter_config() -> FlowgateConfig {
    FlowgateConfig::parse("[filter]\nenabled = false\n").expect("failed to parse config")
}

fn missing_program_config() -> FlowgateConfig {
    let mut config = FlowgateConfig::default();
    config.filter.program_path = "/nonexistent/flowgate-ebpf".to_owned();
    config.filter.bans = vec!["192.168.1.100".to_owned()];
    config
}

#[test]
fn test_build_with_filter_disabled() {
    let orchestrator = Orchestrator::build_from_config(disabled_filter_config())
        .expect("orchestrator should build");
    assert!(orchestrator.engine().is_none());
    assert!(!orchestrator.config().filter.enabled);
}

#[test]
fn test_build_with_filter_enabled_creates_engine() {
    let orchestrator = Orchestrator::build_from_config(missing_program_config())
        .expect("engine build does not touch the object file");

    let engine = orchestrator.engine().expect("engine should exist");
    assert!(!engine.is_running());
    assert_eq!(engine.config().bans.len(), 1);
}

#[test]
fn test_build_rejects_invalid_config() {
    let mut config = FlowgateConfig::default();
    config.filter.table_max_entries = 0;
    assert!(Orchestrator::build_from_config(config).is_err());
}

#[tokio::test]
async fn test_build_from_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"[filter]\nenabled = false\n[general]\nlog_format = \"pretty\"\n")
        .expect("write config");

    let orchestrator = Orchestrator::build(file.path()).await.expect("should build");
    assert_eq!(orchestrator.config().general.log_format, "pretty");
}

#[tokio::test]
async fn test_build_from_missing_path_fails() {
    let result = Orchestrator::build(std::path::Path::new("/nonexistent/flowgate.toml")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_until_with_filter_disabled() {
    let mut orchestrator =
        Orchestrator::build_from_config(disabled_filter_config()).expect("should build");

    let result = orchestrator.run_until(async { Ok("test") }).await;
    assert!(result.is_ok(), "run should complete: {:?}", result.err());
}

#[tokio::test]
async fn test_run_until_propagates_shutdown_error() {
    let mut orchestrator =
        Orchestrator::build_from_config(disabled_filter_config()).expect("should build");

    let result = orchestrator
        .run_until(async { Err(anyhow::anyhow!("signal handler unavailable")) })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_fails_when_program_object_missing() {
    let mut orchestrator =
        Orchestrator::build_from_config(missing_program_config()).expect("should build");

    let result = orchestrator.run_until(async { Ok("test") }).await;
    assert!(result.is_err(), "start should fail without the XDP object");

    let engine = orchestrator.engine().expect("engine should exist");
    assert!(!engine.is_running());
    assert!(engine.attached_interface().is_none());
}

#[tokio::test]
async fn test_health_with_filter_disabled_is_healthy() {
    let orchestrator =
        Orchestrator::build_from_config(disabled_filter_config()).expect("should build");

    let health = orchestrator.health().await;
    assert!(health.status.is_healthy());
    assert_eq!(health.components.len(), 1);
    assert!(!health.components[0].enabled);
}

#[tokio::test]
async fn test_health_before_start_is_unhealthy() {
    let orchestrator =
        Orchestrator::build_from_config(missing_program_config()).expect("should build");

    let health = orchestrator.health().await;
    assert!(matches!(health.status, HealthStatus::Unhealthy(_)));
    assert_eq!(health.components[0].name, "filter-engine");
}

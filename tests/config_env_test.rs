//! Config environment variable tests
//!
//! These tests verify that Config::from_env() reads and applies environment
//! variable overrides. Config::from_env() also loads a .env file via dotenvy
//! when present, so each test sets the variables it asserts on.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use analysis_jobs::config::{Config, LogFormat};
use analysis_jobs::AppError;
use serial_test::serial;
use std::env;
use std::time::Duration;

#[test]
#[serial]
fn test_config_from_env_loads_successfully() {
    let result = Config::from_env();
    assert!(result.is_ok(), "Config::from_env() should succeed: {:?}", result.err());
}

#[test]
#[serial]
fn test_config_from_env_custom_base_url() {
    env::set_var("ANALYSIS_API_BASE_URL", "https://analysis.example.com/api");

    let config = Config::from_env().unwrap();
    assert_eq!(config.api.base_url, "https://analysis.example.com/api");

    env::remove_var("ANALYSIS_API_BASE_URL");
}

#[test]
#[serial]
fn test_config_rejects_invalid_base_url() {
    env::set_var("ANALYSIS_API_BASE_URL", "not a url");

    let result = Config::from_env();
    assert!(matches!(result, Err(AppError::Config { .. })));

    env::remove_var("ANALYSIS_API_BASE_URL");
}

#[test]
#[serial]
fn test_config_rejects_base_url_without_path() {
    env::set_var("ANALYSIS_API_BASE_URL", "mailto:ops@example.com");

    let result = Config::from_env();
    match result {
        Err(AppError::Config { message }) => assert!(message.contains("mailto:ops@example.com")),
        other => panic!("expected a config error, got {:?}", other.map(|_| ())),
    }

    env::remove_var("ANALYSIS_API_BASE_URL");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_from_env_log_level() {
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "debug");

    env::remove_var("LOG_LEVEL");
}

#[test]
#[serial]
fn test_config_from_env_custom_stream() {
    env::set_var("STREAM_MAX_RECONNECTS", "5");
    env::set_var("STREAM_RECONNECT_BASE_MS", "250");
    env::set_var("STREAM_HEARTBEAT_TIMEOUT_MS", "30000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.stream.max_reconnect_attempts, 5);
    assert_eq!(config.stream.reconnect_delay(1), Duration::from_millis(500));
    assert_eq!(config.stream.heartbeat_timeout(), Some(Duration::from_secs(30)));

    env::remove_var("STREAM_MAX_RECONNECTS");
    env::remove_var("STREAM_RECONNECT_BASE_MS");
    env::remove_var("STREAM_HEARTBEAT_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_zero_heartbeat_timeout_disables_it() {
    env::set_var("STREAM_HEARTBEAT_TIMEOUT_MS", "0");

    let config = Config::from_env().unwrap();
    assert_eq!(config.stream.heartbeat_timeout(), None);

    env::remove_var("STREAM_HEARTBEAT_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    env::set_var("REQUEST_CONNECT_TIMEOUT_MS", "not-a-number");
    env::set_var("STREAM_MAX_RECONNECTS", "-1");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.connect_timeout_ms, 10000);
    assert_eq!(config.stream.max_reconnect_attempts, 3);

    env::remove_var("REQUEST_CONNECT_TIMEOUT_MS");
    env::remove_var("STREAM_MAX_RECONNECTS");
}

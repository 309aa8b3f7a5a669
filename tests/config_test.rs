//! Configuration loading tests
//!
//! Covers JSON files, environment overrides and validation of the loaded
//! result. Tests touching `PROTOCOL_ROUTER_*` variables run serially.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use protocol_router::config::{
    ConfigError, ConfigLoader, ConfigValidator, RouteConfig, RouterConfig,
};

const ENV_VARS: &[&str] = &[
    "PROTOCOL_ROUTER_LISTEN",
    "PROTOCOL_ROUTER_PROTOCOLS",
    "PROTOCOL_ROUTER_FALLBACK",
    "PROTOCOL_ROUTER_LOG_LEVEL",
    "PROTOCOL_ROUTER_BUFFER_SIZE",
    "PROTOCOL_ROUTER_DETECT_TIMEOUT",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(json: &serde_json::Value) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{}", json).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let file = write_config(&serde_json::json!({
        "listen": "127.0.0.1:9443",
        "protocols": ["http", "tls"],
        "routes": [
            { "hostname": "example.com", "backend": "10.0.0.1:8080" },
            { "hostname": "*.example.org", "backend": "*" }
        ],
        "fallback": "10.0.0.9:80",
        "detect_timeout": 2
    }));

    let config = RouterConfig::from_file(file.path()).unwrap();

    assert_eq!(config.listen.to_string(), "127.0.0.1:9443");
    assert_eq!(config.protocols, vec!["http", "tls"]);
    assert_eq!(
        config.routes,
        vec![
            RouteConfig::new("example.com", "10.0.0.1:8080"),
            RouteConfig::new("*.example.org", "*"),
        ]
    );
    assert_eq!(config.fallback.as_deref(), Some("10.0.0.9:80"));
    assert_eq!(config.detect_timeout, 2);
    // Unset fields keep their defaults
    assert_eq!(config.buffer_size, 8192);
    assert_eq!(config.log_level, "info");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_missing_file() {
    let result = RouterConfig::from_file(Path::new("/nonexistent/router.json"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
#[serial]
fn test_unknown_field_is_rejected() {
    let file = write_config(&serde_json::json!({
        "listen": "127.0.0.1:9443",
        "cert_path": "x.pem"
    }));
    assert!(RouterConfig::from_file(file.path()).is_err());
}

#[test]
#[serial]
fn test_bad_listen_address_is_rejected() {
    let file = write_config(&serde_json::json!({ "listen": "not an address" }));
    assert!(RouterConfig::from_file(file.path()).is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = write_config(&serde_json::json!({
        "listen": "127.0.0.1:9443",
        "log_level": "debug",
        "buffer_size": 1024
    }));

    env::set_var("PROTOCOL_ROUTER_LOG_LEVEL", "trace");
    env::set_var("PROTOCOL_ROUTER_BUFFER_SIZE", "4096");
    env::set_var("PROTOCOL_ROUTER_PROTOCOLS", "http");

    let result = RouterConfig::load(Some(file.path()));
    clear_env();
    let config = result.unwrap();

    assert_eq!(config.listen.to_string(), "127.0.0.1:9443");
    assert_eq!(config.log_level, "trace");
    assert_eq!(config.buffer_size, 4096);
    assert_eq!(config.protocols, vec!["http"]);
}

#[test]
#[serial]
fn test_from_env_only() {
    clear_env();
    env::set_var("PROTOCOL_ROUTER_LISTEN", "127.0.0.1:7000");
    env::set_var("PROTOCOL_ROUTER_FALLBACK", "127.0.0.1:7001");
    env::set_var("PROTOCOL_ROUTER_DETECT_TIMEOUT", "9");

    let result = RouterConfig::from_env();
    clear_env();
    let config = result.unwrap();

    assert_eq!(config.listen.to_string(), "127.0.0.1:7000");
    assert_eq!(config.fallback.as_deref(), Some("127.0.0.1:7001"));
    assert_eq!(config.detect_timeout, 9);
    assert_eq!(config.protocols, vec!["tls", "http"]);
}

#[test]
#[serial]
fn test_load_without_file_uses_defaults() {
    clear_env();
    let config = RouterConfig::load(None).unwrap();
    assert_eq!(config, RouterConfig::default());
}

#[test]
#[serial]
fn test_loaded_config_with_unknown_protocol_fails_validation() {
    clear_env();
    let file = write_config(&serde_json::json!({ "protocols": ["tls", "gopher"] }));

    let config = RouterConfig::from_file(file.path()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_loaded_config_with_unknown_log_level_fails_validation() {
    clear_env();
    let file = write_config(&serde_json::json!({ "log_level": "verbose" }));

    let config = RouterConfig::from_file(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("log_level"));
}

//! Configuration types
//!
//! This module defines the router configuration structure.

use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use super::defaults;
use crate::common::parse_socket_addr;

/// Custom deserializer for socket addresses
fn deserialize_socket_addr<'de, D>(deserializer: D) -> std::result::Result<SocketAddr, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_socket_addr(&s).map_err(serde::de::Error::custom)
}

/// One routing table entry
///
/// `hostname` is either an exact name or a `*.suffix` wildcard. `backend` is
/// a `host:port`, or `*` to connect to the requested hostname on the
/// protocol's default port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub hostname: String,
    pub backend: String,
}

impl RouteConfig {
    pub fn new(hostname: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            backend: backend.into(),
        }
    }
}

/// Router configuration
///
/// Contains all configuration options needed for the router.
/// Supports loading from configuration files, environment variables
/// and command-line overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct RouterConfig {
    // --- Network settings ---

    /// Listen address for the router
    #[serde(default = "defaults::listen", deserialize_with = "deserialize_socket_addr")]
    pub listen: SocketAddr,

    /// Protocols to try, in trial order (tls, http, any)
    #[serde(default = "defaults::protocols")]
    pub protocols: Vec<String>,

    /// Routing table, first match wins
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Backend for requests without a hostname or without a matching route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    // --- General settings ---

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "defaults::log_level")]
    pub log_level: String,

    /// Buffer size for data transfer (in bytes)
    #[serde(default = "defaults::buffer_size")]
    pub buffer_size: usize,

    /// Maximum bytes buffered before giving up on protocol detection
    #[serde(default = "defaults::max_detect_bytes")]
    pub max_detect_bytes: usize,

    /// Seconds the client has to send enough bytes for detection
    #[serde(default = "defaults::detect_timeout")]
    pub detect_timeout: u64,

    /// Seconds to wait for a backend connection to establish
    #[serde(default = "defaults::connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for RouterConfig {
    /// Create a default configuration using centralized defaults
    #[inline]
    fn default() -> Self {
        Self {
            listen: defaults::listen(),
            protocols: defaults::protocols(),
            routes: Vec::new(),
            fallback: None,
            log_level: defaults::log_level(),
            buffer_size: defaults::buffer_size(),
            max_detect_bytes: defaults::max_detect_bytes(),
            detect_timeout: defaults::detect_timeout(),
            connection_timeout: defaults::connection_timeout(),
        }
    }
}

impl RouterConfig {
    pub fn detect_timeout(&self) -> Duration {
        Duration::from_secs(self.detect_timeout)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

/// Log the configuration
pub fn log_config(config: &RouterConfig) {
    use log::info;

    // Only log in info level or below
    if !log::log_enabled!(log::Level::Info) {
        return;
    }

    info!("=== Router Configuration ===");
    info!("  Listen address: {}", config.listen);
    info!("  Protocols: {}", config.protocols.join(", "));
    for route in &config.routes {
        info!("  Route: {} -> {}", route.hostname, route.backend);
    }
    if let Some(ref fallback) = config.fallback {
        info!("  Fallback: {}", fallback);
    }
    info!("  Log level: {}", config.log_level);
    info!("  Buffer size: {} bytes", config.buffer_size);
    info!("  Max detect bytes: {}", config.max_detect_bytes);
    info!("  Detect timeout: {} seconds", config.detect_timeout);
    info!("  Connection timeout: {} seconds", config.connection_timeout);
    info!("============================");
}

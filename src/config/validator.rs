//! Configuration validator
//!
//! This module provides functionality for validating configuration.

use crate::common::is_host_port;
use crate::protocol::ProtocolRegistry;
use super::defaults::MAX_DETECT_BYTES_LIMIT;
use super::error::{ConfigError, Result};
use super::types::{RouteConfig, RouterConfig};

/// Levels accepted for `log_level`, matched case-insensitively
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Validate the configuration
pub fn validate_config(config: &RouterConfig) -> Result<()> {
    validate_protocols(config)?;
    validate_routes(config)?;
    validate_general_settings(config)?;

    Ok(())
}

fn validate_protocols(config: &RouterConfig) -> Result<()> {
    ProtocolRegistry::from_names(&config.protocols)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue("protocols".to_string(), e.to_string()))
}

fn validate_routes(config: &RouterConfig) -> Result<()> {
    for route in &config.routes {
        validate_route(route)?;
    }

    if let Some(ref fallback) = config.fallback {
        if !is_host_port(fallback) {
            return Err(ConfigError::InvalidValue(
                "fallback".to_string(),
                format!("Expected host:port, got '{}'", fallback),
            ));
        }
    }

    Ok(())
}

fn validate_route(route: &RouteConfig) -> Result<()> {
    let pattern = route.hostname.strip_prefix("*.").unwrap_or(&route.hostname);
    if pattern.is_empty() || pattern.contains('*') || pattern.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidValue(
            "routes.hostname".to_string(),
            format!("Invalid hostname pattern '{}'", route.hostname),
        ));
    }

    if route.backend != "*" && !is_host_port(&route.backend) {
        return Err(ConfigError::InvalidValue(
            "routes.backend".to_string(),
            format!("Expected host:port or '*' for {}, got '{}'", route.hostname, route.backend),
        ));
    }

    Ok(())
}

fn validate_general_settings(config: &RouterConfig) -> Result<()> {
    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::InvalidValue(
            "log_level".to_string(),
            format!("Expected one of {}, got '{}'", LOG_LEVELS.join(", "), config.log_level),
        ));
    }

    if config.buffer_size == 0 {
        return Err(ConfigError::InvalidValue(
            "buffer_size".to_string(),
            "Buffer size must be greater than 0".to_string(),
        ));
    }

    if config.max_detect_bytes == 0 || config.max_detect_bytes > MAX_DETECT_BYTES_LIMIT {
        return Err(ConfigError::InvalidValue(
            "max_detect_bytes".to_string(),
            format!("Must be between 1 and {}", MAX_DETECT_BYTES_LIMIT),
        ));
    }

    if config.detect_timeout == 0 {
        return Err(ConfigError::InvalidValue(
            "detect_timeout".to_string(),
            "Detect timeout must be greater than 0".to_string(),
        ));
    }

    if config.connection_timeout == 0 {
        return Err(ConfigError::InvalidValue(
            "connection_timeout".to_string(),
            "Connection timeout must be greater than 0".to_string(),
        ));
    }

    if config.fallback.as_deref() == Some(config.listen.to_string().as_str()) {
        return Err(ConfigError::InvalidCombination(
            "Fallback backend must not be the listen address".to_string(),
        ));
    }

    Ok(())
}

/// Configuration validator trait
pub trait ConfigValidator {
    /// Validate, failing on the first hard error
    fn validate(&self) -> Result<()>;

    /// Check configuration for warnings
    fn check_warnings(&self) -> Vec<String>;
}

impl ConfigValidator for RouterConfig {
    fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    fn check_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.routes.is_empty() && self.fallback.is_none() {
            warnings.push(
                "No routes and no fallback configured: every connection will be rejected"
                    .to_string(),
            );
        }

        for (i, route) in self.routes.iter().enumerate() {
            let shadowed = self.routes[..i]
                .iter()
                .any(|earlier| earlier.hostname.eq_ignore_ascii_case(&route.hostname));
            if shadowed {
                warnings.push(format!(
                    "Route for '{}' is shadowed by an earlier entry",
                    route.hostname
                ));
            }
        }

        warnings
    }
}

//! Default configuration values
//!
//! Single source of truth for defaults, shared by serde and `Default`.

use std::net::SocketAddr;
use std::str::FromStr;

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "PROTOCOL_ROUTER";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default listen address as string
pub const LISTEN_STR: &str = "0.0.0.0:8080";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Upper bound for `max_detect_bytes`: one full TLS record plus its header
pub const MAX_DETECT_BYTES_LIMIT: usize = 16384 + 5;

/// Default listen address
pub fn listen() -> SocketAddr {
    SocketAddr::from_str(LISTEN_STR)
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)))
}

/// Default protocols, in trial order
pub fn protocols() -> Vec<String> {
    vec!["tls".to_string(), "http".to_string()]
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Default forwarding buffer size (8KB)
pub fn buffer_size() -> usize {
    8192
}

/// Default cap on bytes buffered while detecting the protocol
pub fn max_detect_bytes() -> usize {
    4096
}

/// Default time allowed for the client to send enough bytes, in seconds
pub fn detect_timeout() -> u64 {
    5
}

/// Default backend connection timeout in seconds
pub fn connection_timeout() -> u64 {
    30
}

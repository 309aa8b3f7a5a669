//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use thiserror::Error;
use std::io;

/// Protocol router error type
#[derive(Error, Debug)]
pub enum RouterError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol registry error (empty registry, duplicate or unknown protocol)
    #[error("Registry error: {0}")]
    Registry(String),

    /// Network error (address resolution, backend connection)
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `RouterError`.
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let router_err: RouterError = io_err.into();

        match router_err {
            RouterError::Io(_) => {}
            _ => panic!("Should convert to IO error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = RouterError::Registry("duplicate protocol: tls".to_string());
        let err_str = format!("{}", err);
        assert!(err_str.contains("duplicate protocol: tls"));
    }
}

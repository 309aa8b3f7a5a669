//! Network utility functions
//!
//! This module provides utility functions for network operations.

use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use super::error::{Result, RouterError};

/// Parse a socket address
///
/// Literal `ip:port` forms are parsed directly; anything else goes through
/// the system resolver.
///
/// # Arguments
///
/// * `addr` - The address string to parse
///
/// # Returns
///
/// The parsed `SocketAddr`
pub fn parse_socket_addr(addr: &str) -> Result<SocketAddr> {
    // Try direct parsing first
    if let Ok(socket_addr) = SocketAddr::from_str(addr) {
        return Ok(socket_addr);
    }

    // Try using ToSocketAddrs trait
    match addr.to_socket_addrs() {
        Ok(mut addrs) => {
            if let Some(addr) = addrs.next() {
                Ok(addr)
            } else {
                Err(RouterError::Network(format!("Failed to parse address: {}", addr)))
            }
        }
        Err(e) => Err(RouterError::Network(format!("Failed to parse address {}: {}", addr, e))),
    }
}

/// Check that an address has the `host:port` shape without resolving it
///
/// Backends are resolved at connect time, so configuration only needs the
/// shape to be right.
pub fn is_host_port(addr: &str) -> bool {
    if SocketAddr::from_str(addr).is_ok() {
        return true;
    }

    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains(':') && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_socket_addr() {
        // Test valid address
        let addr = parse_socket_addr("127.0.0.1:8080");
        assert!(addr.is_ok(), "Should be able to parse a valid address");

        if let Ok(socket_addr) = addr {
            assert_eq!(socket_addr.port(), 8080);
        }

        // Test invalid address
        let addr = parse_socket_addr("invalid-address");
        assert!(addr.is_err(), "Should fail to parse an invalid address");
    }

    #[test]
    fn test_is_host_port() {
        assert!(is_host_port("127.0.0.1:443"));
        assert!(is_host_port("[::1]:443"));
        assert!(is_host_port("backend.internal:8443"));
        assert!(!is_host_port("backend.internal"));
        assert!(!is_host_port(":443"));
        assert!(!is_host_port("host:notaport"));
    }
}

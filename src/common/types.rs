//! Shared types module
//!
//! This module contains shared data types and structures used throughout the application.

use std::net::SocketAddr;
use std::time::Instant;

/// Connection information
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Client address
    pub source: SocketAddr,
    /// When the connection was accepted
    pub accepted_at: Instant,
}

impl ConnectionInfo {
    /// Record a freshly accepted connection
    pub fn new(source: SocketAddr) -> Self {
        Self {
            source,
            accepted_at: Instant::now(),
        }
    }
}

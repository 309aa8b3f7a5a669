//! Common module
//!
//! This module contains shared types, errors, and utility functions used
//! throughout the application.

pub mod error;
pub mod log;
pub mod net;
pub mod types;

// Re-export commonly used types and functions
pub use self::error::{Result, RouterError};
pub use self::log::init_logger;
pub use self::net::{is_host_port, parse_socket_addr};
pub use self::types::ConnectionInfo;

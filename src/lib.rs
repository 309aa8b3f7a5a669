//! Protocol Router: route connections by TLS SNI or HTTP Host
//!
//! This library looks at the first bytes of a freshly accepted connection,
//! decides which supported wire protocol the client is speaking, extracts the
//! hostname to route on, and forwards the connection to the matching
//! backend. When no routing decision can be made the client receives a
//! rejection in its own protocol (a TLS alert, an HTTP 503).
//!
//! # Main Features
//!
//! - Ordered trial of protocol recognizers with deterministic priority rules
//! - Built-in TLS (SNI) and HTTP (`Host`) recognizers, pluggable custom ones
//! - Exact and wildcard hostname routes, pass-through and fallback backends
//! - Lock-free sharing of the dispatcher across all connections
//!
//! # Example
//!
//! ```
//! use protocol_router::{Dispatcher, Outcome, ProtocolRegistry};
//!
//! let dispatcher = Dispatcher::new(ProtocolRegistry::standard());
//! let outcome = dispatcher.dispatch(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
//!
//! assert_eq!(outcome.outcome(), Outcome::Accepted { len: 11 });
//! assert_eq!(outcome.protocol_name(), Some("http"));
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod protocol;
pub mod proxy;

// Re-export commonly used structures and functions for convenience
pub use common::{parse_socket_addr, Result, RouterError};
pub use protocol::{
    DispatchOutcome, Dispatcher, Hostname, Outcome, ProtocolDescriptor, ProtocolRegistry,
    RecognitionResult, Recognizer,
};
pub use proxy::Router;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

//! Router service module
//!
//! This module is the caller side of protocol detection: it accepts
//! connections, buffers their first bytes for the dispatcher, and then
//! forwards each connection to its backend or rejects it with the payload of
//! the protocol it was speaking.

mod forwarder;
mod handler;
pub mod server;
mod table;

pub use forwarder::proxy_data;
pub use handler::handle_connection;
pub use server::Router;
pub use table::{Backend, BackendTable};

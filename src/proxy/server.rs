//! Router server module
//!
//! Accepts client connections and hands each one to the connection handler
//! on its own task. The dispatcher, routing table and configuration are
//! shared read-only between all connections.

use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::sleep;

use crate::common::{ConnectionInfo, Result};
use crate::config::RouterConfig;
use crate::protocol::{Dispatcher, ProtocolRegistry};
use super::handler::handle_connection;
use super::table::BackendTable;

/// First retry delay after a failed `accept` (e.g. out of file descriptors)
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);

/// Longest retry delay after repeated `accept` failures
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Router server structure
pub struct Router {
    /// Listen address for the router
    listen_addr: SocketAddr,
    /// Protocol dispatcher shared by every connection
    dispatcher: Dispatcher,
    /// Hostname to backend mapping
    table: Arc<BackendTable>,
    /// Router configuration (wrapped in Arc for efficient sharing)
    config: Arc<RouterConfig>,
}

impl Router {
    /// Create a router from configuration
    ///
    /// The protocol registry is built from `config.protocols`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured protocol is unknown or repeated.
    pub fn new(config: Arc<RouterConfig>) -> Result<Self> {
        let registry = ProtocolRegistry::from_names(&config.protocols)?;
        Ok(Self::with_dispatcher(config, Dispatcher::new(registry)))
    }

    /// Create a router with an explicit dispatcher
    pub fn with_dispatcher(config: Arc<RouterConfig>, dispatcher: Dispatcher) -> Self {
        Self {
            listen_addr: config.listen,
            dispatcher,
            table: Arc::new(BackendTable::from_config(&config)),
            config,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Bind the configured listen address and serve until an error occurs
    ///
    /// # Errors
    ///
    /// Returns an error if it cannot bind to the listen address.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(
            "Router listening on {} for [{}]",
            listener.local_addr()?,
            self.dispatcher.registry().names().collect::<Vec<_>>().join(", ")
        );

        // Create a JoinSet to manage tasks efficiently
        let mut tasks = JoinSet::new();
        let mut accept_errors = 0u32;

        loop {
            // Check for completed tasks and log any errors
            while let Some(result) = tasks.try_join_next() {
                match result {
                    Ok(Err(e)) => debug!("Connection ended with error: {}", e),
                    Err(e) => error!("Task error: {}", e),
                    Ok(Ok(())) => {}
                }
            }

            match listener.accept().await {
                Ok((client_stream, client_addr)) => {
                    accept_errors = 0;
                    debug!("Accepted connection from {}", client_addr);
                    metrics::counter!("router.connections").increment(1);

                    let conn = ConnectionInfo::new(client_addr);
                    let dispatcher = self.dispatcher.clone();
                    let table = Arc::clone(&self.table);
                    let config = Arc::clone(&self.config);

                    tasks.spawn(handle_connection(client_stream, conn, dispatcher, table, config));
                }
                Err(e) => {
                    accept_errors = accept_errors.saturating_add(1);
                    let delay = accept_backoff(accept_errors);
                    error!("Error accepting connection: {}, retrying in {:?}", e, delay);
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Delay before retrying `accept` after `consecutive` failures in a row
///
/// Doubles from `ACCEPT_BACKOFF_MIN` up to `ACCEPT_BACKOFF_MAX`.
fn accept_backoff(consecutive: u32) -> Duration {
    let shift = consecutive.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_MIN.saturating_mul(1 << shift).min(ACCEPT_BACKOFF_MAX)
}

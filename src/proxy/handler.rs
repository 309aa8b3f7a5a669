//! Connection handler module
//!
//! This module handles individual client connections: buffer the first
//! bytes until the dispatcher can decide, then forward or reject.

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};

use crate::common::{ConnectionInfo, Result, RouterError};
use crate::config::RouterConfig;
use crate::protocol::{DispatchOutcome, Dispatcher, Outcome};
use super::forwarder::proxy_data;
use super::table::BackendTable;

/// Why detection stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetectionEnd {
    /// The dispatcher returned something other than `Incomplete`
    Decided,
    /// `max_detect_bytes` were buffered without a decision
    ByteLimit,
    /// The detect timeout expired
    TimedOut,
    /// The client closed before a decision
    Closed,
}

/// Bytes read during detection and what the dispatcher made of them
pub(crate) struct Detection {
    pub buffer: Vec<u8>,
    pub outcome: DispatchOutcome,
    pub end: DetectionEnd,
}

/// Read from `client` until the dispatcher decides or a limit is hit
///
/// The dispatcher is re-run over the whole buffer after every read.
pub(crate) async fn detect<S>(
    client: &mut S,
    dispatcher: &Dispatcher,
    max_bytes: usize,
    deadline: Instant,
) -> Result<Detection>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; max_bytes];
    let mut filled = 0;
    let mut outcome = dispatcher.dispatch(&[]);

    let end = loop {
        let read = match timeout_at(deadline, client.read(&mut buffer[filled..])).await {
            Ok(read) => read?,
            Err(_) => break DetectionEnd::TimedOut,
        };

        if read == 0 {
            break DetectionEnd::Closed;
        }

        filled += read;
        outcome = dispatcher.dispatch(&buffer[..filled]);

        if !outcome.is_incomplete() {
            break DetectionEnd::Decided;
        }

        if filled == max_bytes {
            break DetectionEnd::ByteLimit;
        }
    };

    buffer.truncate(filled);
    Ok(Detection { buffer, outcome, end })
}

/// Send the outcome's rejection payload, if any, and close our side
pub(crate) async fn reject<S>(client: &mut S, outcome: &DispatchOutcome) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let payload = outcome.rejection_payload();
    if !payload.is_empty() {
        client.write_all(payload).await?;
    }
    client.shutdown().await?;
    let protocol = outcome.protocol_name().unwrap_or("none").to_string();
    metrics::counter!("router.rejections", "protocol" => protocol).increment(1);
    Ok(())
}

/// Pick the backend address for a decided connection, or `None` to reject
fn choose_backend(
    conn: &ConnectionInfo,
    outcome: &DispatchOutcome,
    table: &BackendTable,
) -> Option<String> {
    match outcome.outcome() {
        Outcome::Accepted { .. } => {
            let hostname = outcome.hostname()?;
            let default_port = outcome.protocol().map(|p| p.default_port()).unwrap_or_default();
            let backend = table.resolve(hostname.as_str(), default_port);
            if backend.is_none() {
                info!("{}: no route for {}", conn.source, hostname);
            }
            backend
        }
        Outcome::NoRoutingKey => {
            let fallback = table.fallback().map(str::to_string);
            if fallback.is_none() {
                info!(
                    "{}: {} request without hostname and no fallback",
                    conn.source,
                    outcome.protocol_name().unwrap_or("unknown")
                );
            }
            fallback
        }
        Outcome::Incomplete => {
            warn!("{}: gave up waiting for a complete request", conn.source);
            None
        }
        Outcome::OtherError(code) => {
            warn!(
                "{}: {} recognizer failed with code {}",
                conn.source,
                outcome.protocol_name().unwrap_or("unknown"),
                code
            );
            None
        }
        Outcome::Unrecognized => {
            debug!("{}: no protocol recognized", conn.source);
            None
        }
        // Callers decide these before routing
        Outcome::InvalidOutputSlot | Outcome::AllocationFailure => None,
    }
}

/// Handle a single client connection
///
/// # Parameters
///
/// * `client` - Client TCP stream
/// * `conn` - Connection information
/// * `dispatcher` - Shared protocol dispatcher
/// * `table` - Backend routing table
/// * `config` - Router configuration
///
/// # Returns
///
/// Returns `Ok(())` once the connection is forwarded to completion or cleanly
/// rejected, otherwise returns an error.
pub async fn handle_connection(
    mut client: TcpStream,
    conn: ConnectionInfo,
    dispatcher: Dispatcher,
    table: Arc<BackendTable>,
    config: Arc<RouterConfig>,
) -> Result<()> {
    let deadline = Instant::now() + config.detect_timeout();
    let Detection { buffer, outcome, end } =
        detect(&mut client, &dispatcher, config.max_detect_bytes, deadline).await?;

    metrics::counter!("router.dispatch", "outcome" => outcome.outcome().as_str()).increment(1);
    debug!(
        "{}: {:?} after {} bytes ({:?}, protocol {:?})",
        conn.source,
        outcome.outcome(),
        buffer.len(),
        end,
        outcome.protocol_name()
    );

    match (end, outcome.outcome()) {
        (DetectionEnd::Closed, _) => {
            debug!("{}: client closed during detection", conn.source);
            return Ok(());
        }
        (DetectionEnd::TimedOut, _) if buffer.is_empty() => {
            debug!("{}: client sent nothing before the detect timeout", conn.source);
            return Ok(());
        }
        (_, Outcome::InvalidOutputSlot) => {
            error!("{}: dispatcher reported an invalid hostname slot", conn.source);
            return Err(RouterError::Other("invalid hostname output slot".to_string()));
        }
        (_, Outcome::AllocationFailure) => {
            warn!("{}: out of memory while extracting hostname, dropping connection", conn.source);
            return Ok(());
        }
        _ => {}
    }

    let Some(backend_addr) = choose_backend(&conn, &outcome, &table) else {
        return reject(&mut client, &outcome).await;
    };

    debug!("{}: connecting to backend {}", conn.source, backend_addr);
    let connect = TcpStream::connect(backend_addr.as_str());
    let mut backend = match timeout(config.connection_timeout(), connect).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            reject(&mut client, &outcome).await?;
            return Err(RouterError::Network(format!(
                "Failed to connect to {}: {}",
                backend_addr, e
            )));
        }
        Err(_) => {
            reject(&mut client, &outcome).await?;
            return Err(RouterError::Timeout(format!("Connection to {} timed out", backend_addr)));
        }
    };

    info!(
        "{} -> {} ({}, {})",
        conn.source,
        backend_addr,
        outcome.protocol_name().unwrap_or("unknown"),
        outcome.hostname().map(|h| h.as_str()).unwrap_or("-")
    );

    backend.write_all(&buffer).await?;

    let (up, down) = proxy_data(client, backend, config.buffer_size).await?;
    debug!(
        "{}: closed after {} bytes up, {} bytes down in {:?}",
        conn.source,
        up + buffer.len() as u64,
        down,
        conn.accepted_at.elapsed()
    );
    Ok(())
}

//! Data forwarding module
//!
//! This module handles data forwarding between two streams.

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::common::Result;

/// Copy one direction until EOF or error, then half-close the writer
async fn pump<R, W>(
    mut reader: ReadHalf<R>,
    mut writer: WriteHalf<W>,
    buffer_size: usize,
    direction: &'static str,
) -> u64
where
    R: AsyncRead,
    W: AsyncWrite,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut total_bytes = 0u64;

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break, // Connection closed
            Ok(n) => {
                total_bytes += n as u64;
                if writer.write_all(&buffer[..n]).await.is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    let _ = writer.shutdown().await;
    debug!("{} transferred {} bytes total", direction, total_bytes);
    total_bytes
}

/// Forward data between two streams
///
/// Runs both directions concurrently and returns once both have finished,
/// so a half-closed side can still receive the rest of the response.
///
/// # Parameters
///
/// * `client_stream` - Client stream
/// * `backend_stream` - Backend stream
/// * `buffer_size` - Size of the per-direction copy buffer
///
/// # Returns
///
/// Bytes copied client→backend and backend→client.
pub async fn proxy_data<C, B>(
    client_stream: C,
    backend_stream: B,
    buffer_size: usize,
) -> Result<(u64, u64)>
where
    C: AsyncRead + AsyncWrite + Send,
    B: AsyncRead + AsyncWrite + Send,
{
    let (client_reader, client_writer) = tokio::io::split(client_stream);
    let (backend_reader, backend_writer) = tokio::io::split(backend_stream);

    let totals = tokio::join!(
        pump(client_reader, backend_writer, buffer_size, "Client to backend"),
        pump(backend_reader, client_writer, buffer_size, "Backend to client"),
    );

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_bidirectional_copy() {
        let (client, mut client_peer) = duplex(64);
        let (backend, mut backend_peer) = duplex(64);

        let forward = tokio::spawn(proxy_data(client, backend, 16));

        client_peer.write_all(b"request bytes").await.unwrap();
        client_peer.shutdown().await.unwrap();

        let mut received = Vec::new();
        backend_peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"request bytes");

        backend_peer.write_all(b"response").await.unwrap();
        backend_peer.shutdown().await.unwrap();

        let mut response = Vec::new();
        client_peer.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, b"response");

        let (up, down) = forward.await.unwrap().unwrap();
        assert_eq!((up, down), (13, 8));
    }
}

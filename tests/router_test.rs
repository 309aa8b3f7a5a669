//! End-to-end router tests on loopback
//!
//! Each test starts one or more backends, a router serving a pre-bound
//! listener, and talks to the router as a client would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use protocol_router::config::{RouteConfig, RouterConfig};
use protocol_router::protocol::tls;
use protocol_router::Router;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend that reads `expect` bytes, hands them to the test and replies with `reply`
async fn backend(expect: usize, reply: &'static [u8]) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = vec![0u8; expect];
        stream.read_exact(&mut received).await.unwrap();
        stream.write_all(reply).await.unwrap();
        stream.shutdown().await.unwrap();
        received
    });

    (addr, handle)
}

/// Start a router for `config` on an ephemeral port
async fn router(config: RouterConfig) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new(Arc::new(config)).unwrap();

    let handle = tokio::spawn(async move {
        let _ = router.serve(listener).await;
    });

    (addr, handle)
}

fn config(routes: Vec<RouteConfig>, fallback: Option<SocketAddr>) -> RouterConfig {
    RouterConfig {
        routes,
        fallback: fallback.map(|addr| addr.to_string()),
        detect_timeout: 2,
        connection_timeout: 2,
        ..RouterConfig::default()
    }
}

/// Send `request`, half-close, and read everything the router sends back
async fn exchange(router: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut client = TcpStream::connect(router).await.unwrap();
    client.write_all(request).await.unwrap();

    let mut response = Vec::new();
    timeout(TEST_TIMEOUT, client.read_to_end(&mut response))
        .await
        .expect("router did not close the connection")
        .unwrap();
    response
}

/// Minimal TLS 1.2 ClientHello carrying `sni`
fn client_hello(sni: &str) -> Vec<u8> {
    let name = sni.as_bytes();

    let mut server_name = Vec::new();
    server_name.extend_from_slice(&((name.len() + 3) as u16).to_be_bytes());
    server_name.push(0x00);
    server_name.extend_from_slice(&(name.len() as u16).to_be_bytes());
    server_name.extend_from_slice(name);

    let mut extensions = Vec::new();
    extensions.extend_from_slice(&[0x00, 0x00]);
    extensions.extend_from_slice(&(server_name.len() as u16).to_be_bytes());
    extensions.extend_from_slice(&server_name);

    let mut hello = vec![0x03, 0x03];
    hello.extend_from_slice(&[0u8; 32]);
    hello.push(0x00);
    hello.extend_from_slice(&[0x00, 0x02, 0x13, 0x01]);
    hello.extend_from_slice(&[0x01, 0x00]);
    hello.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
    hello.extend_from_slice(&extensions);

    let mut handshake = vec![0x01];
    handshake.extend_from_slice(&(hello.len() as u32).to_be_bytes()[1..]);
    handshake.extend_from_slice(&hello);

    let mut record = vec![0x16, 0x03, 0x01];
    record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
    record.extend_from_slice(&handshake);
    record
}

#[tokio::test]
async fn test_http_routed_by_host() {
    let request = b"GET /index.html HTTP/1.1\r\nHost: www.example.com\r\n\r\n";
    let (backend_addr, backend_task) = backend(request.len(), b"HTTP/1.1 200 OK\r\n\r\n").await;
    let (router_addr, router_task) = router(config(
        vec![RouteConfig::new("*.example.com", backend_addr.to_string())],
        None,
    ))
    .await;

    let response = exchange(router_addr, request).await;

    assert_eq!(response, b"HTTP/1.1 200 OK\r\n\r\n");
    assert_eq!(backend_task.await.unwrap(), request);
    router_task.abort();
}

#[tokio::test]
async fn test_tls_routed_by_sni() {
    let hello = client_hello("secure.example.net");
    let (backend_addr, backend_task) = backend(hello.len(), b"server hello").await;
    let (router_addr, router_task) = router(config(
        vec![
            RouteConfig::new("www.example.net", "127.0.0.1:1"),
            RouteConfig::new("secure.example.net", backend_addr.to_string()),
        ],
        None,
    ))
    .await;

    let response = exchange(router_addr, &hello).await;

    assert_eq!(response, b"server hello");
    assert_eq!(backend_task.await.unwrap(), hello);
    router_task.abort();
}

#[tokio::test]
async fn test_unknown_host_gets_http_503() {
    let (router_addr, router_task) = router(config(
        vec![RouteConfig::new("example.com", "127.0.0.1:1")],
        None,
    ))
    .await;

    let response = exchange(router_addr, b"GET / HTTP/1.1\r\nHost: other.org\r\n\r\n").await;

    assert!(response.starts_with(b"HTTP/1.1 503 Service Temporarily Unavailable\r\n"));
    router_task.abort();
}

#[tokio::test]
async fn test_tls_without_sni_gets_alert() {
    let (router_addr, router_task) = router(config(Vec::new(), None)).await;

    // SSL 2.0 record version: a handshake that cannot carry SNI
    let response = exchange(router_addr, &[0x16, 0x02, 0x00, 0x00, 0x00]).await;

    assert_eq!(response, tls::ALERT_HANDSHAKE_FAILURE);
    router_task.abort();
}

#[tokio::test]
async fn test_missing_host_uses_fallback() {
    let request = b"GET / HTTP/1.0\r\nAccept: */*\r\n\r\n";
    let (backend_addr, backend_task) = backend(request.len(), b"fallback").await;
    let (router_addr, router_task) = router(config(Vec::new(), Some(backend_addr))).await;

    let response = exchange(router_addr, request).await;

    assert_eq!(response, b"fallback");
    assert_eq!(backend_task.await.unwrap(), request);
    router_task.abort();
}

#[tokio::test]
async fn test_unrecognized_protocol_is_closed_silently() {
    let (router_addr, router_task) = router(config(Vec::new(), None)).await;

    let mut client = TcpStream::connect(router_addr).await.unwrap();
    client.write_all(b"\x00\x01\x02\x03\x04\x05").await.unwrap();

    let mut response = Vec::new();
    let read = timeout(TEST_TIMEOUT, client.read_to_end(&mut response))
        .await
        .expect("router did not close the connection");

    // Closed without a payload; a reset is acceptable too
    assert!(read.is_err() || response.is_empty());
    router_task.abort();
}

#[tokio::test]
async fn test_silent_client_is_closed_without_payload() {
    let silent = RouterConfig { detect_timeout: 1, ..config(Vec::new(), None) };
    let (router_addr, router_task) = router(silent).await;

    let mut client = TcpStream::connect(router_addr).await.unwrap();
    let mut response = Vec::new();
    timeout(TEST_TIMEOUT, client.read_to_end(&mut response))
        .await
        .expect("router did not close the connection")
        .unwrap();

    assert!(response.is_empty());
    router_task.abort();
}

#[tokio::test]
async fn test_partial_request_times_out_with_payload() {
    let slow = RouterConfig { detect_timeout: 1, ..config(Vec::new(), None) };
    let (router_addr, router_task) = router(slow).await;

    // Request line only: the router waits for headers until the timeout
    let response = exchange(router_addr, b"GET / HTTP/1.1\r\n").await;

    assert!(response.starts_with(b"HTTP/1.1 503"));
    router_task.abort();
}

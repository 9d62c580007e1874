//! Requests sent through a local forward proxy.

#[path = "helpers.rs"]
mod helpers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use helpers::{fixture_path, spawn_https_server, CountingInspector, StaticResolver, RESPONSE_BODY};
use http_timing::{DefaultRequestExecutor, HttpClientError, RequestExecutor, RequestOptions};

const PROXY_BODY: &[u8] = b"from-cache";

/// Reads bytes until the blank line that ends a request head.
async fn read_head(sock: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match sock.read(&mut byte).await {
            Ok(0) | Err(_) => break,
            Ok(_) => head.push(byte[0]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Plain HTTP forward proxy that answers every request itself.
async fn spawn_answering_proxy() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let head = read_head(&mut sock).await;
                let _ = tx.send(head);
                let reply = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    PROXY_BODY.len()
                );
                let _ = sock.write_all(reply.as_bytes()).await;
                let _ = sock.write_all(PROXY_BODY).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// CONNECT proxy that tunnels every request to `upstream`, whatever host was asked for.
async fn spawn_tunnel_proxy(upstream: SocketAddr) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let head = read_head(&mut sock).await;
                let _ = tx.send(head);
                let Ok(mut origin) = TcpStream::connect(upstream).await else {
                    let _ = sock.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
                    return;
                };
                if sock
                    .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
                    .await
                    .is_err()
                {
                    return;
                }
                let _ = tokio::io::copy_bidirectional(&mut sock, &mut origin).await;
            });
        }
    });

    (addr, rx)
}

fn proxied_options(url: String, proxy: SocketAddr) -> RequestOptions {
    let mut options = RequestOptions::new(url);
    options.proxy = Some(format!("http://{proxy}"));
    options.timeout = Duration::from_secs(5);
    options.dns_resolver = Some(StaticResolver::loopback());
    options
}

fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_http_through_proxy_uses_absolute_form() {
    let (proxy, mut heads) = spawn_answering_proxy().await;

    let options = proxied_options("http://origin.test/path".to_string(), proxy);
    let outcome = DefaultRequestExecutor::new().execute(options).await.unwrap();

    let head = heads.recv().await.unwrap();
    let request_line = head.lines().next().unwrap();
    assert_eq!(request_line, "GET http://origin.test/path HTTP/1.1");
    assert!(
        head.to_ascii_lowercase().contains("user-agent: http_timing/"),
        "head was {head:?}"
    );

    assert_eq!(outcome.response.status, Some(200));
    assert_eq!(outcome.response.bytes, PROXY_BODY.len() as u64);
    assert_eq!(outcome.network.http_version.as_deref(), Some("HTTP/1.1"));
    assert!(outcome.network.tls_verified.is_none());

    // Plain HTTP has no TLS phase to estimate
    assert!(!outcome.timing.is_estimated);
    assert_eq!(outcome.timing.tls_ms, 0.0);
    assert!(outcome.timing.total_ms >= outcome.timing.ttfb_ms);
}

#[tokio::test]
async fn test_https_through_tunnel_is_estimated() {
    let (origin, mut seen) = spawn_https_server(&[b"http/1.1"]).await;
    let (proxy, mut heads) = spawn_tunnel_proxy(origin).await;

    let mut options = proxied_options(format!("https://secure.test:{}/", origin.port()), proxy);
    options.ca_bundle = Some(fixture_path("ca.pem"));
    let outcome = DefaultRequestExecutor::new().execute(options).await.unwrap();

    let head = heads.recv().await.unwrap();
    assert!(
        head.starts_with(&format!("CONNECT secure.test:{} HTTP/1.1", origin.port())),
        "head was {head:?}"
    );
    let request = seen.recv().await.unwrap();
    assert_eq!(request.sni.as_deref(), Some("secure.test"));

    assert_eq!(outcome.response.status, Some(200));
    assert_eq!(outcome.response.bytes, RESPONSE_BODY.len() as u64);
    assert_eq!(outcome.network.cert_cn.as_deref(), Some("secure.test"));
    assert!(outcome.network.cert_days_left.unwrap() > 0);
    assert_eq!(outcome.network.tls_verified, Some(true));
    assert_eq!(outcome.network.tls_custom_ca, Some(true));
    // No direct side-channel handshake runs for proxied requests
    assert!(outcome.network.tls_version.is_none());

    let timing = outcome.timing;
    assert!(timing.is_estimated);
    let phase = (timing.ttfb_ms - timing.dns_ms).max(0.0);
    assert!((timing.connect_ms - phase * 0.3).abs() < 1e-6, "{timing:?}");
    assert!((timing.tls_ms - phase * 0.7).abs() < 1e-6, "{timing:?}");
}

#[tokio::test]
async fn test_supplied_inspector_runs_for_proxied_https() {
    let (origin, _seen) = spawn_https_server(&[b"http/1.1"]).await;
    let (proxy, _heads) = spawn_tunnel_proxy(origin).await;
    let inspector = Arc::new(CountingInspector::default());

    let mut options = proxied_options(format!("https://secure.test:{}/", origin.port()), proxy);
    options.ca_bundle = Some(fixture_path("ca.pem"));
    options.tls_inspector = Some(inspector.clone());
    let outcome = DefaultRequestExecutor::new().execute(options).await.unwrap();

    assert_eq!(outcome.response.status, Some(200));
    assert_eq!(inspector.count(), 1);
}

#[tokio::test]
async fn test_proxied_missing_ca_bundle_is_invalid_request() {
    let mut options = proxied_options(
        "https://secure.test/".to_string(),
        SocketAddr::from(([127, 0, 0, 1], unused_port())),
    );
    options.ca_bundle = Some(fixture_path("does-not-exist.pem"));
    let err = DefaultRequestExecutor::new().execute(options).await.unwrap_err();

    assert!(matches!(err, HttpClientError::InvalidRequest(_)), "got {err:?}");
    assert!(err.to_string().contains("does-not-exist.pem"));
}

#[tokio::test]
async fn test_proxied_bundle_without_certificates_is_invalid_request() {
    let mut options = proxied_options(
        "https://secure.test/".to_string(),
        SocketAddr::from(([127, 0, 0, 1], unused_port())),
    );
    options.ca_bundle = Some(fixture_path("key.pem"));
    let err = DefaultRequestExecutor::new().execute(options).await.unwrap_err();

    assert!(matches!(err, HttpClientError::InvalidRequest(_)), "got {err:?}");
    assert!(err.to_string().contains("no certificates found"), "got {err}");
}

#[tokio::test]
async fn test_insecure_proxied_request_skips_ca_bundle() {
    let (origin, _seen) = spawn_https_server(&[b"http/1.1"]).await;
    let (proxy, _heads) = spawn_tunnel_proxy(origin).await;

    let mut options = proxied_options(format!("https://secure.test:{}/", origin.port()), proxy);
    options.verify_ssl = false;
    options.ca_bundle = Some(fixture_path("does-not-exist.pem"));
    let outcome = DefaultRequestExecutor::new().execute(options).await.unwrap();

    assert_eq!(outcome.response.status, Some(200));
    assert_eq!(outcome.network.tls_verified, Some(false));
    assert_eq!(outcome.network.tls_custom_ca, Some(false));
}

#[tokio::test]
async fn test_unreachable_proxy_is_request_failure() {
    let options = proxied_options(
        "http://origin.test/".to_string(),
        SocketAddr::from(([127, 0, 0, 1], unused_port())),
    );
    let err = DefaultRequestExecutor::new().execute(options).await.unwrap_err();

    assert!(matches!(err, HttpClientError::RequestFailed(_)), "got {err:?}");
}

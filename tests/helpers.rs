// Shared test helpers: a fixed DNS resolver, a counting TLS inspector and a
// local HTTPS server built from the fixture certificate.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HOST, USER_AGENT};
use hyper::server::conn::{http1, http2};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;

use http_timing::dns::AddressFamily;
use http_timing::{
    DnsResolutionError, DnsResolver, NetworkInfo, ResolvedAddress, TlsInspectionError, TlsInspector,
};

pub const RESPONSE_BODY: &[u8] = b"secure hello";

/// Path of a file under `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Resolves every hostname to one address.
pub struct StaticResolver(pub IpAddr);

impl StaticResolver {
    #[allow(dead_code)]
    pub fn loopback() -> Arc<Self> {
        Arc::new(Self(IpAddr::V4(Ipv4Addr::LOCALHOST)))
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn resolve(
        &self,
        _host: &str,
        _port: u16,
        _timeout: Duration,
    ) -> Result<ResolvedAddress, DnsResolutionError> {
        Ok(ResolvedAddress {
            ip: self.0,
            family: AddressFamily::from(&self.0).label(),
            elapsed_ms: 0.0,
        })
    }
}

/// Inspector that always fails, counting how often it was asked.
#[derive(Default)]
pub struct CountingInspector {
    pub calls: AtomicUsize,
}

impl CountingInspector {
    #[allow(dead_code)]
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TlsInspector for CountingInspector {
    async fn inspect(
        &self,
        host: &str,
        _port: u16,
        _timeout: Duration,
    ) -> Result<NetworkInfo, TlsInspectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TlsInspectionError::Connect(format!("{host}: inspection disabled in tests")))
    }
}

/// What the HTTPS server observed for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub sni: Option<String>,
    pub alpn: Option<String>,
    pub version: hyper::Version,
    /// `Host` header on HTTP/1.1, `:authority` on HTTP/2
    pub authority: Option<String>,
    pub user_agent: Option<String>,
}

fn server_config(alpn: &[&[u8]]) -> ServerConfig {
    let cert_pem = std::fs::read(fixture_path("cert.pem")).unwrap();
    let key_pem = std::fs::read(fixture_path("key.pem")).unwrap();

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<_, _>>()
        .unwrap();
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut &key_pem[..])
        .unwrap()
        .unwrap();

    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .unwrap();
    config.alpn_protocols = alpn.iter().map(|p| p.to_vec()).collect();
    config
}

/// Serves `RESPONSE_BODY` over HTTPS on 127.0.0.1 with the fixture certificate.
///
/// `alpn` lists the protocols the server accepts; `h2` selects HTTP/2.
pub async fn spawn_https_server(alpn: &[&[u8]]) -> (SocketAddr, mpsc::UnboundedReceiver<SeenRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(server_config(alpn)));
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((sock, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(stream) = acceptor.accept(sock).await else {
                    return;
                };
                let conn = stream.get_ref().1;
                let sni = conn.server_name().map(str::to_string);
                let alpn = conn
                    .alpn_protocol()
                    .map(|p| String::from_utf8_lossy(p).into_owned());
                let is_h2 = alpn.as_deref() == Some("h2");

                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let authority = req
                        .headers()
                        .get(HOST)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                        .or_else(|| req.uri().authority().map(|a| a.to_string()));
                    let _ = tx.send(SeenRequest {
                        sni: sni.clone(),
                        alpn: alpn.clone(),
                        version: req.version(),
                        authority,
                        user_agent: req
                            .headers()
                            .get(USER_AGENT)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                    });
                    async {
                        Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(RESPONSE_BODY))))
                    }
                });

                let io = TokioIo::new(stream);
                if is_h2 {
                    let _ = http2::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                } else {
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                }
            });
        }
    });

    (addr, rx)
}

//! Single-attempt request execution.
//!
//! This module provides:
//! - `RequestOptions` / `RequestOutcome`, the executor's input and output
//! - The `RequestExecutor` capability and its default implementation
//! - Dial-target construction (resolved IP on the wire, hostname for Host and SNI)
//! - A traced direct transport (hyper) and a proxied transport (reqwest)
//! - Adapter strategies that let the analyzer drive either an executor or a plain function

mod executor;
mod proxy;
mod response;
mod strategy;
mod target;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::HeaderMap;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::dns::DnsResolver;
use crate::error_handling::HttpClientError;
use crate::models::{NetworkInfo, ResponseInfo, TimingMetrics};
use crate::timing::TimingCollector;
use crate::tls::{LiveTlsInfo, TlsInspector};

pub use executor::DefaultRequestExecutor;
pub use response::{normalize_http_version, populate_response_metadata};
pub use strategy::{ExecutorStrategy, FunctionExecutor, RequestFn, RequestFuture};
pub use target::{lookup_host, DialTarget};

/// Everything needed to perform one HTTP request attempt.
///
/// Capabilities left as `None` fall back to the executor's defaults.
pub struct RequestOptions {
    pub url: String,
    /// Bounds DNS, connect, TLS and response headers together
    pub timeout: Duration,
    pub http2: bool,
    pub verify_ssl: bool,
    pub ca_bundle: Option<PathBuf>,
    /// Proxy URL (`http`, `https`, `socks5`, `socks5h`), passed through unmodified
    pub proxy: Option<String>,
    pub method: String,
    pub body: Vec<u8>,
    /// Request headers in order; names are matched case-insensitively
    pub headers: Vec<(String, String)>,
    pub force_new_connection: bool,
    pub dns_resolver: Option<Arc<dyn DnsResolver>>,
    pub tls_inspector: Option<Arc<dyn TlsInspector>>,
    pub timing_collector: Option<Box<dyn TimingCollector>>,
}

impl RequestOptions {
    /// GET `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            http2: true,
            verify_ssl: true,
            ca_bundle: None,
            proxy: None,
            method: "GET".to_string(),
            body: Vec::new(),
            headers: Vec::new(),
            force_new_connection: true,
            dns_resolver: None,
            tls_inspector: None,
            timing_collector: None,
        }
    }
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("http2", &self.http2)
            .field("verify_ssl", &self.verify_ssl)
            .field("ca_bundle", &self.ca_bundle)
            .field("proxy", &self.proxy)
            .field("method", &self.method)
            .field("body_bytes", &self.body.len())
            .field("force_new_connection", &self.force_new_connection)
            .finish_non_exhaustive()
    }
}

/// Timing, network and response records of a completed attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOutcome {
    pub timing: TimingMetrics,
    pub network: NetworkInfo,
    pub response: ResponseInfo,
}

/// Performs one HTTP request attempt.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// # Errors
    ///
    /// Returns `HttpClientError` for an invalid URL, DNS failure, timeout or
    /// transport failure. TLS inspection problems never surface here.
    async fn execute(&self, options: RequestOptions) -> Result<RequestOutcome, HttpClientError>;
}

/// What a transport hands back after consuming the body.
pub(crate) struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw protocol token, e.g. `HTTP/1.1` or `HTTP/2.0`
    pub version: String,
    pub body_bytes: u64,
    pub live_tls: Option<LiveTlsInfo>,
}

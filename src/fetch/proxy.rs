//! Proxied transport backed by `reqwest`.
//!
//! Used whenever a proxy is configured. reqwest exposes no connection
//! lifecycle events, so HTTPS timing on this path is estimated.

use std::error::Error as StdError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use hyper::Method;
use log::debug;
use reqwest::redirect::Policy;
use tokio::time::{timeout_at, Instant};

use super::target::DialTarget;
use super::TransportResponse;
use crate::error_handling::HttpClientError;
use crate::timing::TimingCollector;
use crate::tls::{CertificateInfo, LiveTlsInfo};

/// Everything the proxied transport needs for one request.
pub(crate) struct ProxiedRequest<'a> {
    pub target: &'a DialTarget,
    pub url: &'a str,
    pub proxy: &'a str,
    pub method: Method,
    pub headers: &'a [(String, String)],
    pub body: Bytes,
    pub http2: bool,
    pub verify_ssl: bool,
    pub ca_bundle: Option<&'a Path>,
    pub force_new_connection: bool,
    pub deadline: Instant,
}

/// Builds a single-use client for `req`.
///
/// The resolved address is pinned for the original hostname, so a direct
/// fallback never triggers a second lookup.
fn build_client(req: &ProxiedRequest<'_>) -> Result<reqwest::Client, HttpClientError> {
    let proxy = reqwest::Proxy::all(req.proxy)
        .map_err(|e| HttpClientError::InvalidRequest(format!("proxy {}: {e}", req.proxy)))?;
    let remaining = req.deadline.saturating_duration_since(Instant::now());

    let mut builder = reqwest::Client::builder()
        .proxy(proxy)
        .resolve(&req.target.sni_hostname, req.target.socket_addr)
        .redirect(Policy::none())
        .tls_info(true)
        .danger_accept_invalid_certs(!req.verify_ssl)
        .timeout(remaining.max(Duration::from_millis(1)));

    if req.force_new_connection {
        builder = builder.pool_max_idle_per_host(0);
    }
    if !req.http2 {
        builder = builder.http1_only();
    }
    if req.verify_ssl {
        if let Some(path) = req.ca_bundle {
            builder = builder.tls_built_in_root_certs(false);
            for cert in read_ca_bundle(path)? {
                builder = builder.add_root_certificate(cert);
            }
        }
    }

    builder
        .build()
        .map_err(|e| HttpClientError::InvalidRequest(error_chain(&e)))
}

fn read_ca_bundle(path: &Path) -> Result<Vec<reqwest::Certificate>, HttpClientError> {
    let invalid = |reason: String| {
        HttpClientError::InvalidRequest(format!("CA bundle {}: {reason}", path.display()))
    };
    let file = File::open(path).map_err(|e| invalid(e.to_string()))?;

    let mut certs = Vec::new();
    for der in rustls_pemfile::certs(&mut BufReader::new(file)) {
        let der = der.map_err(|e| invalid(e.to_string()))?;
        certs.push(reqwest::Certificate::from_der(der.as_ref()).map_err(|e| invalid(e.to_string()))?);
    }
    if certs.is_empty() {
        return Err(invalid("no certificates found".to_string()));
    }
    Ok(certs)
}

/// Maps a reqwest failure onto the client error taxonomy.
fn map_reqwest_error(e: &reqwest::Error) -> HttpClientError {
    let message = error_chain(e);
    if e.is_timeout() {
        HttpClientError::Timeout(message)
    } else if e.is_builder() {
        HttpClientError::InvalidRequest(message)
    } else {
        HttpClientError::RequestFailed(message)
    }
}

/// `e` followed by each of its sources, joined with `": "`.
fn error_chain(e: &dyn StdError) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Sends one request through the configured proxy and consumes the body.
pub(crate) async fn send_proxied(
    req: ProxiedRequest<'_>,
    collector: &mut dyn TimingCollector,
) -> Result<TransportResponse, HttpClientError> {
    let client = build_client(&req)?;
    debug!("Sending {} {} via proxy {}", req.method, req.url, req.proxy);

    let mut builder = client.request(req.method.clone(), req.url);
    for (name, value) in req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !req.body.is_empty() {
        builder = builder.body(req.body.clone());
    }

    let deadline_elapsed =
        || HttpClientError::Timeout("response headers did not arrive before the deadline".to_string());
    let mut response = timeout_at(req.deadline, builder.send())
        .await
        .map_err(|_| deadline_elapsed())?
        .map_err(|e| map_reqwest_error(&e))?;
    collector.mark_ttfb();

    let status = response.status().as_u16();
    let version = format!("{:?}", response.version());
    let headers = response.headers().clone();
    let live_tls = response
        .extensions()
        .get::<reqwest::tls::TlsInfo>()
        .and_then(|info| info.peer_certificate())
        .map(peer_certificate_info);

    let mut body_bytes: u64 = 0;
    loop {
        let chunk = timeout_at(req.deadline, response.chunk())
            .await
            .map_err(|_| {
                HttpClientError::Timeout("response body did not finish before the deadline".to_string())
            })?
            .map_err(|e| map_reqwest_error(&e))?;
        match chunk {
            Some(bytes) => body_bytes += bytes.len() as u64,
            None => break,
        }
    }
    collector.mark_request_end();

    Ok(TransportResponse {
        status,
        headers,
        version,
        body_bytes,
        live_tls,
    })
}

/// reqwest exposes only the peer certificate, not version or cipher.
fn peer_certificate_info(der: &[u8]) -> LiveTlsInfo {
    let mut live = LiveTlsInfo::default();
    match CertificateInfo::from_der(der, Utc::now()) {
        Ok(info) => {
            live.network.cert_cn = info.common_name;
            live.network.cert_days_left = info.days_until_expiry;
        }
        Err(e) => debug!("Peer certificate not parsed: {e}"),
    }
    live
}

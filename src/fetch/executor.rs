//! Default request executor: resolve, dial, send, reconcile.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::USER_AGENT as USER_AGENT_HEADER;
use hyper::Method;
use log::debug;
use url::Url;

use super::proxy::{send_proxied, ProxiedRequest};
use super::response::{normalize_http_version, populate_response_metadata};
use super::target::{lookup_host, DialTarget};
use super::transport::{deadline_after, send_direct, DirectRequest};
use super::{RequestExecutor, RequestOptions, RequestOutcome};
use crate::config::USER_AGENT;
use crate::dns::{DnsResolver, SystemDnsResolver};
use crate::error_handling::HttpClientError;
use crate::models::{NetworkInfo, ResponseInfo};
use crate::timing::{build_timing_metrics, MonotonicTimingCollector, PhaseSplit, TraceCollector};
use crate::tls::{build_client_config, SocketTlsInspector, TlsInspector, TlsPolicy};

/// Executor used unless the caller supplies another.
///
/// Defaults are per instance: a `SystemDnsResolver`, a `SocketTlsInspector`
/// matching each request's verification policy and CA bundle, and the default
/// phase split.
pub struct DefaultRequestExecutor {
    dns_resolver: Arc<dyn DnsResolver>,
    tls_inspector: Option<Arc<dyn TlsInspector>>,
    split: PhaseSplit,
}

impl DefaultRequestExecutor {
    pub fn new() -> Self {
        Self {
            dns_resolver: Arc::new(SystemDnsResolver::new()),
            tls_inspector: None,
            split: PhaseSplit::default(),
        }
    }

    /// Resolver used when a request does not carry its own.
    pub fn with_dns_resolver(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.dns_resolver = resolver;
        self
    }

    /// Inspector used when a request does not carry its own.
    pub fn with_tls_inspector(mut self, inspector: Arc<dyn TlsInspector>) -> Self {
        self.tls_inspector = Some(inspector);
        self
    }

    pub fn with_phase_split(mut self, split: PhaseSplit) -> Self {
        self.split = split;
        self
    }

    /// Inspector for a request whose live handshake left TLS facts missing.
    ///
    /// A supplied inspector always runs. The built-in one dials the host
    /// directly, so it is skipped for proxied requests, and it trusts the
    /// request's CA bundle when verification is on.
    pub(super) fn inspector_for(&self, options: &RequestOptions) -> Option<Arc<dyn TlsInspector>> {
        if let Some(inspector) = options.tls_inspector.as_ref().or(self.tls_inspector.as_ref()) {
            return Some(Arc::clone(inspector));
        }
        if options.proxy.is_some() {
            return None;
        }
        let inspector = match (&options.ca_bundle, options.verify_ssl) {
            (_, false) => SocketTlsInspector::insecure(),
            (Some(bundle), true) => SocketTlsInspector::new().with_ca_bundle(bundle),
            (None, true) => SocketTlsInspector::new(),
        };
        Some(Arc::new(inspector))
    }
}

impl Default for DefaultRequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefaultRequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRequestExecutor")
            .field("split", &self.split)
            .finish_non_exhaustive()
    }
}

fn parse_url(raw: &str) -> Result<Url, HttpClientError> {
    let url = Url::parse(raw).map_err(|e| match e {
        url::ParseError::EmptyHost => HttpClientError::InvalidUrl("missing hostname".to_string()),
        other => HttpClientError::InvalidUrl(other.to_string()),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(HttpClientError::InvalidUrl(format!("unsupported scheme: {other}"))),
    }
}

/// Caller headers, plus a User-Agent unless one was given.
fn with_default_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    let has_user_agent = headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(USER_AGENT_HEADER.as_str()));

    let mut all = Vec::with_capacity(headers.len() + 1);
    if !has_user_agent {
        all.push(("User-Agent".to_string(), USER_AGENT.to_string()));
    }
    all.extend(headers.iter().cloned());
    all
}

#[async_trait]
impl RequestExecutor for DefaultRequestExecutor {
    async fn execute(&self, mut options: RequestOptions) -> Result<RequestOutcome, HttpClientError> {
        let url = parse_url(&options.url)?;
        let host = lookup_host(&url)?;
        let is_https = url.scheme() == "https";
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpClientError::InvalidUrl("missing port".to_string()))?;
        let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| HttpClientError::InvalidRequest(format!("method {}: {e}", options.method)))?;

        let deadline = deadline_after(options.timeout);
        let mut collector = options
            .timing_collector
            .take()
            .unwrap_or_else(|| Box::new(MonotonicTimingCollector::new()));
        let resolver = options
            .dns_resolver
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.dns_resolver));

        collector.mark_dns_start();
        let resolved = resolver.resolve(&host, port, options.timeout).await?;
        collector.mark_dns_end();

        let mut network = NetworkInfo {
            ip: Some(resolved.ip.to_string()),
            ip_family: Some(resolved.family.clone()),
            ..Default::default()
        };
        if is_https {
            network.tls_verified = Some(options.verify_ssl);
            network.tls_custom_ca = Some(options.verify_ssl && options.ca_bundle.is_some());
        }

        let target = DialTarget::new(&url, resolved.ip)?;
        let headers = with_default_headers(&options.headers);
        let body = Bytes::from(std::mem::take(&mut options.body));
        let mut trace = TraceCollector::new();

        collector.mark_request_start();
        let sent = match options.proxy.as_deref() {
            Some(proxy) => {
                send_proxied(
                    ProxiedRequest {
                        target: &target,
                        url: url.as_str(),
                        proxy,
                        method,
                        headers: &headers,
                        body,
                        http2: options.http2,
                        verify_ssl: options.verify_ssl,
                        ca_bundle: options.ca_bundle.as_deref(),
                        force_new_connection: options.force_new_connection,
                        deadline,
                    },
                    collector.as_mut(),
                )
                .await?
            }
            None => {
                let tls = if is_https {
                    let config = build_client_config(&TlsPolicy {
                        verify: options.verify_ssl,
                        ca_bundle: options.ca_bundle.as_deref(),
                        http2: options.http2,
                    })
                    .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))?;
                    Some(Arc::new(config))
                } else {
                    None
                };
                send_direct(
                    DirectRequest {
                        target: &target,
                        url: url.as_str(),
                        method,
                        headers: &headers,
                        body,
                        tls,
                        deadline,
                    },
                    collector.as_mut(),
                    &mut trace,
                )
                .await?
            }
        };

        let mut response = ResponseInfo::default();
        populate_response_metadata(sent.status, &sent.headers, &mut response);
        response.bytes = sent.body_bytes;

        network.http_version = Some(normalize_http_version(&sent.version));
        if let Some(live) = &sent.live_tls {
            network.merge_tls_from(&live.network);
        }

        let timing = build_timing_metrics(
            collector.get_metrics(),
            is_https,
            trace.connect_ms(),
            trace.tls_ms(),
            self.split,
        );

        if is_https && !network.has_complete_tls() {
            match self.inspector_for(&options) {
                Some(inspector) => match inspector
                    .inspect(&target.sni_hostname, port, options.timeout)
                    .await
                {
                    Ok(inspected) => network.merge_tls_from(&inspected),
                    Err(e) => debug!("Ignoring TLS inspection failure for {host}: {e}"),
                },
                None => debug!("Skipping direct TLS inspection for proxied request to {host}"),
            }
        }

        debug!(
            "{} {} -> {} ({} bytes, {:.1}ms{})",
            options.method,
            options.url,
            sent.status,
            response.bytes,
            timing.total_ms,
            if timing.is_estimated { ", estimated" } else { "" }
        );

        Ok(RequestOutcome {
            timing,
            network,
            response,
        })
    }
}

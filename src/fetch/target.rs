//! Dial target: connect to the resolved IP, keep the hostname for Host and SNI.

use std::net::{IpAddr, SocketAddr};

use url::{Host, Url};

use crate::error_handling::HttpClientError;

/// Where and how one attempt connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    /// URL with the resolved IP in place of the host (IPv6 bracketed, port explicit)
    pub dial_url: String,
    pub socket_addr: SocketAddr,
    /// Value for the `Host` header; includes the port when it is not the scheme default
    pub host_header: String,
    /// Hostname sent as TLS server name
    pub sni_hostname: String,
    /// Path plus query, as sent on an HTTP/1.1 request line
    pub origin_form: String,
    pub is_https: bool,
}

impl DialTarget {
    /// Builds the dial target for `url` using the already-resolved `ip`.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientError::InvalidUrl` when the URL has no host or no port.
    pub fn new(url: &Url, ip: IpAddr) -> Result<Self, HttpClientError> {
        let sni_hostname = lookup_host(url)?;
        let host_str = url
            .host_str()
            .ok_or_else(|| HttpClientError::InvalidUrl("missing hostname".to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpClientError::InvalidUrl("missing port".to_string()))?;

        let host_header = match url.port() {
            Some(explicit) => format!("{host_str}:{explicit}"),
            None => host_str.to_string(),
        };

        let mut origin_form = url.path().to_string();
        if let Some(query) = url.query() {
            origin_form.push('?');
            origin_form.push_str(query);
        }

        let ip_literal = match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{v6}]"),
        };
        let dial_url = format!("{}://{ip_literal}:{port}{origin_form}", url.scheme());

        Ok(Self {
            dial_url,
            socket_addr: SocketAddr::new(ip, port),
            host_header,
            sni_hostname,
            origin_form,
            is_https: url.scheme() == "https",
        })
    }
}

/// Host as passed to a resolver: domain as-is, IP literals without brackets.
///
/// # Errors
///
/// Returns `HttpClientError::InvalidUrl("missing hostname")` when the URL has no host.
pub fn lookup_host(url: &Url) -> Result<String, HttpClientError> {
    match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => Ok(domain.to_string()),
        Some(Host::Ipv4(v4)) => Ok(v4.to_string()),
        Some(Host::Ipv6(v6)) => Ok(v6.to_string()),
        _ => Err(HttpClientError::InvalidUrl("missing hostname".to_string())),
    }
}

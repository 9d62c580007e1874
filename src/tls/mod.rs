//! TLS configuration, inspection and certificate parsing.
//!
//! This module provides:
//! - rustls client configurations for verified, custom-CA and permissive policies
//! - `TlsInspector`, a side-channel handshake that reports protocol and certificate facts
//! - Certificate parsing (`CertificateInfo`) with `x509-parser`
//! - Extraction of TLS facts from a live rustls connection
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod certificate;
mod client_config;
mod inspector;

use chrono::Utc;
use log::debug;
use rustls::{CipherSuite, ProtocolVersion};

use crate::models::NetworkInfo;

pub use certificate::CertificateInfo;
pub use client_config::{build_client_config, TlsPolicy, ALPN_H2, ALPN_HTTP11};
pub use inspector::{SocketTlsInspector, TlsInspector};

/// TLS facts read from an established connection.
#[derive(Debug, Clone, Default)]
pub struct LiveTlsInfo {
    /// `tls_version`, `tls_cipher`, `cert_cn` and `cert_days_left`
    pub network: NetworkInfo,
    /// Negotiated ALPN protocol, if any
    pub alpn: Option<String>,
}

/// Reads version, cipher, ALPN and peer-certificate facts from a rustls connection.
///
/// A certificate that fails to parse leaves the certificate fields unset.
pub fn live_tls_info(conn: &rustls::ClientConnection) -> LiveTlsInfo {
    let mut network = NetworkInfo {
        tls_version: conn.protocol_version().map(tls_version_name),
        tls_cipher: conn
            .negotiated_cipher_suite()
            .map(|cs| cipher_suite_name(cs.suite())),
        ..Default::default()
    };

    if let Some(cert) = conn.peer_certificates().and_then(|certs| certs.first()) {
        match CertificateInfo::from_der(cert.as_ref(), Utc::now()) {
            Ok(info) => {
                network.cert_cn = info.common_name;
                network.cert_days_left = info.days_until_expiry;
            }
            Err(e) => debug!("Peer certificate not parsed: {e}"),
        }
    }

    LiveTlsInfo {
        network,
        alpn: conn
            .alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned()),
    }
}

/// Conventional name for a protocol version ("TLSv1.3", "TLSv1.2", ...).
pub fn tls_version_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1.0".to_string(),
        ProtocolVersion::SSLv3 => "SSLv3".to_string(),
        other => format!("{other:?}"),
    }
}

/// IANA-style cipher suite name, e.g. `TLS13_AES_256_GCM_SHA384`.
pub fn cipher_suite_name(suite: CipherSuite) -> String {
    format!("{suite:?}")
}

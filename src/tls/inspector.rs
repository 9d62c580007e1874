//! Side-channel TLS handshake used only to read protocol and certificate facts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tokio_rustls::TlsConnector;

use super::client_config::{build_client_config, TlsPolicy};
use super::live_tls_info;
use crate::config::TLS_INSPECT_MAX_TIMEOUT;
use crate::dns::AddressFamily;
use crate::error_handling::TlsInspectionError;
use crate::models::NetworkInfo;

/// Performs a separate TCP+TLS handshake against a host and reports what it saw.
#[async_trait]
pub trait TlsInspector: Send + Sync {
    /// # Errors
    ///
    /// Returns `TlsInspectionError` if the connection, handshake or server
    /// name is rejected.
    async fn inspect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<NetworkInfo, TlsInspectionError>;
}

/// Default inspector: tokio TCP socket plus a rustls handshake.
///
/// The requested timeout is clamped to `TLS_INSPECT_MAX_TIMEOUT`.
#[derive(Debug, Clone)]
pub struct SocketTlsInspector {
    verify: bool,
    ca_bundle: Option<PathBuf>,
}

impl SocketTlsInspector {
    /// Inspector that validates the peer against the bundled web PKI roots.
    pub fn new() -> Self {
        Self {
            verify: true,
            ca_bundle: None,
        }
    }

    /// Inspector that accepts any certificate (self-signed, expired, wrong name).
    pub fn insecure() -> Self {
        Self {
            verify: false,
            ca_bundle: None,
        }
    }

    /// Trust only the certificates in this PEM file. Ignored by `insecure()`.
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }
}

impl Default for SocketTlsInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TlsInspector for SocketTlsInspector {
    async fn inspect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<NetworkInfo, TlsInspectionError> {
        let timeout = timeout.min(TLS_INSPECT_MAX_TIMEOUT);
        let deadline = Instant::now() + timeout;

        let config = build_client_config(&TlsPolicy {
            verify: self.verify,
            ca_bundle: self.ca_bundle.as_deref(),
            http2: false,
        })?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TlsInspectionError::InvalidServerName(e.to_string()))?;

        debug!("Inspecting TLS for {host}:{port} (timeout {timeout:?})");
        let sock = timeout_at(deadline, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TlsInspectionError::Connect(format!("timed out after {timeout:?}")))?
            .map_err(|e| TlsInspectionError::Connect(e.to_string()))?;

        let mut network = NetworkInfo::default();
        // An unconnected socket leaves ip/family unset
        if let Ok(peer) = sock.peer_addr() {
            let ip = peer.ip();
            network.ip = Some(ip.to_string());
            network.ip_family = Some(AddressFamily::from(&ip).label());
        }

        let connector = TlsConnector::from(Arc::new(config));
        let tls_stream = timeout_at(deadline, connector.connect(server_name, sock))
            .await
            .map_err(|_| TlsInspectionError::Handshake(format!("timed out after {timeout:?}")))?
            .map_err(|e| TlsInspectionError::Handshake(e.to_string()))?;

        let live = live_tls_info(tls_stream.get_ref().1);
        network.merge_tls_from(&live.network);

        Ok(network)
    }
}

//! rustls client configuration.
//!
//! One builder covers every policy the tool needs: bundled web PKI roots, a
//! caller-supplied CA bundle, or no verification at all.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error_handling::TlsConfigError;

/// ALPN identifier for HTTP/2.
pub const ALPN_H2: &[u8] = b"h2";
/// ALPN identifier for HTTP/1.1.
pub const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Certificate verification policy for one attempt.
#[derive(Debug, Clone)]
pub struct TlsPolicy<'a> {
    /// Enforce certificate and hostname validation
    pub verify: bool,
    /// Trust only the certificates in this PEM file (ignored when `verify` is false)
    pub ca_bundle: Option<&'a Path>,
    /// Offer `h2` in addition to `http/1.1`
    pub http2: bool,
}

/// Builds a client configuration for `policy`.
///
/// The ring provider is passed explicitly, so no process-wide default provider
/// needs to be installed.
///
/// # Errors
///
/// Returns `TlsConfigError` when the CA bundle cannot be read or holds no
/// certificates.
pub fn build_client_config(policy: &TlsPolicy<'_>) -> Result<ClientConfig, TlsConfigError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let mut config = if policy.verify {
        let roots = match policy.ca_bundle {
            Some(path) => load_ca_bundle(path)?,
            None => {
                let mut roots = RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                roots
            }
        };
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth()
    };

    config.alpn_protocols = if policy.http2 {
        vec![ALPN_H2.to_vec(), ALPN_HTTP11.to_vec()]
    } else {
        vec![ALPN_HTTP11.to_vec()]
    };

    Ok(config)
}

/// Reads every certificate from a PEM bundle into a fresh root store.
fn load_ca_bundle(path: &Path) -> Result<RootCertStore, TlsConfigError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| TlsConfigError::ReadCaBundle {
        path: display.clone(),
        source,
    })?;

    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut BufReader::new(file)) {
        let cert = cert.map_err(|source| TlsConfigError::ReadCaBundle {
            path: display.clone(),
            source,
        })?;
        roots
            .add(cert)
            .map_err(|e| TlsConfigError::InvalidCaBundle {
                path: display.clone(),
                reason: e.to_string(),
            })?;
    }

    if roots.is_empty() {
        return Err(TlsConfigError::InvalidCaBundle {
            path: display,
            reason: "no certificates found".to_string(),
        });
    }

    Ok(roots)
}

/// Accepts any server certificate. Handshake signatures are still checked so
/// the session keys remain bound to the presented certificate.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

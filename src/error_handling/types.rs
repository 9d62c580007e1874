//! Error type definitions.
//!
//! This module defines the error taxonomy used throughout the crate: DNS
//! resolution, TLS inspection, the HTTP client and process initialization.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Failure to turn a hostname into an IP address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsResolutionError {
    /// The lookup did not finish within the requested timeout.
    #[error("DNS resolution timed out")]
    Timeout,

    /// The platform lookup reported an error.
    #[error("DNS resolution failed: {0}")]
    ResolutionFailed(String),

    /// The lookup succeeded but returned no records.
    #[error("No address records found")]
    NoRecords,

    /// The first record carried no usable address.
    #[error("Failed to extract IP address")]
    MissingAddress,

    /// Anything else (for example, the lookup thread panicked).
    #[error("Unexpected error during DNS resolution: {0}")]
    Unexpected(String),
}

/// Failure to build a rustls client configuration.
#[derive(Error, Debug)]
pub enum TlsConfigError {
    /// The CA bundle file could not be read.
    #[error("Failed to read CA bundle {path}: {source}")]
    ReadCaBundle {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The CA bundle contained no usable certificate.
    #[error("Invalid CA bundle {path}: {reason}")]
    InvalidCaBundle { path: String, reason: String },

    /// rustls rejected the protocol configuration.
    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Failure of the side-channel TLS inspection.
///
/// These are absorbed by the request executor and never surface in a step's
/// `error` field.
#[derive(Error, Debug)]
pub enum TlsInspectionError {
    /// TCP connect failed or timed out.
    #[error("TLS inspection failed: connect: {0}")]
    Connect(String),

    /// The TLS handshake failed or timed out.
    #[error("TLS inspection failed: handshake: {0}")]
    Handshake(String),

    /// The peer certificate could not be parsed.
    #[error("TLS inspection failed: certificate: {0}")]
    Certificate(String),

    /// The host is not a valid TLS server name.
    #[error("TLS inspection failed: invalid server name: {0}")]
    InvalidServerName(String),

    /// The client configuration could not be built.
    #[error("TLS inspection failed: {0}")]
    Config(#[from] TlsConfigError),
}

/// Failure of a single HTTP request attempt.
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// The URL could not be parsed or has no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Name resolution failed; the DNS message is shown verbatim.
    #[error(transparent)]
    Dns(#[from] DnsResolutionError),

    /// The request could not be constructed (bad method, header, CA bundle, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The per-attempt deadline elapsed.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Transport-level failure (connect, TLS, protocol).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Anything not covered above.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

//! Error handling.
//!
//! Typed errors for each layer. The binary wraps these in `anyhow`.

mod types;

pub use types::{
    DnsResolutionError, HttpClientError, InitializationError, TlsConfigError, TlsInspectionError,
};

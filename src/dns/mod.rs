//! Hostname resolution with an independent timeout.
//!
//! This module provides:
//! - The `DnsResolver` capability used by the request executor
//! - `SystemDnsResolver`: platform lookup on a detached thread, raced against a timer
//! - `HickoryDnsResolver`: async resolver using the system DNS configuration
//! - Address family labels ("IPv4", "IPv6", "AF_<n>")

mod family;
mod hickory;
mod resolution;

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error_handling::DnsResolutionError;

pub use family::AddressFamily;
pub use hickory::HickoryDnsResolver;
pub use resolution::{AddrRecord, HostLookup, StdHostLookup, SystemDnsResolver};

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAddress {
    pub ip: IpAddr,
    /// "IPv4", "IPv6" or "AF_<n>"
    pub family: String,
    pub elapsed_ms: f64,
}

/// Resolves a hostname to the first address the resolver returns.
///
/// `timeout` is independent of any surrounding request timeout.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<ResolvedAddress, DnsResolutionError>;
}

#[cfg(test)]
mod tests;

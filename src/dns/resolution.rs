//! Platform hostname resolution raced against a timer.
//!
//! The platform lookup (`getaddrinfo` behind `ToSocketAddrs`) cannot be
//! interrupted. It runs on a detached thread; on timeout the caller returns
//! immediately and the thread is abandoned, never joined.

use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use tokio::sync::oneshot;

use super::{AddressFamily, DnsResolver, ResolvedAddress};
use crate::error_handling::DnsResolutionError;

/// One record returned by a blocking host lookup.
///
/// `address` is optional because platform results are not guaranteed to carry
/// a usable address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrRecord {
    pub family: AddressFamily,
    pub address: Option<String>,
}

/// A blocking host lookup, in platform order.
///
/// Implementations may block for an arbitrary time; `SystemDnsResolver`
/// bounds them.
pub trait HostLookup: Send + Sync + 'static {
    /// # Errors
    ///
    /// Returns the platform's error message when the name cannot be resolved.
    fn lookup(&self, host: &str, port: u16) -> Result<Vec<AddrRecord>, String>;
}

/// `HostLookup` backed by the standard library (`getaddrinfo`).
#[derive(Debug, Default, Clone, Copy)]
pub struct StdHostLookup;

impl HostLookup for StdHostLookup {
    fn lookup(&self, host: &str, port: u16) -> Result<Vec<AddrRecord>, String> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| e.to_string())?;
        Ok(addrs
            .map(|addr| {
                let ip = addr.ip();
                AddrRecord {
                    family: AddressFamily::from(&ip),
                    address: Some(ip.to_string()),
                }
            })
            .collect())
    }
}

/// Default resolver: platform lookup with an independent timeout.
pub struct SystemDnsResolver {
    lookup: Arc<dyn HostLookup>,
}

impl SystemDnsResolver {
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(StdHostLookup))
    }

    /// Uses a custom lookup (tests inject slow or malformed ones).
    pub fn with_lookup(lookup: Arc<dyn HostLookup>) -> Self {
        Self { lookup }
    }
}

impl Default for SystemDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemDnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemDnsResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn resolve(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<ResolvedAddress, DnsResolutionError> {
        let start = Instant::now();
        let (tx, rx) = oneshot::channel();
        let lookup = Arc::clone(&self.lookup);
        let owned_host = host.to_string();

        std::thread::Builder::new()
            .name("dns-lookup".to_string())
            .spawn(move || {
                let result = lookup.lookup(&owned_host, port);
                // Receiver is gone if the caller already timed out
                let _ = tx.send(result);
            })
            .map_err(|e| DnsResolutionError::Unexpected(e.to_string()))?;

        let records = match tokio::time::timeout(timeout, rx).await {
            Err(_) => {
                debug!("DNS lookup for {host} abandoned after {timeout:?}");
                return Err(DnsResolutionError::Timeout);
            }
            Ok(Err(_)) => {
                return Err(DnsResolutionError::Unexpected(
                    "lookup thread exited without a result".to_string(),
                ))
            }
            Ok(Ok(Err(cause))) => return Err(DnsResolutionError::ResolutionFailed(cause)),
            Ok(Ok(Ok(records))) => records,
        };

        let (ip, family) = first_address(&records)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!("Resolved {host} to {ip} ({family}) in {elapsed_ms:.2}ms");

        Ok(ResolvedAddress {
            ip,
            family,
            elapsed_ms,
        })
    }
}

/// Takes the first record regardless of family.
fn first_address(records: &[AddrRecord]) -> Result<(IpAddr, String), DnsResolutionError> {
    let first = records.first().ok_or(DnsResolutionError::NoRecords)?;
    let ip = first
        .address
        .as_deref()
        .and_then(|a| a.parse::<IpAddr>().ok())
        .ok_or(DnsResolutionError::MissingAddress)?;
    Ok((ip, first.family.label()))
}

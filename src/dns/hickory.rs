//! Async resolver backed by `hickory-resolver`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use log::{debug, warn};

use super::{AddressFamily, DnsResolver, ResolvedAddress};
use crate::error_handling::DnsResolutionError;

/// Resolver that queries DNS servers directly instead of the platform lookup.
///
/// The lookup future is cancellable, so the timeout is a plain
/// `tokio::time::timeout`.
pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsResolver {
    /// Builds a resolver from `/etc/resolv.conf`, falling back to the default
    /// public configuration when the system configuration cannot be read.
    pub fn from_system_conf() -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!("Failed to read system DNS configuration, using defaults: {e}");
                let mut opts = ResolverOpts::default();
                // Names are passed as typed; no search-domain appending
                opts.ndots = 0;
                TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
            }
        };
        Self { resolver }
    }

    pub fn with_resolver(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }
}

impl std::fmt::Debug for HickoryDnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryDnsResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn resolve(
        &self,
        host: &str,
        _port: u16,
        timeout: Duration,
    ) -> Result<ResolvedAddress, DnsResolutionError> {
        let start = Instant::now();

        let response = tokio::time::timeout(timeout, self.resolver.lookup_ip(host))
            .await
            .map_err(|_| DnsResolutionError::Timeout)?
            .map_err(|e| match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => DnsResolutionError::NoRecords,
                _ => DnsResolutionError::ResolutionFailed(e.to_string()),
            })?;

        let ip = response.iter().next().ok_or(DnsResolutionError::NoRecords)?;
        let family = AddressFamily::from(&ip).label();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!("Resolved {host} to {ip} ({family}) via hickory in {elapsed_ms:.2}ms");

        Ok(ResolvedAddress {
            ip,
            family,
            elapsed_ms,
        })
    }
}

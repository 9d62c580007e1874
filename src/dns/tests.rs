//! DNS module tests.

use super::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct FixedLookup(Result<Vec<AddrRecord>, String>);

impl HostLookup for FixedLookup {
    fn lookup(&self, _host: &str, _port: u16) -> Result<Vec<AddrRecord>, String> {
        self.0.clone()
    }
}

struct SleepingLookup(Duration);

impl HostLookup for SleepingLookup {
    fn lookup(&self, _host: &str, _port: u16) -> Result<Vec<AddrRecord>, String> {
        std::thread::sleep(self.0);
        Ok(vec![record(AddressFamily::Inet, Some("192.0.2.1"))])
    }
}

struct PanickingLookup;

impl HostLookup for PanickingLookup {
    fn lookup(&self, _host: &str, _port: u16) -> Result<Vec<AddrRecord>, String> {
        panic!("resolver exploded");
    }
}

fn record(family: AddressFamily, address: Option<&str>) -> AddrRecord {
    AddrRecord {
        family,
        address: address.map(str::to_string),
    }
}

fn resolver_with(result: Result<Vec<AddrRecord>, String>) -> SystemDnsResolver {
    SystemDnsResolver::with_lookup(Arc::new(FixedLookup(result)))
}

const TIMEOUT: Duration = Duration::from_secs(2);

#[test]
fn test_family_labels() {
    assert_eq!(AddressFamily::Inet.label(), "IPv4");
    assert_eq!(AddressFamily::Inet6.label(), "IPv6");
    assert_eq!(AddressFamily::Other(17).label(), "AF_17");
}

#[tokio::test]
async fn test_resolve_takes_first_record_regardless_of_family() {
    let resolver = resolver_with(Ok(vec![
        record(AddressFamily::Inet6, Some("2001:db8::1")),
        record(AddressFamily::Inet, Some("192.0.2.1")),
    ]));

    let resolved = resolver.resolve("example.test", 443, TIMEOUT).await.unwrap();

    assert_eq!(resolved.ip, "2001:db8::1".parse::<std::net::IpAddr>().unwrap());
    assert_eq!(resolved.family, "IPv6");
    assert!(resolved.elapsed_ms >= 0.0);
}

#[tokio::test]
async fn test_resolve_unknown_family_label() {
    let resolver = resolver_with(Ok(vec![record(AddressFamily::Other(99), Some("192.0.2.7"))]));
    let resolved = resolver.resolve("example.test", 80, TIMEOUT).await.unwrap();
    assert_eq!(resolved.family, "AF_99");
}

#[tokio::test]
async fn test_resolve_empty_result() {
    let resolver = resolver_with(Ok(vec![]));
    let err = resolver.resolve("example.test", 80, TIMEOUT).await.unwrap_err();
    assert_eq!(err, DnsResolutionError::NoRecords);
    assert_eq!(err.to_string(), "No address records found");
}

#[tokio::test]
async fn test_resolve_missing_address() {
    let resolver = resolver_with(Ok(vec![record(AddressFamily::Inet, None)]));
    let err = resolver.resolve("example.test", 80, TIMEOUT).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to extract IP address");
}

#[tokio::test]
async fn test_resolve_unparseable_address() {
    let resolver = resolver_with(Ok(vec![record(AddressFamily::Inet, Some("not-an-ip"))]));
    let err = resolver.resolve("example.test", 80, TIMEOUT).await.unwrap_err();
    assert_eq!(err, DnsResolutionError::MissingAddress);
}

#[tokio::test]
async fn test_resolve_platform_failure() {
    let resolver = resolver_with(Err("Name or service not known".to_string()));
    let err = resolver.resolve("nope.invalid", 80, TIMEOUT).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "DNS resolution failed: Name or service not known"
    );
}

#[tokio::test]
async fn test_resolve_panicking_lookup_is_unexpected() {
    let resolver = SystemDnsResolver::with_lookup(Arc::new(PanickingLookup));
    let err = resolver.resolve("example.test", 80, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, DnsResolutionError::Unexpected(_)));
    assert!(err
        .to_string()
        .starts_with("Unexpected error during DNS resolution"));
}

#[tokio::test]
async fn test_resolve_timeout_abandons_slow_lookup() {
    let resolver = SystemDnsResolver::with_lookup(Arc::new(SleepingLookup(Duration::from_secs(10))));

    let start = Instant::now();
    let err = resolver
        .resolve("slow.test", 80, Duration::from_millis(100))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err, DnsResolutionError::Timeout);
    assert_eq!(err.to_string(), "DNS resolution timed out");
    assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
}

#[tokio::test]
async fn test_std_lookup_resolves_ip_literal() {
    let resolver = SystemDnsResolver::new();
    let resolved = resolver.resolve("127.0.0.1", 80, TIMEOUT).await.unwrap();
    assert_eq!(resolved.ip.to_string(), "127.0.0.1");
    assert_eq!(resolved.family, "IPv4");
}

#[tokio::test]
async fn test_hickory_resolves_ip_literal() {
    let resolver = HickoryDnsResolver::from_system_conf();
    let resolved = resolver.resolve("127.0.0.1", 80, TIMEOUT).await.unwrap();
    assert_eq!(resolved.ip.to_string(), "127.0.0.1");
    assert_eq!(resolved.family, "IPv4");
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_hickory_resolves_public_name() {
    let resolver = HickoryDnsResolver::from_system_conf();
    let resolved = resolver.resolve("example.com", 443, TIMEOUT).await;
    assert!(resolved.is_ok());
}

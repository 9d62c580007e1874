//! Configuration types.
//!
//! This module defines the logging enums shared by the CLI and the library, and
//! the `AnalyzerConfig` struct that drives a request analysis.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{DEFAULT_CONNECT_SHARE, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Which DNS resolver implementation performs the lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ResolverKind {
    /// Platform resolver (getaddrinfo) raced against a timer
    #[default]
    System,
    /// Async hickory resolver using the system resolver configuration
    Hickory,
}

/// Settings for one analysis (a request plus any redirects it follows).
///
/// # Examples
///
/// ```
/// use http_timing::AnalyzerConfig;
///
/// let config = AnalyzerConfig {
///     follow_redirects: true,
///     max_redirects: 5,
///     ..Default::default()
/// };
/// assert!(config.verify_ssl);
/// ```
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Follow 3xx responses that carry a non-empty Location header
    pub follow_redirects: bool,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Offer HTTP/2 via ALPN
    pub http2: bool,

    /// Enforce certificate validation
    pub verify_ssl: bool,

    /// PEM bundle used as the trust root instead of the bundled web PKI roots
    pub ca_bundle: Option<PathBuf>,

    /// Proxy URL (http, https, socks5, socks5h), passed through unmodified
    pub proxy: Option<String>,

    /// Maximum number of redirects followed after the initial request
    pub max_redirects: usize,

    /// Connect share used when splitting an unmeasured HTTPS connection phase
    pub connect_share: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            follow_redirects: false,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            http2: true,
            verify_ssl: true,
            ca_bundle: None,
            proxy: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_share: DEFAULT_CONNECT_SHARE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_log_format_debug() {
        assert_eq!(format!("{:?}", LogFormat::Plain), "Plain");
        assert_eq!(format!("{:?}", LogFormat::Json), "Json");
    }

    #[test]
    fn test_analyzer_config_default() {
        let config = AnalyzerConfig::default();
        assert!(!config.follow_redirects);
        assert!(config.http2);
        assert!(config.verify_ssl);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.connect_share, 0.3);
        assert!(config.proxy.is_none());
        assert!(config.ca_bundle.is_none());
    }

    #[test]
    fn test_resolver_kind_default_is_system() {
        assert_eq!(ResolverKind::default(), ResolverKind::System);
    }
}

//! http_timing library: single-request HTTP diagnostics
//!
//! This library performs one HTTP(S) request per redirect hop and reports a
//! phase breakdown (DNS, connect, TLS, wait, transfer) together with network,
//! TLS and certificate details for each hop.
//!
//! # Example
//!
//! ```no_run
//! use http_timing::{AnalysisRequest, Analyzer, AnalyzerConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = AnalyzerConfig {
//!     follow_redirects: true,
//!     ..Default::default()
//! };
//!
//! let steps = Analyzer::new(config)
//!     .analyze_url("https://example.com/", &AnalysisRequest::default())
//!     .await;
//! for step in &steps {
//!     println!("{} {:?} {:.1}ms", step.url, step.response.status, step.timing.total_ms);
//! }
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod analyzer;
pub mod config;
pub mod dns;
mod error_handling;
pub mod export;
pub mod fetch;
pub mod initialization;
mod models;
pub mod timing;
pub mod tls;
pub mod utils;

// Re-export public API
pub use analyzer::{exit_code_for, AnalysisRequest, Analyzer};
pub use config::{AnalyzerConfig, LogFormat, LogLevel, ResolverKind};
pub use dns::{DnsResolver, HickoryDnsResolver, ResolvedAddress, SystemDnsResolver};
pub use error_handling::{
    DnsResolutionError, HttpClientError, InitializationError, TlsConfigError, TlsInspectionError,
};
pub use fetch::{
    DefaultRequestExecutor, ExecutorStrategy, RequestExecutor, RequestOptions, RequestOutcome,
};
pub use models::{NetworkInfo, RequestInfo, ResponseInfo, StepMetrics, TimingMetrics};
pub use timing::{MonotonicTimingCollector, TimingCollector, TraceCollector};
pub use tls::{SocketTlsInspector, TlsInspector};

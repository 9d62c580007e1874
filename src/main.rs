//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `http_timing` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Plain per-step output, optional JSON export and the exit code
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use http_timing::config::{
    DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS, EXIT_SOFTWARE, EXIT_USAGE,
};
use http_timing::export::export_json;
use http_timing::initialization::init_logger_with;
use http_timing::utils::{parse_header_args, validate_url};
use http_timing::{
    exit_code_for, AnalysisRequest, Analyzer, AnalyzerConfig, HickoryDnsResolver, LogFormat,
    LogLevel, ResolverKind, StepMetrics,
};

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Single request
/// http_timing https://example.com
///
/// # Follow redirects, skip certificate checks, export the report
/// http_timing http://example.com -L -k --json report.json
///
/// # POST with headers through a SOCKS proxy
/// http_timing https://api.example.com/v1 -d '{"q":1}' -H 'Content-Type: application/json' \
///     --proxy socks5h://127.0.0.1:1080
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "http_timing",
    version,
    about = "Times one HTTP request: DNS, connect, TLS, wait and transfer."
)]
struct Opt {
    /// URL to analyze (http:// or https://)
    url: String,

    /// Follow redirects
    #[arg(short = 'L', long = "follow")]
    follow: bool,

    /// Maximum number of redirects to follow
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
    max_redirects: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: f64,

    /// Offer only HTTP/1.1 during ALPN
    #[arg(long)]
    no_http2: bool,

    /// Skip certificate verification
    #[arg(short = 'k', long)]
    insecure: bool,

    /// PEM bundle of trusted CA certificates (replaces the built-in roots)
    #[arg(long, value_name = "PATH")]
    cacert: Option<PathBuf>,

    /// Proxy URL: http://, https://, socks5:// or socks5h://
    #[arg(long, env = "HTTP_TIMING_PROXY")]
    proxy: Option<String>,

    /// Request method (defaults to POST when --data is given, GET otherwise)
    #[arg(short = 'X', long)]
    method: Option<String>,

    /// Request body
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Request header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// DNS resolver: system|hickory
    #[arg(long, value_enum, default_value_t = ResolverKind::System)]
    resolver: ResolverKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let code = match run(opt).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("http_timing error: {e:#}");
            EXIT_SOFTWARE
        }
    };
    process::exit(code);
}

/// Validates input, runs the analysis and returns the exit code.
async fn run(opt: Opt) -> Result<i32> {
    if !validate_url(&opt.url) || Url::parse(&opt.url).is_err() {
        eprintln!(
            "Invalid URL: {} (must be an http:// or https:// URL)",
            opt.url
        );
        return Ok(EXIT_USAGE);
    }
    let timeout = match Duration::try_from_secs_f64(opt.timeout) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        _ => {
            eprintln!(
                "Invalid timeout: {} (must be a positive number of seconds)",
                opt.timeout
            );
            return Ok(EXIT_USAGE);
        }
    };
    let headers = match parse_header_args(&opt.headers) {
        Ok(headers) => headers,
        Err(e) => {
            eprintln!("{e}");
            return Ok(EXIT_USAGE);
        }
    };
    if let Some(path) = opt.cacert.as_ref().filter(|p| !p.is_file()) {
        eprintln!("CA bundle not found: {}", path.display());
        return Ok(EXIT_USAGE);
    }

    let method = opt
        .method
        .clone()
        .unwrap_or_else(|| if opt.data.is_some() { "POST" } else { "GET" }.to_string());
    let request = AnalysisRequest {
        method,
        headers,
        body: opt.data.clone().unwrap_or_default().into_bytes(),
    };

    let config = AnalyzerConfig {
        follow_redirects: opt.follow,
        timeout,
        http2: !opt.no_http2,
        verify_ssl: !opt.insecure,
        ca_bundle: opt.cacert.clone(),
        proxy: opt.proxy.clone().filter(|p| !p.trim().is_empty()),
        max_redirects: opt.max_redirects,
        ..Default::default()
    };

    let mut analyzer = Analyzer::new(config);
    if opt.resolver == ResolverKind::Hickory {
        analyzer = analyzer.with_dns_resolver(Arc::new(HickoryDnsResolver::from_system_conf()));
    }

    let steps = analyzer.analyze_url(&opt.url, &request).await;
    for step in &steps {
        println!("{}", format_step(step));
    }

    if let Some(path) = opt.json.as_deref() {
        export_json(&steps, &opt.url, Some(path))
            .with_context(|| format!("Failed to export report to {}", path.display()))?;
    }

    Ok(exit_code_for(&steps))
}

/// One plain line per step.
fn format_step(step: &StepMetrics) -> String {
    let head = format!("[{}] {} {}", step.step_number, step.request.method, step.url);
    if let Some(error) = &step.error {
        return format!("{head} -> ERROR {error}");
    }

    let t = &step.timing;
    let status = step
        .response
        .status
        .map_or_else(|| "-".to_string(), |s| s.to_string());
    let mut line = format!(
        "{head} -> {status} {} | dns {:.1}ms connect {:.1}ms tls {:.1}ms wait {:.1}ms xfer {:.1}ms total {:.1}ms",
        step.network.http_version.as_deref().unwrap_or("-"),
        t.dns_ms,
        t.connect_ms,
        t.tls_ms,
        t.wait_ms,
        t.xfer_ms,
        t.total_ms,
    );
    if t.is_estimated {
        line.push_str(" (estimated)");
    }
    if let Some(ip) = &step.network.ip {
        line.push_str(&format!(" | ip {ip}"));
    }
    if let Some(version) = &step.network.tls_version {
        line.push_str(&format!(" {version}"));
    }
    if let Some(cn) = &step.network.cert_cn {
        line.push_str(&format!(" cn={cn}"));
    }
    if let Some(days) = step.network.cert_days_left {
        line.push_str(&format!(" expires_in={days}d"));
    }
    if let Some(location) = step.response.location.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(" | location {location}"));
    }
    line
}

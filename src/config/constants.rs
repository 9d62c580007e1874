//! Configuration constants.
//!
//! This module defines the constants used throughout the crate: timeouts, the
//! TLS inspection ceiling, the connect/TLS estimation split, redirect limits and the
//! header names treated as sensitive.

use std::time::Duration;

// Request defaults
/// Default per-attempt timeout in seconds (bounds DNS, connect, TLS and response headers)
pub const DEFAULT_TIMEOUT_SECS: f64 = 20.0;
/// Default maximum number of redirects followed after the initial request
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

// TLS inspection
/// Hard ceiling for the side-channel TLS inspection, whatever timeout the caller asks for
pub const TLS_INSPECT_MAX_TIMEOUT: Duration = Duration::from_secs(5);

// Timing reconciliation
/// Share of the pre-request connection phase attributed to TCP connect when the
/// transport reports no precise trace timing for an HTTPS request.
///
/// The TLS handshake receives the remainder (`1.0 - DEFAULT_CONNECT_SHARE`).
/// This is a heuristic, tunable through `PhaseSplit`, not a measured constant.
pub const DEFAULT_CONNECT_SHARE: f64 = 0.3;

/// User-Agent sent with every request unless the caller supplies one.
pub const USER_AGENT: &str = concat!("http_timing/", env!("CARGO_PKG_VERSION"));

// Header masking
/// Replacement text used when masking sensitive header values
pub const MASK_PATTERN: &str = "****";
/// Number of characters kept visible at each end of a masked value
pub const MASK_SHOW_CHARS: usize = 4;
/// Request/response header names (lowercase) whose values are masked before reporting
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "api-key",
    "x-api-key",
];

// Trace event keys emitted by the traced transport
/// Trace category for the TCP connect phase
pub const TRACE_CONNECT_TCP: &str = "connection.connect_tcp";
/// Trace category for the TLS handshake phase
pub const TRACE_START_TLS: &str = "connection.start_tls";

// Process exit codes (sysexits.h)
/// Every step completed
pub const EXIT_OK: i32 = 0;
/// Invalid command-line input
pub const EXIT_USAGE: i32 = 64;
/// At least one step failed at the network level
pub const EXIT_UNAVAILABLE: i32 = 69;
/// Nothing was analyzed, or an unexpected internal failure
pub const EXIT_SOFTWARE: i32 = 70;

//! Reconciliation of precise and estimated connect/TLS timing.

use crate::config::DEFAULT_CONNECT_SHARE;
use crate::models::TimingMetrics;

/// How an unmeasured HTTPS connection phase is divided between TCP connect
/// and the TLS handshake.
///
/// The default 30/70 split is a heuristic, not a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSplit {
    /// Share assigned to connect, clamped to `0.0..=1.0`; TLS receives the rest
    pub connect_share: f64,
}

impl PhaseSplit {
    pub fn new(connect_share: f64) -> Self {
        Self {
            connect_share: connect_share.clamp(0.0, 1.0),
        }
    }

    pub fn tls_share(&self) -> f64 {
        1.0 - self.connect_share
    }
}

impl Default for PhaseSplit {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_SHARE)
    }
}

/// Combines the collector's base record with trace durations.
///
/// - Both durations present: used as-is, not estimated.
/// - HTTPS with either missing: the phase `max(0, ttfb - dns)` is split per
///   `split`; only the missing value is estimated and `is_estimated` is set.
/// - Plain HTTP with connect missing: the whole phase goes to connect. TLS is
///   zero and the record is never estimated.
///
/// `wait_ms` and `xfer_ms` are derived last.
pub fn build_timing_metrics(
    base: TimingMetrics,
    is_https: bool,
    connect_ms: Option<f64>,
    tls_ms: Option<f64>,
    split: PhaseSplit,
) -> TimingMetrics {
    let mut timing = base;
    let phase_ms = (timing.ttfb_ms - timing.dns_ms).max(0.0);

    match (connect_ms, tls_ms) {
        (Some(connect), Some(tls)) if is_https => {
            timing.connect_ms = connect;
            timing.tls_ms = tls;
            timing.is_estimated = false;
        }
        (connect, tls) if is_https => {
            timing.connect_ms = connect.unwrap_or(phase_ms * split.connect_share);
            timing.tls_ms = tls.unwrap_or(phase_ms * split.tls_share());
            timing.is_estimated = true;
        }
        (connect, _) => {
            timing.connect_ms = connect.unwrap_or(phase_ms);
            timing.tls_ms = 0.0;
            timing.is_estimated = false;
        }
    }

    timing.calculate_derived();
    timing
}

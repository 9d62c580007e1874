//! Wall-clock marks for one request.

use std::time::Instant;

use crate::models::TimingMetrics;

/// The five lifecycle marks a collector records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    DnsStart,
    DnsEnd,
    RequestStart,
    Ttfb,
    RequestEnd,
}

/// Accumulates marks for one attempt and converts them to a timing record.
///
/// No mark is mandatory; missing marks yield zero durations.
pub trait TimingCollector: Send + Sync {
    fn mark_dns_start(&mut self);
    fn mark_dns_end(&mut self);
    fn mark_request_start(&mut self);
    fn mark_ttfb(&mut self);
    fn mark_request_end(&mut self);

    /// Base record: `dns_ms`, `ttfb_ms`, `total_ms`. Connect and TLS are left
    /// at zero for the executor to reconcile.
    fn get_metrics(&self) -> TimingMetrics;
}

/// Creates a fresh collector per attempt.
pub type TimingCollectorFactory = std::sync::Arc<dyn Fn() -> Box<dyn TimingCollector> + Send + Sync>;

/// Collector backed by the monotonic clock.
///
/// `ttfb_ms` and `total_ms` are measured from the collector's creation.
#[derive(Debug, Clone)]
pub struct MonotonicTimingCollector {
    origin: Instant,
    dns_start: Option<Instant>,
    dns_end: Option<Instant>,
    request_start: Option<Instant>,
    ttfb: Option<Instant>,
    request_end: Option<Instant>,
}

impl MonotonicTimingCollector {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Collector whose origin is `origin` instead of now.
    pub fn starting_at(origin: Instant) -> Self {
        Self {
            origin,
            dns_start: None,
            dns_end: None,
            request_start: None,
            ttfb: None,
            request_end: None,
        }
    }

    /// Records `mark` at an explicit instant.
    pub fn record_mark(&mut self, mark: Mark, at: Instant) {
        let slot = match mark {
            Mark::DnsStart => &mut self.dns_start,
            Mark::DnsEnd => &mut self.dns_end,
            Mark::RequestStart => &mut self.request_start,
            Mark::Ttfb => &mut self.ttfb,
            Mark::RequestEnd => &mut self.request_end,
        };
        *slot = Some(at);
    }

    fn since_origin_ms(&self, mark: Option<Instant>) -> f64 {
        mark.map_or(0.0, |at| signed_ms(self.origin, at))
    }
}

impl Default for MonotonicTimingCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// `later - earlier` in milliseconds, negative when `later` precedes `earlier`.
fn signed_ms(earlier: Instant, later: Instant) -> f64 {
    match later.checked_duration_since(earlier) {
        Some(d) => d.as_secs_f64() * 1000.0,
        None => -(earlier.duration_since(later).as_secs_f64() * 1000.0),
    }
}

impl TimingCollector for MonotonicTimingCollector {
    fn mark_dns_start(&mut self) {
        self.record_mark(Mark::DnsStart, Instant::now());
    }

    fn mark_dns_end(&mut self) {
        self.record_mark(Mark::DnsEnd, Instant::now());
    }

    fn mark_request_start(&mut self) {
        self.record_mark(Mark::RequestStart, Instant::now());
    }

    fn mark_ttfb(&mut self) {
        self.record_mark(Mark::Ttfb, Instant::now());
    }

    fn mark_request_end(&mut self) {
        self.record_mark(Mark::RequestEnd, Instant::now());
    }

    fn get_metrics(&self) -> TimingMetrics {
        let dns_ms = match (self.dns_start, self.dns_end) {
            (Some(start), Some(end)) => signed_ms(start, end),
            _ => 0.0,
        };

        TimingMetrics {
            dns_ms,
            ttfb_ms: self.since_origin_ms(self.ttfb),
            total_ms: self.since_origin_ms(self.request_end),
            ..Default::default()
        }
    }
}

//! Phase timing for a single request.
//!
//! This module provides:
//! - `TimingCollector`: wall-clock marks (DNS, request start, TTFB, end)
//! - `TraceCollector`: transport lifecycle events giving precise connect/TLS durations
//! - `build_timing_metrics`: reconciles the two, estimating what the trace lacks

mod collector;
mod reconcile;
mod trace;

pub use collector::{Mark, MonotonicTimingCollector, TimingCollector, TimingCollectorFactory};
pub use reconcile::{build_timing_metrics, PhaseSplit};
pub use trace::{PhaseMarks, TraceCollector};

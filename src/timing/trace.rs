//! Connection lifecycle events reported by the transport.

use std::collections::HashMap;
use std::time::Instant;

use log::trace;

use crate::config::{TRACE_CONNECT_TCP, TRACE_START_TLS};

/// Start/complete instants for one event category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseMarks {
    pub started: Option<Instant>,
    pub complete: Option<Instant>,
}

impl PhaseMarks {
    /// `complete - started` in milliseconds, or `None` when either is missing
    /// or the pair is inverted.
    pub fn duration_ms(&self) -> Option<f64> {
        let started = self.started?;
        let complete = self.complete?;
        complete
            .checked_duration_since(started)
            .map(|d| d.as_secs_f64() * 1000.0)
    }
}

/// Sink for named lifecycle events, e.g. `connection.connect_tcp` with state
/// `started` or `complete`.
///
/// Names without a `<category>.<phase>` separator and unknown states are ignored.
#[derive(Debug, Clone, Default)]
pub struct TraceCollector {
    phases: HashMap<String, PhaseMarks>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `state` for event `name` at the current instant.
    pub fn record(&mut self, name: &str, state: &str) {
        self.record_at(name, state, Instant::now());
    }

    /// Records `state` for event `name` at an explicit instant.
    pub fn record_at(&mut self, name: &str, state: &str, at: Instant) {
        let well_formed = name
            .split_once('.')
            .is_some_and(|(category, phase)| !category.is_empty() && !phase.is_empty());
        if !well_formed {
            return;
        }

        let slot = match state {
            "started" => &mut self.phases.entry(name.to_string()).or_default().started,
            "complete" => &mut self.phases.entry(name.to_string()).or_default().complete,
            _ => return,
        };
        *slot = Some(at);
        trace!("trace event {name}.{state}");
    }

    pub fn phase(&self, category: &str) -> Option<&PhaseMarks> {
        self.phases.get(category)
    }

    /// Precise TCP connect duration, if both events were seen in order.
    pub fn connect_ms(&self) -> Option<f64> {
        self.phase(TRACE_CONNECT_TCP)?.duration_ms()
    }

    /// Precise TLS handshake duration, if both events were seen in order.
    pub fn tls_ms(&self) -> Option<f64> {
        self.phase(TRACE_START_TLS)?.duration_ms()
    }
}

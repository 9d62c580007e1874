//! Value records produced by one request attempt.
//!
//! Every record is created fresh per attempt and serialises to the JSON
//! report schema (absent values become `null`).

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Phase breakdown of one request, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingMetrics {
    pub dns_ms: f64,
    pub connect_ms: f64,
    pub tls_ms: f64,
    /// Time to first byte, measured from collector creation
    pub ttfb_ms: f64,
    pub total_ms: f64,
    pub wait_ms: f64,
    pub xfer_ms: f64,
    /// Set when connect/TLS were split heuristically rather than traced
    pub is_estimated: bool,
}

impl TimingMetrics {
    /// Computes `wait_ms` and `xfer_ms` from the raw phases.
    ///
    /// Negative differences are measurement artifacts and clamp to zero.
    pub fn calculate_derived(&mut self) {
        let pre_request = self.dns_ms + self.connect_ms + self.tls_ms;
        self.wait_ms = (self.ttfb_ms - pre_request).max(0.0);
        self.xfer_ms = (self.total_ms - self.ttfb_ms).max(0.0);
    }
}

/// Connection-level facts about an attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub ip: Option<String>,
    pub ip_family: Option<String>,
    pub http_version: Option<String>,
    pub tls_version: Option<String>,
    pub tls_cipher: Option<String>,
    /// Whether certificate validation was enforced
    pub tls_verified: Option<bool>,
    /// Whether a non-default trust root was supplied
    pub tls_custom_ca: Option<bool>,
    pub cert_cn: Option<String>,
    /// Negative when the certificate has expired
    pub cert_days_left: Option<i64>,
}

impl NetworkInfo {
    /// True when every field TLS inspection can supply is already set.
    pub fn has_complete_tls(&self) -> bool {
        self.tls_version.is_some()
            && self.tls_cipher.is_some()
            && self.cert_cn.is_some()
            && self.cert_days_left.is_some()
    }

    /// Copies TLS fields from `other` into any field of `self` that is still unset.
    ///
    /// Fields already populated are never overwritten (first writer wins).
    pub fn merge_tls_from(&mut self, other: &NetworkInfo) {
        fill(&mut self.tls_version, &other.tls_version);
        fill(&mut self.tls_cipher, &other.tls_cipher);
        fill(&mut self.cert_cn, &other.cert_cn);
        fill(&mut self.cert_days_left, &other.cert_days_left);
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, candidate: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(candidate);
    }
}

/// HTTP response facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseInfo {
    /// `None` until a response is received
    pub status: Option<u16>,
    /// Body bytes actually read (not Content-Length)
    pub bytes: u64,
    pub content_type: Option<String>,
    pub server: Option<String>,
    #[serde(serialize_with = "serialize_date")]
    pub date: Option<DateTime<Utc>>,
    /// Raw Location header; `Some("")` is distinct from absent
    pub location: Option<String>,
    pub headers: BTreeMap<String, String>,
}

fn serialize_date<S: Serializer>(
    date: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        None => serializer.serialize_none(),
    }
}

/// Request metadata recorded alongside each step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestInfo {
    pub method: String,
    /// Sanitised request headers
    pub headers: BTreeMap<String, String>,
    pub body_bytes: usize,
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body_bytes: 0,
        }
    }
}

/// One attempt in a (possibly single-step) redirect chain.
///
/// A step is never discarded on failure; it keeps whatever was populated and
/// carries the error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepMetrics {
    pub url: String,
    pub step_number: usize,
    pub request: RequestInfo,
    pub timing: TimingMetrics,
    pub network: NetworkInfo,
    pub response: ResponseInfo,
    pub error: Option<String>,
    pub note: Option<String>,
    pub proxied_via: Option<String>,
}

impl Default for StepMetrics {
    fn default() -> Self {
        Self {
            url: String::new(),
            step_number: 1,
            request: RequestInfo::default(),
            timing: TimingMetrics::default(),
            network: NetworkInfo::default(),
            response: ResponseInfo::default(),
            error: None,
            note: None,
            proxied_via: None,
        }
    }
}

impl StepMetrics {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// 3xx status with a non-empty Location header.
    pub fn is_redirect(&self) -> bool {
        let redirect_status = matches!(self.response.status, Some(300..=399));
        let has_location = self
            .response
            .location
            .as_deref()
            .is_some_and(|l| !l.is_empty());
        redirect_status && has_location
    }
}

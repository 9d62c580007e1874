//! Redirect-following orchestration.
//!
//! `Analyzer::analyze_url` performs one attempt per hop and records a
//! `StepMetrics` for each, following `Location` manually so every hop gets
//! its own cold-path timing.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, info, warn};
use url::Url;

use crate::config::{AnalyzerConfig, EXIT_OK, EXIT_SOFTWARE, EXIT_UNAVAILABLE};
use crate::dns::DnsResolver;
use crate::error_handling::HttpClientError;
use crate::fetch::{DefaultRequestExecutor, ExecutorStrategy, RequestOptions};
use crate::models::{RequestInfo, StepMetrics};
use crate::timing::{MonotonicTimingCollector, PhaseSplit, TimingCollectorFactory};
use crate::tls::TlsInspector;
use crate::utils::sanitize_headers;

/// Method, headers and body sent on every hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// Runs a URL (and optionally its redirects) through a request strategy.
pub struct Analyzer {
    config: AnalyzerConfig,
    strategy: ExecutorStrategy,
    dns_resolver: Option<Arc<dyn DnsResolver>>,
    tls_inspector: Option<Arc<dyn TlsInspector>>,
    collector_factory: TimingCollectorFactory,
}

impl Analyzer {
    /// Analyzer backed by a `DefaultRequestExecutor` using the configured phase split.
    pub fn new(config: AnalyzerConfig) -> Self {
        let executor =
            DefaultRequestExecutor::new().with_phase_split(PhaseSplit::new(config.connect_share));
        Self {
            config,
            strategy: ExecutorStrategy::from_executor(Arc::new(executor)),
            dns_resolver: None,
            tls_inspector: None,
            collector_factory: Arc::new(|| Box::new(MonotonicTimingCollector::new())),
        }
    }

    pub fn with_strategy(mut self, strategy: ExecutorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolver passed to every attempt.
    pub fn with_dns_resolver(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.dns_resolver = Some(resolver);
        self
    }

    /// Inspector passed to every attempt.
    pub fn with_tls_inspector(mut self, inspector: Arc<dyn TlsInspector>) -> Self {
        self.tls_inspector = Some(inspector);
        self
    }

    /// Factory called once per step for a fresh collector.
    pub fn with_collector_factory(mut self, factory: TimingCollectorFactory) -> Self {
        self.collector_factory = factory;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes `url`, following redirects when enabled.
    ///
    /// Never fails: a failed attempt is recorded on its step and ends the chain.
    /// At most `max_redirects + 1` steps are returned.
    pub async fn analyze_url(&self, url: &str, request: &AnalysisRequest) -> Vec<StepMetrics> {
        let mut steps: Vec<StepMetrics> = Vec::new();
        let mut current = url.to_string();
        let mut redirect_count = 0;

        loop {
            let step = self.run_step(&current, steps.len() + 1, request).await;
            log_step(&step);

            let next = if self.config.follow_redirects && !step.has_error() && step.is_redirect() {
                step.response
                    .location
                    .as_deref()
                    .and_then(|location| join_location(&current, location))
            } else {
                None
            };
            steps.push(step);

            let Some(next) = next else {
                break;
            };
            if redirect_count >= self.config.max_redirects {
                warn!(
                    "Stopped after {} redirects; {} not followed",
                    self.config.max_redirects, next
                );
                break;
            }
            redirect_count += 1;
            debug!("Following redirect {redirect_count} to {next}");
            current = next;
        }

        steps
    }

    async fn run_step(&self, url: &str, step_number: usize, request: &AnalysisRequest) -> StepMetrics {
        let mut step = StepMetrics {
            url: url.to_string(),
            step_number,
            request: RequestInfo {
                method: request.method.to_ascii_uppercase(),
                headers: sanitize_headers(request.headers.iter().map(|(k, v)| (k, v))),
                body_bytes: request.body.len(),
            },
            proxied_via: self.config.proxy.clone(),
            ..Default::default()
        };

        // A panicking strategy or collector still yields a step for this hop
        let attempt = async {
            let options = RequestOptions {
                url: url.to_string(),
                timeout: self.config.timeout,
                http2: self.config.http2,
                verify_ssl: self.config.verify_ssl,
                ca_bundle: self.config.ca_bundle.clone(),
                proxy: self.config.proxy.clone(),
                method: request.method.clone(),
                body: request.body.clone(),
                headers: request.headers.clone(),
                force_new_connection: true,
                dns_resolver: self.dns_resolver.clone(),
                tls_inspector: self.tls_inspector.clone(),
                timing_collector: Some((self.collector_factory)()),
            };
            self.strategy.execute(options).await
        };

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(Ok(outcome)) => {
                step.timing = outcome.timing;
                step.network = outcome.network;
                step.response = outcome.response;
            }
            Ok(Err(e)) => {
                step.error = Some(e.to_string());
                step.note = Some(format!("Step {step_number}: Request failed"));
            }
            Err(payload) => {
                let e = HttpClientError::Unexpected(panic_message(payload.as_ref()));
                warn!("Step {step_number} {url}: {e}");
                step.error = Some(e.to_string());
                step.note = Some(format!("Step {step_number}: Unexpected error"));
            }
        }
        step
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Process exit code summarizing an analysis.
///
/// No steps maps to `EXIT_SOFTWARE`, any failed step to `EXIT_UNAVAILABLE`.
pub fn exit_code_for(steps: &[StepMetrics]) -> i32 {
    if steps.is_empty() {
        EXIT_SOFTWARE
    } else if steps.iter().any(StepMetrics::has_error) {
        EXIT_UNAVAILABLE
    } else {
        EXIT_OK
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with a non-string payload".to_string())
}

/// Absolute `location` as-is, otherwise resolved against `current`.
fn join_location(current: &str, location: &str) -> Option<String> {
    match Url::parse(location).or_else(|_| Url::parse(current).and_then(|base| base.join(location))) {
        Ok(next) => Some(next.to_string()),
        Err(e) => {
            warn!("Cannot follow Location {location:?} from {current}: {e}");
            None
        }
    }
}

fn log_step(step: &StepMetrics) {
    match (&step.error, step.response.status) {
        (Some(error), _) => info!("Step {} {}: {}", step.step_number, step.url, error),
        (None, Some(status)) => info!(
            "Step {} {}: {} in {:.1}ms",
            step.step_number, step.url, status, step.timing.total_ms
        ),
        (None, None) => info!("Step {} {}: no response", step.step_number, step.url),
    }
}

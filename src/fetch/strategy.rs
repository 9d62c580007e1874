//! Adapter strategies: drive either a `RequestExecutor` or a plain async function.
//!
//! The strategy is chosen once, at construction.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use super::{DefaultRequestExecutor, RequestExecutor, RequestOptions, RequestOutcome};
use crate::error_handling::HttpClientError;

/// Boxed future returned by a request function.
pub type RequestFuture = Pin<Box<dyn Future<Output = Result<RequestOutcome, HttpClientError>> + Send>>;

/// A request function, as accepted by `ExecutorStrategy::from_fn`.
pub type RequestFn = Arc<dyn Fn(RequestOptions) -> RequestFuture + Send + Sync>;

/// Wraps a request function that may not understand the verify flag.
pub struct FunctionExecutor {
    func: RequestFn,
    accepts_verify: bool,
    warned: AtomicBool,
}

impl FunctionExecutor {
    pub fn new(func: RequestFn, accepts_verify: bool) -> Self {
        Self {
            func,
            accepts_verify,
            warned: AtomicBool::new(false),
        }
    }

    pub fn accepts_verify(&self) -> bool {
        self.accepts_verify
    }

    async fn call(&self, mut options: RequestOptions) -> Result<RequestOutcome, HttpClientError> {
        if !self.accepts_verify {
            if !self.warned.swap(true, Ordering::Relaxed) {
                warn!(
                    "Request function does not accept the verify flag; certificate \
                     verification stays at its default. Support for such functions is deprecated."
                );
            }
            options.verify_ssl = true;
        }
        (self.func)(options).await
    }
}

/// How the analyzer performs each request.
pub enum ExecutorStrategy {
    Executor(Arc<dyn RequestExecutor>),
    Function(FunctionExecutor),
}

impl ExecutorStrategy {
    pub fn from_executor(executor: Arc<dyn RequestExecutor>) -> Self {
        Self::Executor(executor)
    }

    /// Wraps an async function. When `accepts_verify` is false the function
    /// always sees `verify_ssl = true` and a deprecation warning is logged once.
    pub fn from_fn<F, Fut>(func: F, accepts_verify: bool) -> Self
    where
        F: Fn(RequestOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestOutcome, HttpClientError>> + Send + 'static,
    {
        let boxed: RequestFn =
            Arc::new(move |options: RequestOptions| -> RequestFuture { Box::pin(func(options)) });
        Self::Function(FunctionExecutor::new(boxed, accepts_verify))
    }

    /// # Errors
    ///
    /// Propagates the wrapped executor's or function's error.
    pub async fn execute(&self, options: RequestOptions) -> Result<RequestOutcome, HttpClientError> {
        match self {
            Self::Executor(executor) => executor.execute(options).await,
            Self::Function(function) => function.call(options).await,
        }
    }
}

impl Default for ExecutorStrategy {
    fn default() -> Self {
        Self::Executor(Arc::new(DefaultRequestExecutor::new()))
    }
}

impl std::fmt::Debug for ExecutorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Executor(_) => f.write_str("ExecutorStrategy::Executor"),
            Self::Function(function) => f
                .debug_struct("ExecutorStrategy::Function")
                .field("accepts_verify", &function.accepts_verify)
                .finish_non_exhaustive(),
        }
    }
}

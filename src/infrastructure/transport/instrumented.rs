//! Request instrumentation decorator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::domain::errors::TransportError;
use crate::domain::models::{ApiRequest, ApiResponse, RequestKey, RequestMetrics, RequestOutcome};
use crate::domain::ports::Transport;

/// Reduce a request path to its final segment.
///
/// Query strings and fragments are dropped, so `/api/v1/namespaces/a/pods?limit=5`
/// becomes `pods`. The root path and empty paths map to `/`.
pub fn last_path_segment(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return "/";
    }
    path.rsplit('/').next().unwrap_or(path)
}

/// Wraps a transport and records every request it carries.
///
/// Requests are labelled by method, last path segment and outcome. Responses
/// and errors are passed through untouched.
pub struct InstrumentedTransport<T> {
    inner: T,
    metrics: Arc<RequestMetrics>,
}

impl<T: Transport> InstrumentedTransport<T> {
    /// Record every request sent through `inner` into `metrics`.
    pub fn new(inner: T, metrics: Arc<RequestMetrics>) -> Self {
        Self { inner, metrics }
    }

    /// Counters this decorator feeds.
    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl<T: Transport> Transport for InstrumentedTransport<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = request.method;
        let endpoint = last_path_segment(&request.path).to_string();
        let started = Instant::now();

        let result = self.inner.send(request).await;
        let latency = started.elapsed();

        let outcome = match &result {
            Ok(response) => RequestOutcome::Status(response.status),
            Err(_) => RequestOutcome::Error,
        };
        debug!(
            method = %method,
            endpoint = %endpoint,
            outcome = %outcome,
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "api request"
        );
        self.metrics.record(
            RequestKey {
                method,
                endpoint,
                outcome,
            },
            latency,
        );

        result
    }
}

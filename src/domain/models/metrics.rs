use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::request::Method;

/// Result class of one request, as recorded by instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The server answered with this HTTP status.
    Status(u16),
    /// The request never produced a response.
    Error,
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "{code}"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Bounded-cardinality label set for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestKey {
    /// HTTP verb.
    pub method: Method,
    /// Last path segment of the request path.
    pub endpoint: String,
    /// Status code or transport error.
    pub outcome: RequestOutcome,
}

/// Aggregated counters for one [`RequestKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    /// Requests seen.
    pub count: u64,
    /// Summed wall-clock time of those requests.
    pub total_latency: Duration,
}

/// In-process request counters fed by the instrumentation decorator.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    entries: Mutex<HashMap<RequestKey, RequestStats>>,
}

impl RequestMetrics {
    /// Empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request under `key`.
    pub fn record(&self, key: RequestKey, latency: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let stats = entries.entry(key).or_default();
        stats.count += 1;
        stats.total_latency += latency;
    }

    /// Number of requests recorded for `endpoint`, across methods and outcomes.
    pub fn count_for(&self, endpoint: &str) -> u64 {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter(|(key, _)| key.endpoint == endpoint)
            .map(|(_, stats)| stats.count)
            .sum()
    }

    /// Requests recorded under any key.
    pub fn total(&self) -> u64 {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().map(|stats| stats.count).sum()
    }

    /// Copy of all counters, sorted by endpoint then method.
    pub fn snapshot(&self) -> Vec<(RequestKey, RequestStats)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot: Vec<_> = entries
            .iter()
            .map(|(key, stats)| (key.clone(), *stats))
            .collect();
        snapshot.sort_by(|(a, _), (b, _)| {
            a.endpoint
                .cmp(&b.endpoint)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
                .then_with(|| a.outcome.to_string().cmp(&b.outcome.to_string()))
        });
        snapshot
    }
}

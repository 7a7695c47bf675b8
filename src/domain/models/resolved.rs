use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::connection::CredentialSource;
use super::credentials::{ClusterEndpoint, Credentials};
use super::metrics::RequestMetrics;
use crate::domain::ports::Transport;

/// Output of credential resolution for the primary backend.
///
/// Carries the instrumented transport every primary-cluster request goes
/// through. Never mutated after construction.
#[derive(Clone)]
pub struct ResolvedConfig {
    source: CredentialSource,
    endpoint: ClusterEndpoint,
    credentials: Credentials,
    timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
    metrics: Arc<RequestMetrics>,
}

impl ResolvedConfig {
    /// Assemble a resolved config. Used by the resolver and by tests that
    /// inject their own transport.
    pub fn new(
        source: CredentialSource,
        endpoint: ClusterEndpoint,
        credentials: Credentials,
        timeout: Option<Duration>,
        transport: Arc<dyn Transport>,
        metrics: Arc<RequestMetrics>,
    ) -> Self {
        Self {
            source,
            endpoint,
            credentials,
            timeout,
            transport,
            metrics,
        }
    }

    /// Which credential source won resolution.
    pub const fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Server address, TLS settings and default namespace.
    pub const fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    /// Base URL of the API server.
    pub fn server(&self) -> &str {
        &self.endpoint.server
    }

    /// Authentication material the transport was built with.
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Effective per-request timeout; `None` means no deadline is enforced.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Instrumented transport for the primary cluster.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Counters fed by the instrumented transport.
    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("source", &self.source)
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

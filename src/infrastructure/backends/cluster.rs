//! Client for the primary cluster's core API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::errors::{ClientConstructionError, TransportError};
use crate::domain::models::{ApiRequest, ApiResponse, RequestMetrics, ResolvedConfig};
use crate::domain::ports::Transport;

/// Answer of `GET /version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersion {
    /// Major version, e.g. `1`.
    #[serde(default)]
    pub major: String,
    /// Minor version, e.g. `31`.
    #[serde(default)]
    pub minor: String,
    /// Full release tag, e.g. `v1.31.2`.
    pub git_version: String,
    /// `os/arch` of the server build.
    #[serde(default)]
    pub platform: String,
}

/// Core API client sharing the resolver's instrumented transport.
#[derive(Clone)]
pub struct ClusterClient {
    transport: Arc<dyn Transport>,
    server: String,
    namespace: String,
    metrics: Option<Arc<RequestMetrics>>,
}

impl ClusterClient {
    /// Client over an arbitrary transport. No metrics are exposed.
    pub fn new(
        transport: Arc<dyn Transport>,
        server: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            server: server.into(),
            namespace: namespace.into(),
            metrics: None,
        }
    }

    /// Build a client on top of a resolved configuration. Requests go
    /// through the resolved (instrumented) transport.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Self {
        Self {
            transport: resolved.transport(),
            server: resolved.server().to_string(),
            namespace: resolved.endpoint().namespace.clone(),
            metrics: Some(resolved.metrics()),
        }
    }

    /// Base URL of the API server.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Namespace selected by the credential source.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Request counters, when the transport is instrumented.
    pub fn metrics(&self) -> Option<&Arc<RequestMetrics>> {
        self.metrics.as_ref()
    }

    /// Send a request and fail on non-2xx statuses.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = request.path.clone();
        self.transport.send(request).await?.error_for_status(&path)
    }

    /// `GET path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.request(ApiRequest::get(path)).await?.json(path)
    }

    /// `GET /version`.
    pub async fn version(&self) -> Result<ServerVersion, TransportError> {
        self.get_json("/version").await
    }

    /// `GET path` as untyped JSON.
    pub async fn get(&self, path: &str) -> Result<serde_json::Value, TransportError> {
        self.get_json(path).await
    }

    /// List a core `v1` resource, cluster-wide when `namespace` is `None`.
    pub async fn list(
        &self,
        namespace: Option<&str>,
        resource: &str,
    ) -> Result<serde_json::Value, TransportError> {
        let path = match namespace {
            Some(namespace) => format!("/api/v1/namespaces/{namespace}/{resource}"),
            None => format!("/api/v1/{resource}"),
        };
        self.get_json(&path).await
    }
}

impl fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterClient")
            .field("server", &self.server)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Builds the primary client from the resolver output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClusterFactory;

impl super::ClusterClientFactory for DefaultClusterFactory {
    fn create(&self, resolved: &ResolvedConfig) -> Result<ClusterClient, ClientConstructionError> {
        Ok(ClusterClient::from_resolved(resolved))
    }
}

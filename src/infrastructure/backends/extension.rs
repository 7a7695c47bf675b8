//! Clients for API-group extensions layered on the cluster API.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::{ClientConstructionError, ClientError, TransportError};
use crate::domain::models::{ApiRequest, BackendKind, ConnectionConfig};
use crate::domain::ports::Transport;
use crate::infrastructure::credentials::CredentialResolver;
use crate::infrastructure::transport::HttpTransport;

/// A group/version pair under `/apis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiGroup {
    /// API group name.
    pub group: &'static str,
    /// Served version.
    pub version: &'static str,
}

/// Istio networking resources (virtual services, destination rules, ...).
pub const SERVICE_MESH_API: ApiGroup = ApiGroup {
    group: "networking.istio.io",
    version: "v1",
};

/// Kubernetes Gateway API resources (gateways, HTTP routes, ...).
pub const GATEWAY_API: ApiGroup = ApiGroup {
    group: "gateway.networking.k8s.io",
    version: "v1",
};

impl ApiGroup {
    /// `/apis/<group>/<version>`.
    pub fn base_path(&self) -> String {
        format!("/apis/{}/{}", self.group, self.version)
    }

    /// API group served by an extension backend; `None` for the core cluster.
    pub fn for_backend(backend: BackendKind) -> Option<Self> {
        match backend {
            BackendKind::Cluster => None,
            BackendKind::ServiceMesh => Some(SERVICE_MESH_API),
            BackendKind::Gateway => Some(GATEWAY_API),
        }
    }
}

impl fmt::Display for ApiGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.version)
    }
}

/// Resources served by an API group, as returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    /// `<group>/<version>` echoed by the server.
    pub group_version: String,
    /// Resource types in the group.
    #[serde(default)]
    pub resources: Vec<ApiResource>,
}

/// One resource type from discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiResource {
    /// Plural resource name used in paths.
    pub name: String,
    /// Whether instances live in a namespace.
    #[serde(default)]
    pub namespaced: bool,
    /// Object kind.
    #[serde(default)]
    pub kind: String,
}

/// Client scoped to one extension API group.
#[derive(Clone)]
pub struct ExtensionClient {
    backend: BackendKind,
    api: ApiGroup,
    transport: Arc<dyn Transport>,
    namespace: String,
}

impl ExtensionClient {
    /// Client for `api` over `transport`, defaulting to `namespace`.
    pub fn new(
        backend: BackendKind,
        api: ApiGroup,
        transport: Arc<dyn Transport>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            api,
            transport,
            namespace: namespace.into(),
        }
    }

    /// Slot this client serves.
    pub const fn backend(&self) -> BackendKind {
        self.backend
    }

    /// API group requests are scoped to.
    pub const fn api(&self) -> ApiGroup {
        self.api
    }

    /// Namespace selected by the credential source.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, TransportError> {
        self.transport
            .send(ApiRequest::get(path))
            .await?
            .error_for_status(path)?
            .json(path)
    }

    /// `GET /apis/<group>/<version>`.
    pub async fn discover(&self) -> Result<ApiResourceList, TransportError> {
        self.get_json(&self.api.base_path()).await
    }

    /// List `resource` in `namespace`, or in every namespace when `None`.
    pub async fn list(
        &self,
        namespace: Option<&str>,
        resource: &str,
    ) -> Result<serde_json::Value, TransportError> {
        let base = self.api.base_path();
        let path = match namespace {
            Some(namespace) => format!("{base}/namespaces/{namespace}/{resource}"),
            None => format!("{base}/{resource}"),
        };
        self.get_json(&path).await
    }

    /// Fetch one named object.
    pub async fn get(
        &self,
        namespace: &str,
        resource: &str,
        name: &str,
    ) -> Result<serde_json::Value, TransportError> {
        let path = format!(
            "{}/namespaces/{namespace}/{resource}/{name}",
            self.api.base_path()
        );
        self.get_json(&path).await
    }
}

impl fmt::Debug for ExtensionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionClient")
            .field("backend", &self.backend)
            .field("api", &self.api)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Builds an [`ExtensionClient`] straight from the connection config.
///
/// Credentials are loaded independently of the primary backend and the
/// transport is not instrumented.
#[derive(Debug, Clone)]
pub struct ApiGroupFactory {
    backend: BackendKind,
    api: ApiGroup,
    resolver: CredentialResolver,
}

impl ApiGroupFactory {
    /// Factory for `api`, loading credentials with `resolver`.
    pub const fn new(backend: BackendKind, api: ApiGroup, resolver: CredentialResolver) -> Self {
        Self {
            backend,
            api,
            resolver,
        }
    }

    /// Factory for [`SERVICE_MESH_API`].
    pub fn service_mesh(resolver: CredentialResolver) -> Self {
        Self::new(BackendKind::ServiceMesh, SERVICE_MESH_API, resolver)
    }

    /// Factory for [`GATEWAY_API`].
    pub fn gateway(resolver: CredentialResolver) -> Self {
        Self::new(BackendKind::Gateway, GATEWAY_API, resolver)
    }
}

impl super::ExtensionClientFactory for ApiGroupFactory {
    fn create(&self, config: &ConnectionConfig) -> Result<ExtensionClient, ClientError> {
        let loaded = self
            .resolver
            .load(config)
            .map_err(|source| ClientError::Config {
                backend: self.backend,
                source: Arc::new(source),
            })?;

        let transport =
            HttpTransport::new(&loaded.endpoint, &loaded.credentials, config.request_timeout())
                .map_err(|e| {
                    ClientConstructionError::new(self.backend, &loaded.source, e.to_string())
                })?;

        debug!(
            backend = %self.backend,
            api = %self.api,
            server = transport.base_url(),
            "extension client constructed"
        );

        Ok(ExtensionClient::new(
            self.backend,
            self.api,
            Arc::new(transport),
            loaded.endpoint.namespace,
        ))
    }
}

//! Backend clients and the factories that construct them.
//!
//! - `cluster`: primary core-API client, built from the resolver output
//! - `extension`: API-group scoped clients for the service mesh and gateway
//!
//! Factories are traits so the registry can be driven by test doubles.
//! Plain closures implement both factory traits.

pub mod cluster;
pub mod extension;

pub use cluster::{ClusterClient, DefaultClusterFactory, ServerVersion};
pub use extension::{
    ApiGroup, ApiGroupFactory, ApiResource, ApiResourceList, ExtensionClient, GATEWAY_API,
    SERVICE_MESH_API,
};

use std::fmt;
use std::sync::Arc;

use crate::domain::errors::{ClientConstructionError, ClientError, TransportError};
use crate::domain::models::{BackendKind, ConnectionConfig, ResolvedConfig};
use crate::infrastructure::credentials::CredentialResolver;

/// Constructs the primary cluster client from resolved credentials.
pub trait ClusterClientFactory: Send + Sync {
    /// Build the client. Called at most once per registry.
    fn create(&self, resolved: &ResolvedConfig) -> Result<ClusterClient, ClientConstructionError>;
}

impl<F> ClusterClientFactory for F
where
    F: Fn(&ResolvedConfig) -> Result<ClusterClient, ClientConstructionError> + Send + Sync,
{
    fn create(&self, resolved: &ResolvedConfig) -> Result<ClusterClient, ClientConstructionError> {
        self(resolved)
    }
}

/// Constructs an extension client from the shared connection config.
///
/// Extension factories load credentials themselves, so they report either
/// [`ClientError::Config`] for an unusable credential source or
/// [`ClientError::Construction`] once the source was valid.
pub trait ExtensionClientFactory: Send + Sync {
    /// Build the client. Called at most once per registry.
    fn create(&self, config: &ConnectionConfig) -> Result<ExtensionClient, ClientError>;
}

impl<F, E> ExtensionClientFactory for F
where
    F: Fn(&ConnectionConfig) -> Result<ExtensionClient, E> + Send + Sync,
    E: Into<ClientError>,
{
    fn create(&self, config: &ConnectionConfig) -> Result<ExtensionClient, ClientError> {
        self(config).map_err(Into::into)
    }
}

/// One factory per registry slot.
#[derive(Clone)]
pub struct ClientFactories {
    /// Primary cluster slot.
    pub cluster: Arc<dyn ClusterClientFactory>,
    /// Service-mesh slot.
    pub service_mesh: Arc<dyn ExtensionClientFactory>,
    /// Gateway slot.
    pub gateway: Arc<dyn ExtensionClientFactory>,
}

impl ClientFactories {
    /// Built-in factories; extension backends load credentials through
    /// `resolver`.
    pub fn with_resolver(resolver: &CredentialResolver) -> Self {
        Self {
            cluster: Arc::new(DefaultClusterFactory),
            service_mesh: Arc::new(ApiGroupFactory::service_mesh(resolver.clone())),
            gateway: Arc::new(ApiGroupFactory::gateway(resolver.clone())),
        }
    }

    /// Replace the cluster factory.
    #[must_use]
    pub fn with_cluster(mut self, factory: impl ClusterClientFactory + 'static) -> Self {
        self.cluster = Arc::new(factory);
        self
    }

    /// Replace the service-mesh factory.
    #[must_use]
    pub fn with_service_mesh(mut self, factory: impl ExtensionClientFactory + 'static) -> Self {
        self.service_mesh = Arc::new(factory);
        self
    }

    /// Replace the gateway factory.
    #[must_use]
    pub fn with_gateway(mut self, factory: impl ExtensionClientFactory + 'static) -> Self {
        self.gateway = Arc::new(factory);
        self
    }
}

impl Default for ClientFactories {
    fn default() -> Self {
        Self::with_resolver(&CredentialResolver::default())
    }
}

impl fmt::Debug for ClientFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactories").finish_non_exhaustive()
    }
}

/// Client handle returned by the registry's polymorphic accessor.
#[derive(Debug, Clone)]
pub enum BackendClient {
    /// Core API client.
    Cluster(Arc<ClusterClient>),
    /// Service-mesh API client.
    ServiceMesh(Arc<ExtensionClient>),
    /// Gateway API client.
    Gateway(Arc<ExtensionClient>),
}

impl BackendClient {
    /// Slot the client came from.
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Cluster(_) => BackendKind::Cluster,
            Self::ServiceMesh(_) => BackendKind::ServiceMesh,
            Self::Gateway(_) => BackendKind::Gateway,
        }
    }

    /// Issue the backend's discovery request and summarise the answer.
    pub async fn discover(&self) -> Result<String, TransportError> {
        match self {
            Self::Cluster(client) => {
                let version = client.version().await?;
                Ok(format!("server version {}", version.git_version))
            }
            Self::ServiceMesh(client) | Self::Gateway(client) => {
                let resources = client.discover().await?;
                Ok(format!(
                    "{} serves {} resources",
                    resources.group_version,
                    resources.resources.len()
                ))
            }
        }
    }
}

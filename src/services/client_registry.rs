//! Lazy, thread-safe registry of backend clients.
//!
//! Each backend has one slot. The first caller for a slot runs its factory;
//! callers arriving while construction is in flight block until it
//! finishes, and every later caller gets the cached outcome. A failed
//! construction is cached too, so a registry never retries. Build a new
//! registry to recover.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::errors::{ClientError, ConfigError};
use crate::domain::models::{BackendKind, ConnectionConfig, ResolvedConfig};
use crate::infrastructure::backends::{
    BackendClient, ClientFactories, ClusterClient, ExtensionClient,
};
use crate::infrastructure::credentials::CredentialResolver;

type Slot<T> = OnceLock<Result<Arc<T>, ClientError>>;

/// Owns the shared connection config and one lazily built client per backend.
///
/// Share it across threads behind an `Arc`. Nothing is constructed until an
/// accessor is first called.
pub struct ClientRegistry {
    config: ConnectionConfig,
    resolver: CredentialResolver,
    factories: ClientFactories,
    resolved: OnceLock<Result<Arc<ResolvedConfig>, Arc<ConfigError>>>,
    cluster: Slot<ClusterClient>,
    service_mesh: Slot<ExtensionClient>,
    gateway: Slot<ExtensionClient>,
}

impl ClientRegistry {
    /// Registry with the default resolver and built-in factories.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start a registry with a custom resolver or factories.
    pub fn builder(config: ConnectionConfig) -> ClientRegistryBuilder {
        ClientRegistryBuilder {
            config,
            resolver: None,
            factories: None,
        }
    }

    /// Inputs every slot is built from.
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Resolve credentials for the primary backend, once per registry.
    pub fn resolved_config(&self) -> Result<Arc<ResolvedConfig>, Arc<ConfigError>> {
        self.resolved
            .get_or_init(|| {
                self.resolver
                    .resolve(&self.config)
                    .map(Arc::new)
                    .map_err(|error| {
                        warn!(
                            attempted = %error.attempted(),
                            error = %error,
                            "credential resolution failed"
                        );
                        Arc::new(error)
                    })
            })
            .clone()
    }

    /// Primary cluster client, built from the resolved config.
    pub fn cluster(&self) -> Result<Arc<ClusterClient>, ClientError> {
        init_slot(&self.cluster, BackendKind::Cluster, || {
            let resolved = self
                .resolved_config()
                .map_err(|source| ClientError::Config {
                    backend: BackendKind::Cluster,
                    source,
                })?;
            Ok(self.factories.cluster.create(&resolved)?)
        })
    }

    /// Service-mesh client, built from the connection config.
    pub fn service_mesh(&self) -> Result<Arc<ExtensionClient>, ClientError> {
        init_slot(&self.service_mesh, BackendKind::ServiceMesh, || {
            Ok(self.factories.service_mesh.create(&self.config)?)
        })
    }

    /// Gateway client, built from the connection config.
    pub fn gateway(&self) -> Result<Arc<ExtensionClient>, ClientError> {
        init_slot(&self.gateway, BackendKind::Gateway, || {
            Ok(self.factories.gateway.create(&self.config)?)
        })
    }

    /// Accessor for `kind`, with the same once-only semantics as the typed ones.
    pub fn get_client(&self, kind: BackendKind) -> Result<BackendClient, ClientError> {
        match kind {
            BackendKind::Cluster => self.cluster().map(BackendClient::Cluster),
            BackendKind::ServiceMesh => self.service_mesh().map(BackendClient::ServiceMesh),
            BackendKind::Gateway => self.gateway().map(BackendClient::Gateway),
        }
    }

    /// Whether the slot for `kind` holds an outcome, successful or not.
    pub fn is_initialized(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Cluster => self.cluster.get().is_some(),
            BackendKind::ServiceMesh => self.service_mesh.get().is_some(),
            BackendKind::Gateway => self.gateway.get().is_some(),
        }
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("config", &self.config)
            .field("cluster", &self.cluster.get().map(Result::is_ok))
            .field("service_mesh", &self.service_mesh.get().map(Result::is_ok))
            .field("gateway", &self.gateway.get().map(Result::is_ok))
            .finish_non_exhaustive()
    }
}

fn init_slot<T>(
    slot: &Slot<T>,
    backend: BackendKind,
    construct: impl FnOnce() -> Result<T, ClientError>,
) -> Result<Arc<T>, ClientError> {
    slot.get_or_init(|| {
        debug!(backend = %backend, "constructing client");
        let started = Instant::now();
        match construct() {
            Ok(client) => {
                info!(
                    backend = %backend,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "client constructed"
                );
                Ok(Arc::new(client))
            }
            Err(error) => {
                warn!(backend = %backend, error = %error, "client construction failed");
                Err(error)
            }
        }
    })
    .clone()
}

/// Builder for [`ClientRegistry`] with injectable resolver and factories.
#[derive(Debug)]
pub struct ClientRegistryBuilder {
    config: ConnectionConfig,
    resolver: Option<CredentialResolver>,
    factories: Option<ClientFactories>,
}

impl ClientRegistryBuilder {
    /// Resolver for the primary backend and the built-in extension factories.
    #[must_use]
    pub fn with_resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the built-in factories.
    #[must_use]
    pub fn with_factories(mut self, factories: ClientFactories) -> Self {
        self.factories = Some(factories);
        self
    }

    /// Empty registry; nothing is constructed yet.
    pub fn build(self) -> ClientRegistry {
        let resolver = self.resolver.unwrap_or_default();
        let factories = self
            .factories
            .unwrap_or_else(|| ClientFactories::with_resolver(&resolver));

        ClientRegistry {
            config: self.config,
            resolver,
            factories,
            resolved: OnceLock::new(),
            cluster: OnceLock::new(),
            service_mesh: OnceLock::new(),
            gateway: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ClientConstructionError, TransportError};
    use crate::domain::models::{ApiRequest, ApiResponse};
    use crate::domain::ports::Transport;
    use crate::infrastructure::backends::{GATEWAY_API, SERVICE_MESH_API};
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Barrier, Mutex};
    use std::thread;
    use std::time::Duration;

    struct NoopTransport;

    #[async_trait]
    impl Transport for NoopTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse::new(200, "{}"))
        }
    }

    fn mesh_client() -> ExtensionClient {
        ExtensionClient::new(
            BackendKind::ServiceMesh,
            SERVICE_MESH_API,
            Arc::new(NoopTransport),
            "default",
        )
    }

    fn gateway_client() -> ExtensionClient {
        ExtensionClient::new(
            BackendKind::Gateway,
            GATEWAY_API,
            Arc::new(NoopTransport),
            "default",
        )
    }

    fn kubeconfig_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r"
current-context: test
clusters:
- name: test
  cluster:
    server: https://127.0.0.1:6443
users:
- name: test
  user:
    token: test-token
contexts:
- name: test
  context:
    cluster: test
    user: test
"
        )
        .unwrap();
        file
    }

    fn resolver() -> CredentialResolver {
        CredentialResolver::new().without_default_kubeconfig()
    }

    #[test]
    fn test_nothing_is_constructed_eagerly() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factories = ClientFactories::with_resolver(&resolver()).with_service_mesh(
            move |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(mesh_client())
            },
        );

        let registry = ClientRegistry::builder(ConnectionConfig::new())
            .with_resolver(resolver())
            .with_factories(factories)
            .build();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        for kind in BackendKind::ALL {
            assert!(!registry.is_initialized(kind));
        }

        registry.service_mesh().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_initialized(BackendKind::ServiceMesh));
        assert!(!registry.is_initialized(BackendKind::Gateway));
    }

    #[test]
    fn test_concurrent_callers_share_one_construction() {
        const THREADS: usize = 16;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factories = ClientFactories::with_resolver(&resolver()).with_service_mesh(
            move |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(50));
                Ok(mesh_client())
            },
        );
        let registry = Arc::new(
            ClientRegistry::builder(ConnectionConfig::new())
                .with_resolver(resolver())
                .with_factories(factories)
                .build(),
        );
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.service_mesh().unwrap()
                })
            })
            .collect();
        let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
        assert!(Arc::ptr_eq(&registry.service_mesh().unwrap(), &clients[0]));
    }

    #[test]
    fn test_failure_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factories = ClientFactories::with_resolver(&resolver()).with_gateway(
            move |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientConstructionError::new(
                    BackendKind::Gateway,
                    "kubeconfig /tmp/cfg",
                    "gateway API not installed",
                ))
            },
        );
        let registry = ClientRegistry::builder(ConnectionConfig::new())
            .with_resolver(resolver())
            .with_factories(factories)
            .build();

        let first = registry.gateway().unwrap_err();
        let second = registry.gateway().unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_initialized(BackendKind::Gateway));
        match (first, second) {
            (ClientError::Construction(a), ClientError::Construction(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert_eq!(a.reason, "gateway API not installed");
            }
            other => panic!("Expected cached construction errors, got {other:?}"),
        }
    }

    #[test]
    fn test_blocked_slot_does_not_block_others() {
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let entered_tx = Mutex::new(entered_tx);
        let release_rx = Mutex::new(release_rx);

        let factories = ClientFactories::with_resolver(&resolver())
            .with_gateway(
                move |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                    entered_tx.lock().unwrap().send(()).unwrap();
                    release_rx.lock().unwrap().recv().unwrap();
                    Ok(gateway_client())
                },
            )
            .with_service_mesh(
                |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                    Ok(mesh_client())
                },
            );
        let registry = Arc::new(
            ClientRegistry::builder(ConnectionConfig::new())
                .with_resolver(resolver())
                .with_factories(factories)
                .build(),
        );

        let blocked = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.gateway().map(|_| ()))
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let started = Instant::now();
        registry.service_mesh().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!registry.is_initialized(BackendKind::Gateway));

        release_tx.send(()).unwrap();
        blocked.join().unwrap().unwrap();
        assert!(registry.is_initialized(BackendKind::Gateway));
    }

    #[test]
    fn test_cluster_uses_resolved_config() {
        let file = kubeconfig_file();
        let config = ConnectionConfig::new()
            .with_credential_source(file.path())
            .with_timeout(Duration::from_secs(30));
        let registry = ClientRegistry::builder(config)
            .with_resolver(resolver())
            .build();

        let client = registry.cluster().unwrap();
        assert_eq!(client.server(), "https://127.0.0.1:6443");
        assert_eq!(client.namespace(), "default");
        assert!(client.metrics().is_some());

        let resolved = registry.resolved_config().unwrap();
        assert_eq!(resolved.timeout(), Some(Duration::from_secs(30)));
        assert!(Arc::ptr_eq(&resolved, &registry.resolved_config().unwrap()));
    }

    #[test]
    fn test_resolution_failure_is_config_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factories = ClientFactories::with_resolver(&resolver()).with_cluster(
            move |resolved: &ResolvedConfig| -> Result<ClusterClient, ClientConstructionError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(ClusterClient::from_resolved(resolved))
            },
        );
        let registry = ClientRegistry::builder(
            ConnectionConfig::new().with_credential_source("/nonexistent/kubeconfig"),
        )
        .with_resolver(resolver())
        .with_factories(factories)
        .build();

        let err = registry.get_client(BackendKind::Cluster).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.backend(), BackendKind::Cluster);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.cluster().unwrap_err().is_config());
    }

    #[test]
    fn test_every_slot_reports_bad_kubeconfig_as_config_error() {
        let registry = ClientRegistry::builder(
            ConnectionConfig::new().with_credential_source("/nonexistent/kubeconfig"),
        )
        .with_resolver(resolver())
        .build();

        for kind in BackendKind::ALL {
            let err = registry.get_client(kind).unwrap_err();
            assert!(err.is_config(), "{kind} slot returned {err:?}");
            assert_eq!(err.backend(), kind);
            // Cached like any other failure.
            assert!(registry.get_client(kind).unwrap_err().is_config());
        }
    }
}

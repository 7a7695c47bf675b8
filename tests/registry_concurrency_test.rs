//! Concurrency tests for the lazy client registry
//!
//! Many threads and tasks hit the same slot at once; the factory must run
//! exactly once and every caller must observe the same outcome.

mod common;

use async_trait::async_trait;
use clientgen::domain::models::{ApiRequest, ApiResponse};
use clientgen::infrastructure::backends::{GATEWAY_API, SERVICE_MESH_API};
use clientgen::{
    BackendClient, BackendKind, ClientConstructionError, ClientError, ClientFactories,
    ClientRegistry, ClusterClient, ConnectionConfig, CredentialResolver, ExtensionClient,
    ResolvedConfig, Transport, TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 32;

struct DiscoveryStub;

#[async_trait]
impl Transport for DiscoveryStub {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse::new(
            200,
            format!(
                r#"{{"groupVersion":"{}","resources":[]}}"#,
                request.path.trim_start_matches("/apis/")
            ),
        ))
    }
}

fn resolver() -> CredentialResolver {
    CredentialResolver::new().without_default_kubeconfig()
}

fn counting_cluster_factory(
    calls: &Arc<AtomicUsize>,
) -> impl Fn(&ResolvedConfig) -> Result<ClusterClient, ClientConstructionError> + Send + Sync {
    let calls = Arc::clone(calls);
    move |resolved: &ResolvedConfig| {
        calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(ClusterClient::from_resolved(resolved))
    }
}

fn run_on_threads<T: Send + 'static>(
    registry: &Arc<ClientRegistry>,
    call: fn(&ClientRegistry) -> T,
) -> Vec<T> {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                call(&registry)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect()
}

#[test]
fn test_cluster_slot_constructed_once() {
    let (_dir, path) = common::kubeconfig("https://127.0.0.1:6443");
    let calls = Arc::new(AtomicUsize::new(0));
    let factories =
        ClientFactories::with_resolver(&resolver()).with_cluster(counting_cluster_factory(&calls));
    let registry = Arc::new(
        ClientRegistry::builder(ConnectionConfig::new().with_credential_source(&path))
            .with_resolver(resolver())
            .with_factories(factories)
            .build(),
    );

    let clients = run_on_threads(&registry, |r| r.cluster().unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    assert_eq!(clients[0].namespace(), "team-a");
}

#[test]
fn test_resolution_error_shared_by_all_callers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let factories =
        ClientFactories::with_resolver(&resolver()).with_cluster(counting_cluster_factory(&calls));
    let registry = Arc::new(
        ClientRegistry::builder(
            ConnectionConfig::new().with_credential_source("/nonexistent/clientgen/config"),
        )
        .with_resolver(resolver())
        .with_factories(factories)
        .build(),
    );

    let errors = run_on_threads(&registry, |r| r.cluster().unwrap_err());

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let sources: Vec<_> = errors
        .into_iter()
        .map(|err| match err {
            ClientError::Config { backend, source } => {
                assert_eq!(backend, BackendKind::Cluster);
                source
            }
            other => panic!("Expected Config error, got {other:?}"),
        })
        .collect();
    assert!(sources.iter().all(|s| Arc::ptr_eq(s, &sources[0])));

    // Still cached after the storm.
    assert!(registry.cluster().unwrap_err().is_config());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_extension_slots_on_threads_then_discover() {
    let mesh_calls = Arc::new(AtomicUsize::new(0));
    let gateway_calls = Arc::new(AtomicUsize::new(0));
    let (mesh_counter, gateway_counter) = (Arc::clone(&mesh_calls), Arc::clone(&gateway_calls));

    let factories = ClientFactories::with_resolver(&resolver())
        .with_service_mesh(
            move |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                mesh_counter.fetch_add(1, Ordering::SeqCst);
                Ok(ExtensionClient::new(
                    BackendKind::ServiceMesh,
                    SERVICE_MESH_API,
                    Arc::new(DiscoveryStub),
                    "default",
                ))
            },
        )
        .with_gateway(
            move |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
                gateway_counter.fetch_add(1, Ordering::SeqCst);
                Ok(ExtensionClient::new(
                    BackendKind::Gateway,
                    GATEWAY_API,
                    Arc::new(DiscoveryStub),
                    "default",
                ))
            },
        );
    let registry = Arc::new(
        ClientRegistry::builder(ConnectionConfig::new())
            .with_resolver(resolver())
            .with_factories(factories)
            .build(),
    );

    // Half the threads ask for the mesh, half for the gateway.
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let kind = if i % 2 == 0 {
                    BackendKind::ServiceMesh
                } else {
                    BackendKind::Gateway
                };
                barrier.wait();
                let client = registry.get_client(kind).unwrap();
                let summary = tokio_test::block_on(client.discover()).unwrap();
                (client, summary)
            })
        })
        .collect();
    let results: Vec<(BackendClient, String)> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(mesh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway_calls.load(Ordering::SeqCst), 1);
    for (client, summary) in &results {
        match client {
            BackendClient::ServiceMesh(c) => {
                assert!(Arc::ptr_eq(c, &registry.service_mesh().unwrap()));
                assert_eq!(summary, "networking.istio.io/v1 serves 0 resources");
            }
            BackendClient::Gateway(c) => {
                assert!(Arc::ptr_eq(c, &registry.gateway().unwrap()));
                assert_eq!(summary, "gateway.networking.k8s.io/v1 serves 0 resources");
            }
            BackendClient::Cluster(_) => panic!("cluster slot was never requested"),
        }
    }
    assert!(!registry.is_initialized(BackendKind::Cluster));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tokio_tasks_share_one_client() {
    let (_dir, path) = common::kubeconfig("https://127.0.0.1:6443");
    let calls = Arc::new(AtomicUsize::new(0));
    let factories =
        ClientFactories::with_resolver(&resolver()).with_cluster(counting_cluster_factory(&calls));
    let registry = Arc::new(
        ClientRegistry::builder(ConnectionConfig::new().with_credential_source(&path))
            .with_resolver(resolver())
            .with_factories(factories)
            .build(),
    );

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || registry.cluster().unwrap())
        })
        .collect();

    let mut clients = Vec::new();
    for task in tasks {
        clients.push(task.await.unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
}
